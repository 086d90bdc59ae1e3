use crate::model::{TargetDuration, TargetSource};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

pub const TARGET_KEY: &str = "study_target_secs";
const STATE_VERSION: u32 = 1;

/// Durable client-side state, stored as JSON.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DashboardState {
    #[serde(default)]
    pub version: u32,
    #[serde(rename = "study_target_secs", default)]
    pub target: Option<TargetDuration>,
    #[serde(default)]
    pub target_source: Option<TargetSource>,
    #[serde(default)]
    pub target_updated_at: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            target: None,
            target_source: None,
            target_updated_at: None,
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = fs::read_to_string(path).context("read state")?;
        let json: serde_json::Value = serde_json::from_str(&data).context("parse state")?;
        match json.get("version").and_then(|value| value.as_u64()) {
            Some(1) => Ok(serde_json::from_value(json).context("decode state")?),
            // Bare `{"study_target_secs": N}` files predate the version field.
            None => {
                let mut state: Self = serde_json::from_value(json).context("decode state")?;
                state.version = STATE_VERSION;
                Ok(state)
            }
            Some(other) => anyhow::bail!("unsupported state version {other}"),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create state directory")?;
        }
        let data = serde_json::to_string_pretty(self).context("serialize state")?;
        fs::write(path, data).context("write state")?;
        Ok(())
    }

    pub fn record_target(
        &mut self,
        target: TargetDuration,
        source: TargetSource,
        now: OffsetDateTime,
    ) {
        self.target = Some(target);
        self.target_source = Some(source);
        self.target_updated_at = now.format(&Rfc3339).ok();
    }
}

/// The persisted target record behind a state file path.
#[derive(Clone, Debug)]
pub struct TargetRecord {
    path: PathBuf,
}

impl TargetRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<DashboardState> {
        DashboardState::load(&self.path)
    }

    /// Reads the stored target; absent or unreadable records count as not set.
    pub fn read(&self) -> TargetDuration {
        match self.load() {
            Ok(state) => state.target.unwrap_or(TargetDuration::NOT_SET),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "state unreadable; treating target as not set"
                );
                TargetDuration::NOT_SET
            }
        }
    }

    pub fn write(&self, target: TargetDuration, source: TargetSource) -> anyhow::Result<()> {
        let mut state = self.load().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "replacing unreadable state");
            DashboardState::new()
        });
        state.record_target(target, source, OffsetDateTime::now_utc());
        state.save(&self.path)
    }
}
