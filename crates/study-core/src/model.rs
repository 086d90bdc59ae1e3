use serde::{Deserialize, Serialize};
use std::fmt;

use crate::duration::{format_duration, normalize_seconds};

/// Daily study goal in whole seconds. Zero means "not set".
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetDuration(u64);

impl TargetDuration {
    pub const NOT_SET: Self = Self(0);

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Clamps user or device input to a valid duration.
    pub fn from_input(secs: i64) -> Self {
        Self(secs.max(0) as u64)
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Self(normalize_seconds(secs))
    }

    pub fn as_secs(self) -> u64 {
        self.0
    }

    pub fn is_set(self) -> bool {
        self.0 > 0
    }

    pub fn saturating_add_input(self, delta: i64) -> Self {
        let total = i64::try_from(self.0)
            .unwrap_or(i64::MAX)
            .saturating_add(delta);
        Self::from_input(total)
    }
}

impl fmt::Display for TargetDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            f.write_str(&format_duration(i64::try_from(self.0).unwrap_or(i64::MAX)))
        } else {
            f.write_str("Not set")
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSource {
    Device,
    Local,
}

impl TargetSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetSource::Device => "device",
            TargetSource::Local => "local",
        }
    }
}

impl fmt::Display for TargetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of the device's `/data` endpoint.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DeviceData {
    pub physics: String,
    pub chemistry: String,
    pub math: String,
    pub pcm_total: String,
    #[serde(default)]
    pub log: Vec<LogEntry>,
}

impl DeviceData {
    /// Log entries newest first.
    pub fn recent_log(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter().rev()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub datetime: String,
    pub physics: String,
    pub chemistry: String,
    pub math: String,
    pub pcm: String,
}
