//! Arbitration of the daily target between the device and the local state file.
//!
//! The device copy wins only at startup; afterwards the local record is
//! authoritative and device writes are best effort.

use crate::device::{DeviceApi, DeviceError};
use crate::model::{TargetDuration, TargetSource};
use crate::state::TargetRecord;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyncPhase {
    Startup,
    Running,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reconciliation {
    AdoptDevice(TargetDuration),
    KeepLocal,
}

/// Precedence between the device's reported target and the local record.
pub fn reconcile(
    phase: SyncPhase,
    device: Result<TargetDuration, &DeviceError>,
) -> Reconciliation {
    match (phase, device) {
        (SyncPhase::Startup, Ok(target)) => Reconciliation::AdoptDevice(target),
        (SyncPhase::Startup, Err(_)) | (SyncPhase::Running, _) => Reconciliation::KeepLocal,
    }
}

#[derive(Clone)]
pub struct TargetStore {
    device: Arc<dyn DeviceApi>,
    record: TargetRecord,
    device_timeout: Duration,
}

impl TargetStore {
    pub fn new(device: Arc<dyn DeviceApi>, record: TargetRecord) -> Self {
        Self {
            device,
            record,
            device_timeout: DEFAULT_DEVICE_TIMEOUT,
        }
    }

    /// Upper bound on any single device call made by the store.
    pub fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout = timeout;
        self
    }

    pub fn device(&self) -> Arc<dyn DeviceApi> {
        Arc::clone(&self.device)
    }

    pub fn record(&self) -> &TargetRecord {
        &self.record
    }

    pub fn get_target(&self) -> TargetDuration {
        self.record.read()
    }

    /// Clamps `seconds` to a valid target and stores it.
    pub async fn set_target(&self, seconds: i64) -> anyhow::Result<TargetDuration> {
        self.store_target(TargetDuration::from_input(seconds)).await
    }

    pub async fn add_preset(&self, delta_seconds: i64) -> anyhow::Result<TargetDuration> {
        let next = self.get_target().saturating_add_input(delta_seconds);
        self.store_target(next).await
    }

    /// Pushes the target to the device, then records it locally whatever the
    /// device said. Only a local write failure is returned.
    pub async fn store_target(&self, target: TargetDuration) -> anyhow::Result<TargetDuration> {
        let pushed = self.bounded(self.device.set_target(target)).await;
        match &pushed {
            Ok(()) => debug!(target_secs = target.as_secs(), "device accepted target"),
            Err(err) => warn!(
                target_secs = target.as_secs(),
                kind = err.label(),
                error = %err,
                "device target write failed; keeping local value"
            ),
        }
        self.record.write(target, TargetSource::Local)?;
        Ok(target)
    }

    /// Startup reconciliation: adopts the device's target when it can be read.
    pub async fn sync_from_device(&self) -> anyhow::Result<Reconciliation> {
        let fetched = self.bounded(self.device.fetch_target()).await;
        let decision = reconcile(SyncPhase::Startup, fetched.as_ref().copied());
        match (&decision, &fetched) {
            (Reconciliation::AdoptDevice(target), _) => {
                self.record.write(*target, TargetSource::Device)?;
                info!(target_secs = target.as_secs(), "adopted device target");
            }
            (Reconciliation::KeepLocal, Err(err)) => {
                warn!(
                    kind = err.label(),
                    error = %err,
                    "device target unavailable; using local value"
                );
            }
            (Reconciliation::KeepLocal, Ok(_)) => {}
        }
        Ok(decision)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, DeviceError>>,
    ) -> Result<T, DeviceError> {
        match tokio::time::timeout(self.device_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DeviceError::NetworkUnavailable(format!(
                "timed out after {}s",
                self.device_timeout.as_secs_f32()
            ))),
        }
    }
}
