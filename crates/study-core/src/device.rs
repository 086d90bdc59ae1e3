use crate::model::{DeviceData, TargetDuration};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

pub type DeviceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, DeviceError>> + 'a>>;

#[derive(Debug, Error)]
pub enum DeviceError {
    /// Connect failure, timeout or non-success status.
    #[error("device unavailable: {0}")]
    NetworkUnavailable(String),
    /// Body was not JSON or lacked the expected fields.
    #[error("malformed device response: {0}")]
    MalformedResponse(String),
}

impl DeviceError {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceError::NetworkUnavailable(_) => "network_unavailable",
            DeviceError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Endpoints exposed by the study timer.
pub trait DeviceApi {
    fn fetch_data(&self) -> DeviceFuture<'_, DeviceData>;
    fn fetch_target(&self) -> DeviceFuture<'_, TargetDuration>;
    fn set_target(&self, target: TargetDuration) -> DeviceFuture<'_, ()>;
    fn log_now(&self) -> DeviceFuture<'_, String>;
    fn clear_logs(&self) -> DeviceFuture<'_, String>;
    fn upload_logs(&self, csv: Vec<u8>) -> DeviceFuture<'_, String>;
}

/// Decodes a `/target` body. Only a numeric `target_secs` is accepted.
pub fn decode_target(body: &str) -> Result<TargetDuration, DeviceError> {
    let json: Value = serde_json::from_str(body)
        .map_err(|err| DeviceError::MalformedResponse(format!("target body: {err}")))?;
    let value = json
        .get("target_secs")
        .ok_or_else(|| DeviceError::MalformedResponse("target_secs missing".to_string()))?;
    if let Some(secs) = value.as_u64() {
        return Ok(TargetDuration::from_secs(secs));
    }
    if let Some(secs) = value.as_i64() {
        return Ok(TargetDuration::from_input(secs));
    }
    match value.as_f64() {
        Some(secs) => Ok(TargetDuration::from_secs_f64(secs)),
        None => Err(DeviceError::MalformedResponse(format!(
            "target_secs is not numeric: {value}"
        ))),
    }
}

/// Decodes a `/data` body.
pub fn decode_data(body: &str) -> Result<DeviceData, DeviceError> {
    serde_json::from_str(body)
        .map_err(|err| DeviceError::MalformedResponse(format!("data body: {err}")))
}
