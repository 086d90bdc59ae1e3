use reqwest::{RequestBuilder, Response, StatusCode};
use study_core::device::DeviceError;
use tracing::debug;

/// Sends once; the caller's poll cadence is the retry policy.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response, DeviceError> {
    let response = request.send().await.map_err(network_error)?;
    let status = response.status();
    debug!(url = %response.url(), status = status.as_u16(), "device responded");
    if let Err(err) = check_status(status) {
        let _ = response.bytes().await;
        return Err(err);
    }
    Ok(response)
}

pub(crate) async fn read_text(response: Response) -> Result<String, DeviceError> {
    response.text().await.map_err(|err| {
        if err.is_decode() {
            DeviceError::MalformedResponse(format!("decode body: {err}"))
        } else {
            network_error(err)
        }
    })
}

fn check_status(status: StatusCode) -> Result<(), DeviceError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(DeviceError::NetworkUnavailable(format!(
            "device returned {status}"
        )))
    }
}

pub(crate) fn network_error(err: reqwest::Error) -> DeviceError {
    let reason = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    DeviceError::NetworkUnavailable(format!("{reason}: {err}"))
}
