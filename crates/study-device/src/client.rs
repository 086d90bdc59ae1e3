use crate::http::{network_error, read_text, send};
use anyhow::Context;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use std::time::Duration;
use study_core::device::{DeviceApi, DeviceError, DeviceFuture, decode_data, decode_target};
use study_core::model::{DeviceData, TargetDuration};
use tracing::info;

/// The study timer's built-in web server.
pub struct HttpDevice {
    client: Client,
    base: Url,
}

impl HttpDevice {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base: base_url_with_slash(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, DeviceError> {
        self.base
            .join(path)
            .map_err(|err| DeviceError::NetworkUnavailable(format!("bad endpoint {path}: {err}")))
    }

    async fn get_text(&self, path: &str) -> Result<String, DeviceError> {
        let url = self.endpoint(path)?;
        let response = send(self.client.get(url)).await?;
        read_text(response).await
    }
}

impl DeviceApi for HttpDevice {
    fn fetch_data(&self) -> DeviceFuture<'_, DeviceData> {
        Box::pin(async move {
            let body = self.get_text("data").await?;
            decode_data(&body)
        })
    }

    fn fetch_target(&self) -> DeviceFuture<'_, TargetDuration> {
        Box::pin(async move {
            let body = self.get_text("target").await?;
            decode_target(&body)
        })
    }

    fn set_target(&self, target: TargetDuration) -> DeviceFuture<'_, ()> {
        Box::pin(async move {
            let mut url = self.endpoint("settarget")?;
            url.query_pairs_mut()
                .append_pair("secs", &target.as_secs().to_string());
            send(self.client.get(url)).await?;
            info!(target_secs = target.as_secs(), "target pushed to device");
            Ok(())
        })
    }

    fn log_now(&self) -> DeviceFuture<'_, String> {
        Box::pin(async move { self.get_text("lognow").await })
    }

    fn clear_logs(&self) -> DeviceFuture<'_, String> {
        Box::pin(async move { self.get_text("clearlogs").await })
    }

    fn upload_logs(&self, csv: Vec<u8>) -> DeviceFuture<'_, String> {
        Box::pin(async move {
            let url = self.endpoint("uploadlogs")?;
            let part = Part::bytes(csv)
                .file_name("logs.csv")
                .mime_str("text/csv")
                .map_err(network_error)?;
            let form = Form::new().part("file", part);
            let response = send(self.client.post(url).multipart(form)).await?;
            read_text(response).await
        })
    }
}

// Url::join replaces the last path segment unless the base ends in '/'.
fn base_url_with_slash(base_url: &str) -> anyhow::Result<Url> {
    let trimmed = base_url.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&normalized).with_context(|| format!("parse device url {base_url}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("device url must be http or https: {base_url}");
    }
    Ok(url)
}
