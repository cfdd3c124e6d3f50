//! EDR HTTP Client
//!
//! reqwest-backed implementation of [`EdrAdapter`] against the platform's
//! REST API. Authentication is a static token installed as a default
//! header; every path is scoped to one organization.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use tracing::warn;

use crate::edr::adapter::EdrAdapter;
use crate::edr::protocol::{
    CommandRequest, CommandResponse, DeviceActionRequest, DeviceResponse, SessionResponse,
    StartSessionRequest, UploadResponse, COMMAND_COMPLETE,
};

/// Header carrying the platform API token.
const AUTH_HEADER: &str = "X-AUTH-TOKEN";

pub struct EdrClient {
    client: reqwest::Client,
    base_url: String,
    org_key: String,
}

impl EdrClient {
    /// Build a client with the API token installed as a default header.
    pub fn new(base_url: &str, org_key: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTH_HEADER,
            HeaderValue::from_str(api_key).context("API key is not a valid header value")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            org_key: org_key.to_string(),
        })
    }

    fn org_url(&self, tail: &str) -> String {
        format!(
            "{}/appservices/v6/orgs/{}/{}",
            self.base_url, self.org_key, tail
        )
    }
}

#[async_trait]
impl EdrAdapter for EdrClient {
    async fn device_name(&self, device_id: u64) -> Result<Option<String>> {
        let url = self.org_url(&format!("devices/{}", device_id));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        if !response.status().is_success() {
            warn!(device_id, status = %response.status(), "Device lookup rejected");
            return Ok(None);
        }

        let body: DeviceResponse = response.json().await?;
        Ok(body.name)
    }

    async fn start_session(&self, device_id: u64) -> Result<Option<String>> {
        let url = self.org_url("liveresponse/sessions");
        let response = self
            .client
            .post(&url)
            .json(&StartSessionRequest { device_id })
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        if !response.status().is_success() {
            warn!(device_id, status = %response.status(), "Session request rejected");
            return Ok(None);
        }

        let body: SessionResponse = response.json().await?;
        Ok(body.id)
    }

    async fn upload_file(&self, session_id: &str, data: Vec<u8>) -> Result<Option<String>> {
        let url = self.org_url(&format!("liveresponse/sessions/{}/files", session_id));
        let form = Form::new().part("file", Part::bytes(data).file_name("agent_install.ps1"));

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        if !response.status().is_success() {
            warn!(session_id, status = %response.status(), "File upload rejected");
            return Ok(None);
        }

        let body: UploadResponse = response.json().await?;
        Ok(body.id)
    }

    async fn issue_command(
        &self,
        session_id: &str,
        request: CommandRequest,
    ) -> Result<Option<u64>> {
        let url = self.org_url(&format!("liveresponse/sessions/{}/commands", session_id));
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        if !response.status().is_success() {
            warn!(session_id, status = %response.status(), "Command rejected");
            return Ok(None);
        }

        let body: CommandResponse = response.json().await?;
        Ok(body.id)
    }

    async fn command_complete(&self, session_id: &str, command_id: u64) -> Result<bool> {
        let url = self.org_url(&format!(
            "liveresponse/sessions/{}/commands/{}",
            session_id, command_id
        ));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let body: CommandResponse = response.json().await?;
        Ok(body.status.as_deref() == Some(COMMAND_COMPLETE))
    }

    async fn uninstall_sensors(&self, device_ids: &[u64]) -> Result<()> {
        let url = self.org_url("device_actions");
        let response = self
            .client
            .post(&url)
            .json(&DeviceActionRequest::uninstall(device_ids))
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Sensor uninstall request failed with status {}", status);
        }

        Ok(())
    }
}
