//! Destination Console HTTP Client
//!
//! reqwest-backed implementation of [`ConsoleAdapter`] against the
//! destination console's computer search endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::console::adapter::ConsoleAdapter;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    search_criteria: Vec<SearchCriterion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchCriterion {
    field_name: String,
    string_test: String,
    string_value: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    computers: Vec<Computer>,
}

#[derive(Debug, Deserialize)]
struct Computer {
    #[serde(rename = "hostName")]
    #[allow(dead_code)]
    host_name: Option<String>,
}

pub struct ConsoleClient {
    client: reqwest::Client,
    base_url: String,
}

impl ConsoleClient {
    /// Build a client with the console API key installed as a default header.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("ApiKey {}", api_key))
                .context("API key is not a valid header value")?,
        );
        headers.insert("api-version", HeaderValue::from_static("v1"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ConsoleAdapter for ConsoleClient {
    async fn host_registered(&self, hostname: &str) -> Result<bool> {
        let url = format!("{}/api/computers/search?expand=none", self.base_url);
        let request = SearchRequest {
            search_criteria: vec![SearchCriterion {
                field_name: "hostName".to_string(),
                string_test: "equal".to_string(),
                // Wildcard match; the console treats % as "any characters".
                string_value: format!("%{}%", hostname),
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        if !response.status().is_success() {
            warn!(hostname, status = %response.status(), "Console search rejected");
            return Ok(false);
        }

        let body: SearchResponse = response.json().await?;
        Ok(!body.computers.is_empty())
    }
}
