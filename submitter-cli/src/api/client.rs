//! HTTP client for the metadata portal

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Method};
use serde_json::Value;

use super::auth::Credentials;
use super::constants::{REQUEST_TIMEOUT_SECS, USER_AGENT};
use super::operations::{Operation, PortalResponse};
use super::profile::{Profile, parse_profile};

/// Remote object repository, one call per row
///
/// Transport and authentication problems come back as `Err`; any HTTP reply,
/// including 4xx/5xx, is an `Ok(PortalResponse)`.
#[async_trait]
pub trait Portal: Send + Sync {
    /// Base URL this portal talks to
    fn endpoint(&self) -> &str;

    async fn execute(&self, operation: &Operation) -> Result<PortalResponse>;
}

/// Source of profiles, fetched by name
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, name: &str) -> Result<Profile>;
}

/// reqwest-backed portal client for one endpoint
#[derive(Debug, Clone)]
pub struct PortalClient {
    http: Client,
    endpoint: String,
    credentials: Option<Credentials>,
}

impl PortalClient {
    pub fn new(endpoint: impl Into<String>, credentials: Option<Credentials>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    /// URL of the JSON schema for a profile
    pub fn profile_url(&self, name: &str) -> String {
        self.url(&format!("profiles/{}.json", urlencoding::encode(name)))
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.credentials {
            Some(creds) => builder.basic_auth(&creds.access_key, Some(&creds.secret_key)),
            None => builder,
        }
    }
}

#[async_trait]
impl Portal for PortalClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute(&self, operation: &Operation) -> Result<PortalResponse> {
        let method = Method::from_bytes(operation.http_method().as_bytes())
            .context("Invalid HTTP method")?;
        let url = self.url(&operation.path());
        debug!("{} {}", method, url);

        let mut request = self.request(method.clone(), &url);
        if let Some(payload) = operation.payload() {
            request = request.json(payload);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, url))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        let body = if text.trim().is_empty() {
            None
        } else {
            // Non-JSON error pages are kept as a plain string
            Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
        };

        debug!("{} {} -> {}", method, url, status);
        Ok(PortalResponse::new(status, body))
    }
}

#[async_trait]
impl ProfileSource for PortalClient {
    async fn fetch_profile(&self, name: &str) -> Result<Profile> {
        let url = self.profile_url(name);
        info!("Fetching profile '{}' from {}", name, url);

        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch profile from {}", url))?;

        if !response.status().is_success() {
            bail!(
                "Profile '{}' not available at {} (HTTP {})",
                name,
                url,
                response.status().as_u16()
            );
        }

        let schema: Value = response
            .json()
            .await
            .with_context(|| format!("Profile '{}' is not valid JSON", name))?;

        parse_profile(name, &schema)
    }
}
