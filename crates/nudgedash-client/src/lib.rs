// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use nudgedash_app::{StatisticsPayload, StatisticsSource};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/statistics";

#[derive(Debug, Clone)]
pub struct Client {
    endpoint: Url,
    http: HttpClient,
}

impl Client {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    pub fn fetch_statistics(&self) -> Result<StatisticsPayload> {
        debug!(endpoint = %self.endpoint, "fetching statistics");
        let response = self
            .http
            .get(self.endpoint.clone())
            .send()
            .map_err(|error| connection_error(self.endpoint.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response.json().context("decode statistics payload")
    }
}

impl StatisticsSource for Client {
    fn fetch_statistics(&self) -> Result<StatisticsPayload> {
        Client::fetch_statistics(self)
    }
}

pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("source.endpoint must not be empty");
    }
    let url = Url::parse(trimmed).with_context(|| format!("invalid endpoint URL {trimmed:?}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!(
            "endpoint {trimmed:?} uses unsupported scheme {other:?}; use http:// or https://"
        ),
    }
}

fn connection_error(endpoint: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- is the nudgebot server running? ({})",
        endpoint,
        error
    )
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.error.or(parsed.message)
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('<') {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}
