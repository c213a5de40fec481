// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{HttpProbe, HttpResponse, PlaintextProbe};
use crate::errors::{HttpError, ScannerError, ScannerResult};

const USER_AGENT: &str = concat!("posture-scanner/", env!("CARGO_PKG_VERSION"));

const MAX_REDIRECTS: usize = 5;

pub struct ReqwestHttpProbe {
    /// Follows redirects, ignores certificate problems
    client: Client,
    /// Never follows redirects
    plain_client: Client,
}

impl ReqwestHttpProbe {
    pub fn new(request_timeout: Duration) -> ScannerResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScannerError::Configuration(format!("HTTP client setup: {}", e)))?;

        let plain_client = Client::builder()
            .redirect(Policy::none())
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScannerError::Configuration(format!("HTTP client setup: {}", e)))?;

        Ok(Self {
            client,
            plain_client,
        })
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let started = Instant::now();
        let response = self.client.get(url).send().await?;

        Ok(HttpResponse {
            url: response.url().to_string(),
            status_code: response.status().as_u16(),
            headers: collect_headers(&response),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}

fn collect_headers(response: &Response) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for (name, value) in response.headers() {
        if let Ok(value) = value.to_str() {
            headers
                .entry(name.as_str().to_ascii_lowercase())
                .or_insert_with(|| value.to_string());
        }
    }
    headers
}

#[async_trait]
impl HttpProbe for ReqwestHttpProbe {
    async fn fetch_headers(&self, host: &str) -> ScannerResult<HttpResponse> {
        let https_url = format!("https://{}/", host);
        let https_error = match self.get(&https_url).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        debug!(host, error = %https_error, "HTTPS fetch failed, trying HTTP");

        let http_url = format!("http://{}/", host);
        match self.get(&http_url).await {
            Ok(response) => Ok(response),
            Err(http_error) => {
                if https_error.is_timeout() && http_error.is_timeout() {
                    return Err(ScannerError::from(http_error));
                }
                Err(HttpError::Unreachable {
                    host: host.to_string(),
                    reason: format!("https: {}; http: {}", https_error, http_error),
                }
                .into())
            }
        }
    }

    async fn fetch_plaintext(&self, host: &str) -> PlaintextProbe {
        let url = format!("http://{}/", host);

        let response = match self.plain_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                debug!(host, outcome = "timeout", "Plain HTTP probe timed out");
                return PlaintextProbe::TimedOut;
            }
            Err(e) => {
                debug!(host, outcome = "refused", error = %e, "Plain HTTP probe failed");
                return PlaintextProbe::Refused;
            }
        };

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body_len = response.bytes().await.map(|b| b.len()).unwrap_or(0);

        PlaintextProbe::Response {
            status,
            location,
            body_len,
        }
    }
}
