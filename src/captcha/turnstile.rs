use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{CaptchaVerifier, VerifyError};
use crate::config::TurnstileConfig;

/// Siteverify response body. Only the fields we act on or log.
#[derive(Debug, Deserialize)]
struct SiteverifyOutcome {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
    #[serde(default)]
    hostname: Option<String>,
}

pub struct TurnstileVerifier {
    client: reqwest::Client,
    secret: String,
    verify_url: String,
}

impl TurnstileVerifier {
    pub fn new(config: &TurnstileConfig, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build Turnstile client: {e}"))?;

        Ok(Self {
            client,
            secret: config.secret.clone(),
            verify_url: config.verify_url.clone(),
        })
    }
}

#[async_trait]
impl CaptchaVerifier for TurnstileVerifier {
    fn name(&self) -> &str {
        "turnstile"
    }

    async fn verify(&self, token: &str, remote_ip: IpAddr) -> Result<bool, VerifyError> {
        let remote_ip = remote_ip.to_string();
        let form = [
            ("secret", self.secret.as_str()),
            ("response", token),
            ("remoteip", remote_ip.as_str()),
        ];

        let resp = self
            .client
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| VerifyError::from(format!("Siteverify request failed: {e}")))?;

        let status = resp.status();
        let outcome: SiteverifyOutcome = resp.json().await.map_err(|e| {
            VerifyError::from(format!(
                "Invalid siteverify response (status {status}): {e}"
            ))
        })?;

        if outcome.success {
            tracing::debug!(
                "Turnstile token accepted for {remote_ip} (hostname: {})",
                outcome.hostname.as_deref().unwrap_or("-")
            );
        } else {
            tracing::info!(
                "Turnstile token rejected for {remote_ip}: {:?}",
                outcome.error_codes
            );
        }

        Ok(outcome.success)
    }
}
