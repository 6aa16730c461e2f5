pub mod turnstile;

use std::net::IpAddr;

use async_trait::async_trait;
use serde::Serialize;

/// Outcome of the CAPTCHA step for one submission.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaptchaStatus {
    Passed,
    Failed,
    Skipped,
}

impl CaptchaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptchaStatus::Passed => "passed",
            CaptchaStatus::Failed => "failed",
            CaptchaStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for CaptchaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct VerifyError {
    pub message: String,
}

impl std::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for VerifyError {
    fn from(s: String) -> Self {
        VerifyError { message: s }
    }
}

impl From<&str> for VerifyError {
    fn from(s: &str) -> Self {
        VerifyError {
            message: s.to_string(),
        }
    }
}

/// Checks a client-side challenge token with the remote verification service.
///
/// `Ok(false)` means the service rejected the token. `Err` is reserved for
/// failing to get a verdict at all.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    fn name(&self) -> &str;
    async fn verify(&self, token: &str, remote_ip: IpAddr) -> Result<bool, VerifyError>;
}
