pub mod airtable;

use async_trait::async_trait;
use serde::Serialize;

use crate::captcha::CaptchaStatus;

/// The record written for one submission, keyed by the table's column names.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordFields {
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Email", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "Phone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "Subject", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "Turnstile Status")]
    pub turnstile_status: CaptchaStatus,
}

#[derive(Debug)]
pub struct StoreError {
    pub message: String,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for StoreError {
    fn from(s: String) -> Self {
        StoreError { message: s }
    }
}

impl From<&str> for StoreError {
    fn from(s: &str) -> Self {
        StoreError {
            message: s.to_string(),
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    fn name(&self) -> &str;
    /// Create one record, returning the id the store assigned to it.
    async fn create(&self, fields: &RecordFields) -> Result<String, StoreError>;
}
