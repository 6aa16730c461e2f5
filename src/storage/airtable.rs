use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

use super::{RecordFields, RecordStore, StoreError};
use crate::config::AirtableConfig;

#[derive(Serialize)]
struct CreateRecord<'a> {
    fields: &'a RecordFields,
}

pub struct AirtableStore {
    client: reqwest::Client,
    api_key: String,
    table_url: Url,
}

impl AirtableStore {
    pub fn new(config: &AirtableConfig, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build Airtable client: {e}"))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            table_url: table_url(&config.api_url, &config.base_id, &config.table_name)?,
        })
    }
}

/// `{api_url}/{base_id}/{table_name}` with both segments percent-encoded.
fn table_url(api_url: &str, base_id: &str, table_name: &str) -> Result<Url, String> {
    let mut url =
        Url::parse(api_url).map_err(|e| format!("Invalid AIRTABLE_API_URL '{api_url}': {e}"))?;

    url.path_segments_mut()
        .map_err(|_| format!("AIRTABLE_API_URL '{api_url}' cannot be a base URL"))?
        .pop_if_empty()
        .push(base_id)
        .push(table_name);

    Ok(url)
}

/// Pull a readable message out of an Airtable `error` value, which is either
/// a bare string or `{ "type": .., "message": .. }`.
fn describe_error(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(obj) => {
            let kind = obj.get("type").and_then(|v| v.as_str()).unwrap_or("UNKNOWN");
            match obj.get("message").and_then(|v| v.as_str()) {
                Some(msg) => format!("{kind}: {msg}"),
                None => kind.to_string(),
            }
        }
        other => other.to_string(),
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    fn name(&self) -> &str {
        "airtable"
    }

    async fn create(&self, fields: &RecordFields) -> Result<String, StoreError> {
        let resp = self
            .client
            .post(self.table_url.clone())
            .bearer_auth(&self.api_key)
            .json(&CreateRecord { fields })
            .send()
            .await
            .map_err(|e| StoreError::from(format!("Airtable request failed: {e}")))?;

        let status = resp.status();
        let body: Value = resp.json().await.map_err(|e| {
            StoreError::from(format!("Invalid Airtable response (status {status}): {e}"))
        })?;

        if let Some(error) = body.get("error") {
            return Err(StoreError::from(format!(
                "Airtable rejected record (status {status}): {}",
                describe_error(error)
            )));
        }

        if !status.is_success() {
            return Err(StoreError::from(format!(
                "Airtable request failed with status {status}"
            )));
        }

        let id = body["id"].as_str().unwrap_or_default().to_string();
        tracing::debug!("Airtable record created: {id}");
        Ok(id)
    }
}
