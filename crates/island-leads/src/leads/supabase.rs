use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use async_trait::async_trait;

use super::domain::Lead;
use super::store::{LeadStore, StoreError};
use crate::config::StoreConfig;

/// Thin adapter over the Supabase PostgREST interface for the key-value lead
/// table. One row per lead: `key` text primary key, `value` jsonb.
pub struct SupabaseLeadStore {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct KvRow {
    key: String,
    value: serde_json::Value,
}

impl SupabaseLeadStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.service_role_key)
            .map_err(|err| StoreError::Unavailable(format!("invalid service key: {err}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_role_key))
            .map_err(|err| StoreError::Unavailable(format!("invalid service key: {err}")))?;
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        let base_url = format!(
            "{}/rest/v1/{}",
            config.url.trim_end_matches('/'),
            config.table
        );

        Ok(Self { client, base_url })
    }

    fn decode_lead(key: &str, value: serde_json::Value) -> Result<Lead, StoreError> {
        serde_json::from_value(value)
            .map_err(|err| StoreError::Decode(format!("record '{key}': {err}")))
    }

    async fn error_for(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::Upstream { status, body }
    }
}

#[async_trait]
impl LeadStore for SupabaseLeadStore {
    async fn set(&self, key: &str, lead: &Lead) -> Result<(), StoreError> {
        debug!(%key, "writing lead record");
        let response = self
            .client
            .post(&self.base_url)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .query(&[("on_conflict", "key")])
            .json(&json!({ "key": key, "value": lead }))
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for(response).await)
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Lead>, StoreError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("select", "key,value".to_string()),
                ("key", format!("eq.{key}")),
            ])
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let mut rows: Vec<KvRow> = response
            .json()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))?;

        match rows.pop() {
            Some(row) => Ok(Some(Self::decode_lead(&row.key, row.value)?)),
            None => Ok(None),
        }
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Lead)>, StoreError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("select", "key,value".to_string()),
                ("key", format!("like.{prefix}%")),
                ("order", "key.desc".to_string()),
            ])
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let rows: Vec<KvRow> = response
            .json()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let lead = Self::decode_lead(&row.key, row.value)?;
                Ok((row.key, lead))
            })
            .collect()
    }
}
