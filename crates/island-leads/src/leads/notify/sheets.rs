use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{NotifyError, SheetGateway};
use crate::config::SheetsConfig;
use crate::leads::domain::Lead;

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

// Appends always target the five lead columns regardless of the configured
// read range.
const APPEND_RANGE: &str = "Sheet1!A:E";

/// Google Sheets values API client: append-on-intake plus the raw range read
/// used by the standalone mirror export.
pub struct SheetsClient {
    client: Client,
    config: SheetsConfig,
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl SheetsClient {
    pub fn new(config: SheetsConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn upstream_error(response: reqwest::Response) -> NotifyError {
        let body = response.text().await.unwrap_or_default();
        NotifyError::Upstream(body)
    }
}

#[async_trait]
impl SheetGateway for SheetsClient {
    async fn append(&self, lead: &Lead) -> Result<(), NotifyError> {
        let url = format!(
            "{SHEETS_BASE}/{}/values/{APPEND_RANGE}:append",
            self.config.sheet_id
        );
        debug!(sheet_id = %self.config.sheet_id, "appending lead row");

        let response = self
            .client
            .post(url)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("key", self.config.api_key.as_str()),
            ])
            .json(&json!({
                "values": [[
                    lead.timestamp,
                    lead.name,
                    lead.email,
                    lead.whatsapp,
                    lead.source,
                ]],
            }))
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::upstream_error(response).await)
        }
    }

    async fn fetch_values(&self) -> Result<Vec<Vec<String>>, NotifyError> {
        let url = format!(
            "{SHEETS_BASE}/{}/values/{}",
            self.config.sheet_id, self.config.range
        );

        let response = self
            .client
            .get(url)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::upstream_error(response).await);
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        Ok(range.values.into_iter().map(stringify_row).collect())
    }
}

// Sheet cells come back as arbitrary JSON scalars; render them the way a
// spreadsheet displays them.
fn stringify_row(row: Vec<Value>) -> Vec<String> {
    row.into_iter()
        .map(|cell| match cell {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stringify_row_renders_scalars() {
        let row = vec![
            Value::String("Jane".to_string()),
            Value::Null,
            json!(42),
            json!(true),
        ];
        assert_eq!(stringify_row(row), ["Jane", "", "42", "true"]);
    }
}
