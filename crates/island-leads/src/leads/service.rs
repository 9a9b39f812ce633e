use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use csv::{QuoteStyle, WriterBuilder};
use tracing::{error, info};

use super::domain::{new_lead_id, LeadSubmission, LEAD_KEY_PREFIX};
use super::notify::{EmailDispatch, NotificationFanout};
use super::store::{LeadStore, StoreError};

/// Header of the admin CSV export. Every field is quoted, including the
/// header row.
const EXPORT_HEADER: [&str; 5] = ["submitted_at", "name", "email", "whatsapp", "source"];

/// Service composing the lead store and the notification fan-out: validated
/// intake on one side, token-gated CSV export on the other.
pub struct LeadService {
    store: Arc<dyn LeadStore>,
    fanout: NotificationFanout,
    admin_token: Option<String>,
}

/// What intake reports back: the generated key plus the email diagnostic.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub lead_id: String,
    pub email: EmailDispatch,
}

/// A rendered export ready to be served as a download.
#[derive(Debug, Clone)]
pub struct CsvDocument {
    pub filename: String,
    pub body: String,
}

/// Error raised by lead intake.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Missing required fields")]
    MissingFields,
}

/// Error raised by the admin export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Export disabled: ADMIN_EXPORT_TOKEN not configured")]
    Disabled,
    #[error("Unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("csv serialization failed: {0}")]
    Csv(String),
}

impl LeadService {
    pub fn new(
        store: Arc<dyn LeadStore>,
        fanout: NotificationFanout,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            store,
            fanout,
            admin_token,
        }
    }

    /// Validate, persist, and fan out one submission. A failed store write is
    /// logged and swallowed: intake availability is preferred over
    /// durability, and the caller still receives a success payload. The
    /// fan-out runs regardless so a lost record still reaches the inbox.
    pub async fn submit(&self, submission: LeadSubmission) -> Result<SubmitOutcome, IntakeError> {
        if !submission.has_required_fields() {
            return Err(IntakeError::MissingFields);
        }

        let lead_id = new_lead_id();
        let lead = submission.into_lead();
        info!(%lead_id, name = %lead.name, email = %lead.email, "received lead submission");

        if let Err(err) = self.store.set(&lead_id, &lead).await {
            error!(%lead_id, %err, "lead store write failed; submission continues");
        }

        let email = self.fanout.dispatch(&lead_id, &lead).await;

        Ok(SubmitOutcome { lead_id, email })
    }

    /// Render every stored lead as CSV, newest first. Fails closed when no
    /// admin token is configured; the caller token must match exactly.
    pub async fn export_csv(&self, provided_token: Option<&str>) -> Result<CsvDocument, ExportError> {
        let required = self.admin_token.as_deref().ok_or(ExportError::Disabled)?;
        match provided_token {
            Some(token) if !token.is_empty() && token == required => {}
            _ => return Err(ExportError::Unauthorized),
        }

        let mut leads = self.store.get_by_prefix(LEAD_KEY_PREFIX).await?;
        leads.sort_by_key(|(_, lead)| Reverse(timestamp_millis(&lead.timestamp)));

        let rows = leads.iter().map(|(_, lead)| {
            vec![
                lead.timestamp.clone(),
                lead.name.clone(),
                lead.email.clone(),
                lead.whatsapp.clone(),
                lead.source.clone(),
            ]
        });

        let header: Vec<String> = EXPORT_HEADER.iter().map(|s| s.to_string()).collect();
        let body = write_csv(std::iter::once(header).chain(rows), QuoteStyle::Always)
            .map_err(|err| ExportError::Csv(err.to_string()))?;

        let filename = format!("leads-{}.csv", Utc::now().format("%Y-%m-%d"));
        Ok(CsvDocument { filename, body })
    }
}

/// Parse an RFC 3339 timestamp into epoch millis for ordering; anything
/// unparsable collapses to 0 and sorts last in the newest-first export.
pub(crate) fn timestamp_millis(raw: &str) -> i64 {
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.timestamp_millis())
        .unwrap_or(0)
}

pub(crate) fn write_csv<I>(rows: I, style: QuoteStyle) -> Result<String, csv::Error>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(style)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| err.into_error())?;
    Ok(String::from_utf8(bytes).expect("csv output is valid utf-8"))
}
