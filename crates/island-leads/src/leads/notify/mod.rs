mod resend;
mod sheets;

pub use resend::ResendGateway;
pub use sheets::SheetsClient;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::domain::Lead;

/// Diagnostic recorded on the intake response when no mail key is configured.
pub const EMAIL_NOT_CONFIGURED: &str = "RESEND_API_KEY not configured";

/// Outbound notification mail hook.
#[async_trait]
pub trait EmailGateway: Send + Sync {
    async fn send(&self, lead: &Lead) -> Result<(), NotifyError>;
}

/// Spreadsheet mirror: row append on intake, raw range read for the
/// standalone export.
#[async_trait]
pub trait SheetGateway: Send + Sync {
    async fn append(&self, lead: &Lead) -> Result<(), NotifyError>;
    async fn fetch_values(&self) -> Result<Vec<Vec<String>>, NotifyError>;
}

/// Dispatch error for either integration.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("{0}")]
    Upstream(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Outcome of the email dispatch, threaded into the intake response as a
/// diagnostic. `error` is the upstream body (or a fixed not-configured note).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailDispatch {
    pub sent: bool,
    pub error: Option<String>,
}

/// Best-effort fan-out run after the store write: email first, then the
/// spreadsheet append, sequentially. Neither outcome fails the intake; the
/// sheet result is logged only.
#[derive(Clone, Default)]
pub struct NotificationFanout {
    email: Option<Arc<dyn EmailGateway>>,
    sheets: Option<Arc<dyn SheetGateway>>,
}

impl NotificationFanout {
    pub fn new(
        email: Option<Arc<dyn EmailGateway>>,
        sheets: Option<Arc<dyn SheetGateway>>,
    ) -> Self {
        Self { email, sheets }
    }

    pub async fn dispatch(&self, lead_id: &str, lead: &Lead) -> EmailDispatch {
        let email_outcome = match &self.email {
            Some(gateway) => match gateway.send(lead).await {
                Ok(()) => {
                    info!(%lead_id, "lead notification email sent");
                    EmailDispatch {
                        sent: true,
                        error: None,
                    }
                }
                Err(err) => {
                    error!(%lead_id, %err, "lead notification email failed");
                    EmailDispatch {
                        sent: false,
                        error: Some(err.to_string()),
                    }
                }
            },
            None => {
                warn!(%lead_id, "{EMAIL_NOT_CONFIGURED}");
                EmailDispatch {
                    sent: false,
                    error: Some(EMAIL_NOT_CONFIGURED.to_string()),
                }
            }
        };

        match &self.sheets {
            Some(gateway) => {
                if let Err(err) = gateway.append(lead).await {
                    error!(%lead_id, %err, "spreadsheet append failed");
                } else {
                    info!(%lead_id, "lead appended to spreadsheet");
                }
            }
            None => {
                warn!(%lead_id, "Google Sheets not configured (missing API key or Sheet ID)");
            }
        }

        email_outcome
    }
}
