use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::{EmailGateway, NotifyError};
use crate::config::{EmailConfig, SITE_SOURCE};
use crate::leads::domain::Lead;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const SUBJECT: &str = "New Lead: Dubai Waterfront Property";

/// Transactional-mail gateway backed by the Resend send endpoint.
pub struct ResendGateway {
    client: Client,
    config: EmailConfig,
}

impl ResendGateway {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl EmailGateway for ResendGateway {
    async fn send(&self, lead: &Lead) -> Result<(), NotifyError> {
        debug!(to = %self.config.to, "sending lead notification email");
        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "from": self.config.from,
                "to": [self.config.to],
                "subject": SUBJECT,
                "html": render_lead_email(lead),
            }))
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            let detail = if body.is_empty() {
                "Resend email failed".to_string()
            } else {
                body
            };
            Err(NotifyError::Upstream(detail))
        }
    }
}

// Mirrors the site's notification template. Field values are inserted
// verbatim; the form feeds free text straight through, so treat the rendered
// mail as untrusted markup downstream.
fn render_lead_email(lead: &Lead) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #D4AF37;">New Lead Submission</h2>
  <p style="font-size: 16px;">A new potential buyer has requested details:</p>
  <div style="background: #f5f5f5; padding: 20px; border-left: 4px solid #D4AF37; margin: 20px 0;">
    <p><strong>Name:</strong> {name}</p>
    <p><strong>WhatsApp:</strong> {whatsapp}</p>
    <p><strong>Email:</strong> {email}</p>
    <p><strong>Time:</strong> {timestamp}</p>
  </div>
  <p style="color: #666; font-size: 14px;">Source: {source}</p>
</div>"#,
        name = lead.name,
        whatsapp = lead.whatsapp,
        email = lead.email,
        timestamp = lead.timestamp,
        source = SITE_SOURCE,
    )
}
