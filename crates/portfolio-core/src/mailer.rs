//! Outbound invitation email.
//!
//! Delivery is fire-and-forget from the portfolio's point of view: an
//! invitation token stays valid for its full lifetime whether or not the
//! email arrives.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::BrevoConfig;

pub const BREVO_SEND_URL: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Brevo send failed (status={status}): {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait InvitationMailer: Send + Sync {
    async fn send_invitation(
        &self,
        email: &str,
        token: &str,
        inviter_display_name: &str,
    ) -> Result<(), MailError>;
}

/// Used when no email provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMailer;

#[async_trait]
impl InvitationMailer for NoopMailer {
    async fn send_invitation(
        &self,
        email: &str,
        _token: &str,
        inviter_display_name: &str,
    ) -> Result<(), MailError> {
        info!(email = %email, inviter = %inviter_display_name, "Email delivery not configured; invitation email skipped");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoEmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendEmailBody {
    sender: BrevoEmailAddress,
    to: Vec<BrevoEmailAddress>,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_content: Option<String>,
}

pub fn invitation_link(app_base_url: &str, token: &str) -> String {
    format!("{}/invite?token={}", app_base_url.trim_end_matches('/'), token)
}

fn is_success_status(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Sends invitations through Brevo's transactional email API.
pub struct BrevoMailer {
    client: reqwest::Client,
    config: BrevoConfig,
    endpoint: String,
}

impl BrevoMailer {
    pub fn new(config: BrevoConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            endpoint: BREVO_SEND_URL.to_string(),
        }
    }

    /// Point at a different API host (staging, local relay).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn build_body(&self, email: &str, token: &str, inviter_display_name: &str) -> BrevoSendEmailBody {
        let link = invitation_link(&self.config.app_base_url, token);
        let subject = format!("{inviter_display_name} invited you to collaborate on their portfolio");
        let text = format!(
            "{inviter_display_name} has invited you to join their portfolio.\n\n\
             Accept the invitation: {link}\n\n\
             This link expires in 7 days."
        );
        let html = format!(
            "<p>{name} has invited you to join their portfolio.</p>\
             <p><a href=\"{href}\">Accept the invitation</a></p>\
             <p>This link expires in 7 days.</p>",
            name = html_escape::encode_text(inviter_display_name),
            href = html_escape::encode_double_quoted_attribute(&link),
        );

        BrevoSendEmailBody {
            sender: BrevoEmailAddress {
                email: self.config.sender_email.clone(),
                name: self.config.sender_name.clone(),
            },
            to: vec![BrevoEmailAddress {
                email: email.to_string(),
                name: None,
            }],
            subject,
            html_content: Some(html),
            text_content: Some(text),
        }
    }
}

#[async_trait]
impl InvitationMailer for BrevoMailer {
    async fn send_invitation(
        &self,
        email: &str,
        token: &str,
        inviter_display_name: &str,
    ) -> Result<(), MailError> {
        let body = self.build_body(email, token, inviter_display_name);

        let resp = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.config.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if is_success_status(status) {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(MailError::Rejected { status, body })
    }
}
