use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

/// Third-party transactional-mail HTTP APIs, tried in priority order:
/// Resend first, SendGrid second. The first configured provider wins; a
/// failed request falls through to the next configured one.

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Resend,
    Sendgrid,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resend => "Resend",
            Self::Sendgrid => "SendGrid",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub resend_api_key: Option<String>,
    pub resend_from: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_from: Option<String>,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            resend_api_key: non_empty("RESEND_API_KEY"),
            resend_from: non_empty("RESEND_FROM_EMAIL"),
            sendgrid_api_key: non_empty("SENDGRID_API_KEY"),
            sendgrid_from: non_empty("SENDGRID_FROM_EMAIL"),
        }
    }

    pub fn any_configured(&self) -> bool {
        self.resend_api_key.is_some() || self.sendgrid_api_key.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ProviderDelivery {
    pub provider: Provider,
    pub email_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email via {}", .provider.as_str())]
    Request { provider: Provider, details: String },
}

impl ProviderError {
    pub fn hint(&self) -> &'static str {
        match self {
            Self::NotConfigured => {
                "Add RESEND_API_KEY or SENDGRID_API_KEY to your environment to enable email sending."
            }
            Self::Request { provider, .. } => match provider {
                Provider::Resend => "Please check your Resend API key and configuration.",
                Provider::Sendgrid => "Please check your SendGrid API key and configuration.",
            },
        }
    }
}

pub(crate) fn resend_request_body(from: &str, to: &str, subject: &str, text: &str) -> serde_json::Value {
    json!({
        "from": from,
        "to": to,
        "subject": subject,
        "text": text,
    })
}

pub(crate) fn sendgrid_request_body(
    from: &str,
    to: &str,
    subject: &str,
    text: &str,
) -> serde_json::Value {
    json!({
        "personalizations": [{
            "to": [{ "email": to }],
            "subject": subject,
        }],
        "from": { "email": from },
        "content": [{
            "type": "text/plain",
            "value": text,
        }],
    })
}

/// Deliver a plaintext email through the first provider that accepts it.
pub async fn send_text_email(
    client: &reqwest::Client,
    config: &ProviderConfig,
    to: &str,
    subject: &str,
    text: &str,
) -> Result<ProviderDelivery, ProviderError> {
    if let Some(api_key) = &config.resend_api_key {
        let from = config
            .resend_from
            .as_deref()
            .unwrap_or("Loqta <noreply@loqta.app>");

        match client
            .post(RESEND_ENDPOINT)
            .bearer_auth(api_key)
            .json(&resend_request_body(from, to, subject, text))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                let email_id = response
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|v| v.get("id").and_then(|id| id.as_str().map(String::from)));
                info!("Email sent via Resend to {}", to);
                return Ok(ProviderDelivery {
                    provider: Provider::Resend,
                    email_id,
                });
            }
            Ok(response) => {
                let body = response.text().await.unwrap_or_default();
                warn!("Resend API error, falling through: {}", body);
            }
            Err(e) => {
                warn!("Resend API request failed, falling through: {}", e);
            }
        }
    }

    if let Some(api_key) = &config.sendgrid_api_key {
        let from = config
            .sendgrid_from
            .as_deref()
            .unwrap_or("noreply@loqta.app");

        match client
            .post(SENDGRID_ENDPOINT)
            .bearer_auth(api_key)
            .json(&sendgrid_request_body(from, to, subject, text))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!("Email sent via SendGrid to {}", to);
                return Ok(ProviderDelivery {
                    provider: Provider::Sendgrid,
                    email_id: None,
                });
            }
            Ok(response) => {
                let details = response.text().await.unwrap_or_default();
                error!("SendGrid API error: {}", details);
                return Err(ProviderError::Request {
                    provider: Provider::Sendgrid,
                    details,
                });
            }
            Err(e) => {
                error!("SendGrid API request failed: {}", e);
                return Err(ProviderError::Request {
                    provider: Provider::Sendgrid,
                    details: e.to_string(),
                });
            }
        }
    }

    error!("No email service configured");
    Err(ProviderError::NotConfigured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resend_body_shape() {
        let body = resend_request_body("Loqta <noreply@loqta.app>", "a@b.com", "Hi", "Body");
        assert_eq!(body["from"], "Loqta <noreply@loqta.app>");
        assert_eq!(body["to"], "a@b.com");
        assert_eq!(body["subject"], "Hi");
        assert_eq!(body["text"], "Body");
    }

    #[test]
    fn sendgrid_body_shape() {
        let body = sendgrid_request_body("noreply@loqta.app", "a@b.com", "Hi", "Body");
        assert_eq!(body["personalizations"][0]["to"][0]["email"], "a@b.com");
        assert_eq!(body["personalizations"][0]["subject"], "Hi");
        assert_eq!(body["from"]["email"], "noreply@loqta.app");
        assert_eq!(body["content"][0]["type"], "text/plain");
        assert_eq!(body["content"][0]["value"], "Body");
    }

    #[tokio::test]
    async fn unconfigured_chain_reports_not_configured() {
        let client = reqwest::Client::new();
        let err = send_text_email(&client, &ProviderConfig::default(), "a@b.com", "Hi", "Body")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured));
        assert!(err.hint().contains("RESEND_API_KEY"));
    }
}
