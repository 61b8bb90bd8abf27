use thiserror::Error;

/// Environment variables the SMTP path requires.
pub const REQUIRED_SMTP_VARS: [&str; 4] =
    ["SMTP_HOST", "SMTP_PORT", "SMTP_USERNAME", "SMTP_PASSWORD"];

#[derive(Debug, Error)]
pub enum MailConfigError {
    #[error("Missing SMTP configuration")]
    Missing { missing: Vec<&'static str> },

    #[error("Invalid SMTP_PORT: {value}")]
    InvalidPort { value: String },
}

impl MailConfigError {
    pub fn details(&self) -> String {
        match self {
            Self::Missing { missing } => format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            ),
            Self::InvalidPort { value } => {
                format!("SMTP_PORT must be a port number between 1 and 65535, got \"{value}\"")
            }
        }
    }
}

/// Host/port/credentials for the outbound SMTP transport.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Which required SMTP variables are absent or blank.
pub fn missing_smtp_vars() -> Vec<&'static str> {
    REQUIRED_SMTP_VARS
        .into_iter()
        .filter(|key| {
            std::env::var(key)
                .map(|v| v.trim().is_empty())
                .unwrap_or(true)
        })
        .collect()
}

impl SmtpConfig {
    pub fn from_env() -> Result<Self, MailConfigError> {
        let missing = missing_smtp_vars();
        if !missing.is_empty() {
            return Err(MailConfigError::Missing { missing });
        }

        let raw_port = std::env::var("SMTP_PORT").unwrap_or_default();
        let port: u16 = raw_port
            .trim()
            .parse()
            .ok()
            .filter(|p| *p > 0)
            .ok_or(MailConfigError::InvalidPort { value: raw_port })?;

        Ok(Self {
            host: std::env::var("SMTP_HOST").unwrap_or_default().trim().to_string(),
            port,
            username: std::env::var("SMTP_USERNAME").unwrap_or_default().trim().to_string(),
            password: std::env::var("SMTP_PASSWORD").unwrap_or_default().trim().to_string(),
        })
    }

    /// Loggable form: everything except the password.
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::json!({
            "host": self.host,
            "port": self.port,
            "username": self.username,
            "password": "***hidden***",
        })
    }
}
