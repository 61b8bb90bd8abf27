pub mod address;
pub mod classify;
pub mod config;
pub mod providers;
pub mod smtp;
pub mod templates;

pub use address::is_valid_email;
pub use classify::{ClassifiedFailure, FailureKind, classify_send_failure};
pub use config::{MailConfigError, SmtpConfig, missing_smtp_vars};
pub use providers::{Provider, ProviderConfig, ProviderDelivery, ProviderError};
pub use smtp::{MailError, Mailer};
