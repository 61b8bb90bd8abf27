use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use loqta_db::NotifyWriteError;
use loqta_mail::{MailError, ProviderError};

/// Wire shape of every error response. `details`/`code`/`hint` are optional
/// extra context the UI shows under the headline message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    NotFoundWithHint { message: String, hint: String },

    #[error("Failed to create notification")]
    NotificationWrite(#[from] NotifyWriteError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::MissingFields(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) | Self::NotFoundWithHint { .. } => StatusCode::NOT_FOUND,
            Self::NotificationWrite(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Mail(e) => {
                StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::BadRequest(_) | Self::Unauthorized(_) | Self::Conflict(_) | Self::NotFound(_) => ErrorBody {
                error: self.to_string(),
                details: None,
                code: None,
                hint: None,
            },
            Self::MissingFields(fields) => ErrorBody {
                error: self.to_string(),
                details: Some(format!(
                    "The following fields are required: {}",
                    fields.join(", ")
                )),
                code: None,
                hint: None,
            },
            Self::NotFoundWithHint { message, hint } => ErrorBody {
                error: message.clone(),
                details: None,
                code: None,
                hint: Some(hint.clone()),
            },
            Self::NotificationWrite(e) => ErrorBody {
                error: self.to_string(),
                details: Some(e.to_string()),
                code: Some(e.code().to_string()),
                hint: Some(e.hint().to_string()),
            },
            Self::Mail(e) => ErrorBody {
                error: e.to_string(),
                details: Some(e.details()),
                code: None,
                hint: None,
            },
            Self::Provider(e) => ErrorBody {
                error: e.to_string(),
                details: match e {
                    ProviderError::NotConfigured => Some(
                        "No email service is configured. Please set RESEND_API_KEY or \
                         SENDGRID_API_KEY in your environment variables."
                            .to_string(),
                    ),
                    ProviderError::Request { details, .. } => Some(details.clone()),
                },
                code: None,
                hint: Some(e.hint().to_string()),
            },
            Self::Internal(e) => ErrorBody {
                error: self.to_string(),
                details: Some(e.to_string()),
                code: None,
                hint: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!("Internal error: {:#}", e);
        }
        (self.status(), Json(self.body())).into_response()
    }
}

/// spawn_blocking join failures are always bugs, never user errors.
pub fn join_err(e: tokio::task::JoinError) -> ApiError {
    ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_names_every_field() {
        let body = ApiError::MissingFields(vec!["itemId", "senderId"]).body();
        assert_eq!(body.error, "Missing required fields");
        assert_eq!(
            body.details.as_deref(),
            Some("The following fields are required: itemId, senderId")
        );
    }

    #[test]
    fn notification_write_carries_code_and_hint() {
        let body = ApiError::NotificationWrite(NotifyWriteError::SelfNotification).body();
        assert_eq!(body.error, "Failed to create notification");
        assert_eq!(body.code.as_deref(), Some("self_notification"));
        assert!(body.hint.is_some());
    }

    #[test]
    fn provider_not_configured_is_a_500_with_hint() {
        let err = ApiError::Provider(ProviderError::NotConfigured);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body();
        assert_eq!(body.error, "Email service not configured");
        assert!(body.hint.unwrap().contains("RESEND_API_KEY"));
    }
}
