use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use loqta_db::models::ItemRow;
use loqta_mail::address::local_part;
use loqta_mail::{Mailer, SmtpConfig, is_valid_email, missing_smtp_vars, templates};
use loqta_types::api::{NotificationEmailRequest, SendEmailRequest, TestEmailRequest};

use crate::auth::AppState;
use crate::convert::parse_id;
use crate::error::{ApiError, join_err};

pub(crate) fn item_link(app_url: &str, item_id: &str) -> String {
    format!("{}/items?itemId={}", app_url.trim_end_matches('/'), item_id)
}

/// Who is reaching out, for the outreach template. Falls back to anonymous
/// service values when the sender cannot be resolved — a broken profile
/// lookup must not block the email.
pub(crate) async fn sender_identity(state: &AppState, sender_id: Uuid) -> (String, String) {
    let mut sender_email = "someone@loqta.app".to_string();
    let mut sender_name = "A Loqta user".to_string();

    let db_state = state.clone();
    let uid = sender_id.to_string();
    let lookup = tokio::task::spawn_blocking(move || {
        let user = db_state.db.get_user_by_id(&uid)?;
        let profile = db_state.db.get_profile(&uid)?;
        anyhow::Ok((user, profile))
    })
    .await;

    match lookup {
        Ok(Ok((user, profile))) => {
            if let Some(user) = user {
                sender_email = user.email;
                sender_name = profile
                    .and_then(|p| p.full_name)
                    .unwrap_or_else(|| local_part(&sender_email).to_string());
            }
        }
        Ok(Err(e)) => warn!("Sender lookup failed for {}: {}", sender_id, e),
        Err(e) => warn!("Sender lookup join error for {}: {}", sender_id, e),
    }

    (sender_name, sender_email)
}

/// Recipient resolution, in priority order: the contact email the reporter
/// typed into the report form, then (privileged deployments only) the
/// receiver's account email. Returns (email, display name).
pub(crate) async fn resolve_recipient(
    state: &AppState,
    item: &ItemRow,
) -> Result<(String, String), ApiError> {
    if let Some(contact) = item.contact_email.as_deref() {
        let contact = contact.trim();
        if !contact.is_empty() {
            return Ok((contact.to_string(), local_part(contact).to_string()));
        }
    }

    if state.service_role {
        let db_state = state.clone();
        let owner_id = item.user_id.clone();
        let user = tokio::task::spawn_blocking(move || db_state.db.get_user_by_id(&owner_id))
            .await
            .map_err(join_err)??;

        if let Some(user) = user {
            let db_state = state.clone();
            let owner_id = item.user_id.clone();
            let profile = tokio::task::spawn_blocking(move || db_state.db.get_profile(&owner_id))
                .await
                .map_err(join_err)??;

            let name = profile
                .and_then(|p| p.full_name)
                .unwrap_or_else(|| local_part(&user.email).to_string());
            return Ok((user.email, name));
        }
    }

    Err(ApiError::NotFoundWithHint {
        message: "Could not find receiver email. Please make sure the finder entered a contact email in the report form.".into(),
        hint: "The contact email field in the report form must be filled out to send emails.".into(),
    })
}

/// POST /api/send-email — direct SMTP outreach to an item's contact email.
pub async fn send_email(
    State(state): State<AppState>,
    Json(req): Json<SendEmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut missing = Vec::new();
    if req.item_id.is_none() {
        missing.push("itemId");
    }
    if req.item_title.as_deref().map_or(true, str::is_empty) {
        missing.push("itemTitle");
    }
    if req.item_type.is_none() {
        missing.push("itemType");
    }
    if req.contact_email.as_deref().map_or(true, str::is_empty) {
        missing.push("contactEmail");
    }
    if req.sender_id.is_none() {
        missing.push("senderId");
    }
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }

    let (Some(item_id), Some(item_title), Some(item_type), Some(contact_email), Some(sender_id)) =
        (req.item_id, req.item_title, req.item_type, req.contact_email, req.sender_id)
    else {
        return Err(ApiError::MissingFields(Vec::new()));
    };

    if !is_valid_email(&contact_email) {
        return Err(loqta_mail::MailError::InvalidRecipient {
            address: contact_email,
        }
        .into());
    }

    // SMTP configuration is validated before any lookups so a misconfigured
    // deployment fails fast.
    let mailer = Mailer::from_env()?;

    let (sender_name, sender_email) = sender_identity(&state, sender_id).await;
    let link = item_link(&state.app_url, &item_id.to_string());
    let content =
        templates::claim_outreach(&sender_name, &sender_email, &item_title, item_type, &link);

    mailer
        .send(&contact_email, &content.subject, &content.html, &content.text)
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// POST /api/send-notification-email — resolves a notification (or explicit
/// ids) to an item, resolves the recipient, and delivers a plaintext inquiry
/// through the HTTP provider chain (Resend first, then SendGrid).
pub async fn send_notification_email(
    State(state): State<AppState>,
    Json(req): Json<NotificationEmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut item_id = req.item_id;
    let mut receiver_id = req.receiver_id;
    let mut sender_id = req.sender_id;

    // A notification id alone is enough: the row carries the triple.
    if let (Some(notification_id), None) = (req.notification_id, req.item_id) {
        let db_state = state.clone();
        let row = tokio::task::spawn_blocking(move || {
            db_state.db.get_notification(&notification_id.to_string())
        })
        .await
        .map_err(join_err)??
        .ok_or_else(|| ApiError::NotFound("Notification not found".into()))?;

        item_id = Some(parse_id(&row.item_id, "notification item_id"));
        receiver_id = Some(parse_id(&row.receiver_id, "notification receiver_id"));
        sender_id = Some(parse_id(&row.sender_id, "notification sender_id"));
    }

    let (Some(item_id), Some(_receiver_id), Some(_sender_id)) = (item_id, receiver_id, sender_id)
    else {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    };

    let db_state = state.clone();
    let item = tokio::task::spawn_blocking(move || db_state.db.get_item(&item_id.to_string()))
        .await
        .map_err(join_err)??
        .ok_or_else(|| ApiError::NotFound("Item not found".into()))?;

    let (receiver_email, receiver_name) = resolve_recipient(&state, &item).await?;

    let content = templates::found_item_inquiry(
        &receiver_name,
        &item.title,
        Some(&item.description),
        Some(&item.location),
        item.handover_location_private.as_deref(),
    );

    let delivery = loqta_mail::providers::send_text_email(
        &state.http,
        &state.providers,
        &receiver_email,
        &content.subject,
        &content.text,
    )
    .await?;

    let mut body = json!({
        "success": true,
        "message": format!("Email sent successfully via {}", delivery.provider.as_str()),
    });
    if let Some(email_id) = delivery.email_id {
        body["emailId"] = json!(email_id);
    }
    Ok(Json(body))
}

/// POST /api/test-email — validates the SMTP configuration end to end by
/// sending a diagnostic message. Response shapes here predate the shared
/// error body and are kept as-is for the admin tooling that parses them.
pub async fn test_email(Json(req): Json<TestEmailRequest>) -> Response {
    let missing = missing_smtp_vars();
    if !missing.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "SMTP configuration missing",
                "details": format!("Missing required environment variables: {}", missing.join(", ")),
                "missing": missing,
            })),
        )
            .into_response();
    }

    let config = match SmtpConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Invalid SMTP configuration",
                    "details": e.details(),
                })),
            )
                .into_response();
        }
    };

    let mailer = match Mailer::new(&config) {
        Ok(mailer) => mailer,
        Err(e) => return connection_failure(&config, &e.details()),
    };
    if let Err(e) = mailer.verify().await {
        return connection_failure(&config, &e.details);
    }

    let to = req
        .to
        .filter(|to| !to.trim().is_empty())
        .unwrap_or_else(|| config.username.clone());
    let content = templates::smtp_test(&config);

    match mailer
        .send(&to, &content.subject, &content.html, &content.text)
        .await
    {
        Ok(ack) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Test email sent successfully!",
                "details": format!("Test email sent to {to}"),
                "messageId": ack,
                "config": config.redacted(),
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": e.to_string(),
                "details": e.details(),
                "config": config.redacted(),
            })),
        )
            .into_response(),
    }
}

/// GET /api/test-email — reports configuration status without sending.
pub async fn test_email_status() -> Response {
    let missing = missing_smtp_vars();
    let config = match SmtpConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "configured": false,
                    "error": "SMTP configuration missing or invalid",
                    "missing": missing,
                    "details": e.details(),
                })),
            )
                .into_response();
        }
    };

    let connected = match Mailer::new(&config) {
        Ok(mailer) => mailer.verify().await.is_ok(),
        Err(_) => false,
    };
    let connection_status = if connected { "connected" } else { "failed" };

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "configured": true,
            "connectionStatus": connection_status,
            "config": config.redacted(),
            "message": if connected {
                "SMTP configuration is valid and connection successful!"
            } else {
                "SMTP configuration found but connection failed. Please check your credentials."
            },
        })),
    )
        .into_response()
}

fn connection_failure(config: &SmtpConfig, details: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "SMTP connection failed",
            "details": details,
            "config": config.redacted(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_item, seed_user, test_state};

    #[tokio::test]
    async fn contact_email_wins_over_account_email() {
        let state = test_state(true).await;
        let owner = seed_user(&state, "finder", "finder@example.com");
        let item = seed_item(&state, &owner, Some("  contact@example.com  "));

        let (email, name) = resolve_recipient(&state, &item).await.unwrap();
        assert_eq!(email, "contact@example.com");
        assert_eq!(name, "contact");
    }

    #[tokio::test]
    async fn blank_contact_email_falls_back_to_account_email_when_privileged() {
        let state = test_state(true).await;
        let owner = seed_user(&state, "finder", "finder@example.com");
        let item = seed_item(&state, &owner, Some("   "));

        let (email, _) = resolve_recipient(&state, &item).await.unwrap();
        assert_eq!(email, "finder@example.com");
    }

    #[tokio::test]
    async fn unprivileged_resolution_requires_contact_email() {
        let state = test_state(false).await;
        let owner = seed_user(&state, "finder", "finder@example.com");
        let item = seed_item(&state, &owner, None);

        let err = resolve_recipient(&state, &item).await.unwrap_err();
        match err {
            ApiError::NotFoundWithHint { message, hint } => {
                assert!(message.contains("Could not find receiver email"));
                assert!(hint.contains("contact email field"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sender_identity_defaults_for_unknown_sender() {
        let state = test_state(false).await;
        let (name, email) = sender_identity(&state, Uuid::new_v4()).await;
        assert_eq!(name, "A Loqta user");
        assert_eq!(email, "someone@loqta.app");
    }

    #[test]
    fn item_link_shape() {
        assert_eq!(
            item_link("https://loqta.app/", "abc"),
            "https://loqta.app/items?itemId=abc"
        );
    }
}
