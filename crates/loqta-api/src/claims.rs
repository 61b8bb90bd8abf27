use axum::{Json, extract::State, response::IntoResponse};
use tracing::{info, warn};
use uuid::Uuid;

use loqta_db::models::{ItemRow, NotificationRow};
use loqta_mail::{Mailer, missing_smtp_vars, templates};
use loqta_types::api::{ClaimRequest, ClaimResponse};
use loqta_types::events::GatewayEvent;
use loqta_types::models::ItemCategory;

use crate::auth::AppState;
use crate::convert::{notification_from_row, parse_id};
use crate::emails::{item_link, resolve_recipient, sender_identity};
use crate::error::{ApiError, join_err};

/// POST /api/claim-item — a user claims a found item (or reports having found
/// a lost one). Persists a notification for the item owner, pushes it over
/// the gateway, then attempts outreach email delivery without blocking the
/// response.
pub async fn claim_item(
    State(state): State<AppState>,
    Json(req): Json<ClaimRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (item_id, user_id) = match (req.item_id, req.user_id) {
        (Some(item_id), Some(user_id)) => (item_id, user_id),
        _ => {
            return Err(ApiError::BadRequest(
                "Item ID and User ID are required".into(),
            ));
        }
    };

    let db_state = state.clone();
    let item = tokio::task::spawn_blocking(move || db_state.db.get_item(&item_id.to_string()))
        .await
        .map_err(join_err)??
        .ok_or_else(|| ApiError::NotFound("Item not found".into()))?;

    let category = ItemCategory::parse(&item.category)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("corrupt category on item {}", item.id)))?;

    if item.user_id == user_id.to_string() {
        return Err(ApiError::BadRequest(self_claim_error(category).into()));
    }

    let message = claim_message(category, &item.title);

    let row = write_notification(&state, &item, user_id, message).await?;

    let notification = notification_from_row(row);
    let receiver = parse_id(&item.user_id, "item user_id");
    state
        .dispatcher
        .send_to_user(receiver, GatewayEvent::NotificationCreate {
            notification: notification.clone(),
        })
        .await;
    info!(
        "Claim on item {} by {}: notification {} delivered to {}",
        item.id, user_id, notification.id, item.user_id
    );

    // Outreach email is best-effort: the notification row is already durable,
    // and a mail failure must not fail the claim.
    spawn_outreach_email(state.clone(), item, category, user_id);

    let (response_message, note) = response_texts(category);
    Ok(Json(ClaimResponse {
        success: true,
        message: response_message.into(),
        note: note.into(),
    }))
}

/// Capability check decides the write path: privileged deployments insert
/// directly, everyone else goes through the guarded insert that re-validates
/// the item and the receiver/sender relationship in SQL.
async fn write_notification(
    state: &AppState,
    item: &ItemRow,
    sender_id: Uuid,
    message: String,
) -> Result<NotificationRow, ApiError> {
    let db_state = state.clone();
    let service_role = state.service_role;
    let item_id = item.id.clone();
    let receiver_id = item.user_id.clone();

    let row = tokio::task::spawn_blocking(move || {
        let id = Uuid::new_v4().to_string();
        let sender = sender_id.to_string();
        if service_role {
            db_state
                .db
                .insert_notification(&id, &receiver_id, &sender, &item_id, &message)
        } else {
            db_state.db.create_notification(&id, &sender, &item_id, &message)
        }
    })
    .await
    .map_err(join_err)??;

    Ok(row)
}

fn claim_message(category: ItemCategory, title: &str) -> String {
    match category {
        ItemCategory::Found => format!("Someone claims they lost the item: {title}"),
        ItemCategory::Lost => format!("Someone says they found your item: {title}"),
    }
}

fn self_claim_error(category: ItemCategory) -> &'static str {
    match category {
        ItemCategory::Found => "You cannot claim your own found item",
        ItemCategory::Lost => "You cannot claim your own lost item",
    }
}

fn response_texts(category: ItemCategory) -> (&'static str, &'static str) {
    match category {
        ItemCategory::Found => (
            "Your claim request has been sent to the finder. Check your notifications to send them an email with the handover location.",
            "Click on the notification to send an email with the handover location to the finder.",
        ),
        ItemCategory::Lost => (
            "The owner has been notified that you found their item.",
            "Click on the notification to send them an email with the details.",
        ),
    }
}

fn spawn_outreach_email(state: AppState, item: ItemRow, category: ItemCategory, sender_id: Uuid) {
    if !missing_smtp_vars().is_empty() {
        return;
    }

    tokio::spawn(async move {
        let recipient = match resolve_recipient(&state, &item).await {
            Ok((email, _name)) => email,
            Err(e) => {
                warn!("Skipping outreach email for item {}: {}", item.id, e);
                return;
            }
        };

        let (sender_name, sender_email) = sender_identity(&state, sender_id).await;
        let link = item_link(&state.app_url, &item.id);
        let content =
            templates::claim_outreach(&sender_name, &sender_email, &item.title, category, &link);

        let mailer = match Mailer::from_env() {
            Ok(mailer) => mailer,
            Err(e) => {
                warn!("SMTP unavailable for outreach email: {}", e);
                return;
            }
        };
        if let Err(e) = mailer
            .send(&recipient, &content.subject, &content.html, &content.text)
            .await
        {
            warn!("Outreach email to {} failed: {}", recipient, e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_item, seed_user, test_state};

    #[tokio::test]
    async fn missing_ids_are_rejected() {
        let state = test_state(false).await;
        match claim_item(
            State(state),
            Json(ClaimRequest {
                item_id: None,
                user_id: Some(Uuid::new_v4()),
            }),
        )
        .await
        {
            Err(ApiError::BadRequest(msg)) => {
                assert_eq!(msg, "Item ID and User ID are required")
            }
            Err(other) => panic!("expected BadRequest, got {other:?}"),
            Ok(_) => panic!("expected BadRequest, got success"),
        }
    }

    #[tokio::test]
    async fn owner_cannot_claim_their_own_item() {
        let state = test_state(false).await;
        let owner = seed_user(&state, "finder", "finder@example.com");
        let item = seed_item(&state, &owner, None);

        match claim_item(
            State(state),
            Json(ClaimRequest {
                item_id: Some(item.id.parse().unwrap()),
                user_id: Some(owner.parse().unwrap()),
            }),
        )
        .await
        {
            Err(ApiError::BadRequest(msg)) => {
                assert_eq!(msg, "You cannot claim your own found item")
            }
            Err(other) => panic!("expected BadRequest, got {other:?}"),
            Ok(_) => panic!("expected BadRequest, got success"),
        }
    }

    #[tokio::test]
    async fn claim_persists_a_notification_for_the_owner() {
        let state = test_state(false).await;
        let owner = seed_user(&state, "finder", "finder@example.com");
        let claimant = seed_user(&state, "owner", "owner@example.com");
        let item = seed_item(&state, &owner, None);

        claim_item(
            State(state.clone()),
            Json(ClaimRequest {
                item_id: Some(item.id.parse().unwrap()),
                user_id: Some(claimant.parse().unwrap()),
            }),
        )
        .await
        .unwrap();

        let rows = state.db.notifications_for(&owner, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].receiver_id, owner);
        assert_eq!(rows[0].sender_id, claimant);
        assert_eq!(rows[0].item_id, item.id);
        assert_eq!(rows[0].message, "Someone claims they lost the item: Black Wallet");
        assert!(!rows[0].read);
    }

    #[test]
    fn message_depends_on_category() {
        assert_eq!(
            claim_message(ItemCategory::Found, "Black Wallet"),
            "Someone claims they lost the item: Black Wallet"
        );
        assert_eq!(
            claim_message(ItemCategory::Lost, "Keys"),
            "Someone says they found your item: Keys"
        );
    }

    #[test]
    fn self_claim_error_names_the_category() {
        assert_eq!(
            self_claim_error(ItemCategory::Found),
            "You cannot claim your own found item"
        );
        assert_eq!(
            self_claim_error(ItemCategory::Lost),
            "You cannot claim your own lost item"
        );
    }
}
