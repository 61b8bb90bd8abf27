use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use loqta_types::api::{Claims, NotificationQuery};
use loqta_types::events::GatewayEvent;

use crate::auth::AppState;
use crate::convert::notification_from_row;
use crate::error::{ApiError, join_err};

/// GET /notifications — the caller's feed, newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<NotificationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.min(200);
    let rows = tokio::task::spawn_blocking(move || {
        state.db.notifications_for(&claims.sub.to_string(), limit)
    })
    .await
    .map_err(join_err)??;

    Ok(Json(
        rows.into_iter().map(notification_from_row).collect::<Vec<_>>(),
    ))
}

/// POST /notifications/{id}/read — one-way unread -> read. Idempotent.
/// Other connected devices of the same user get a NotificationRead event so
/// their unread badges stay in sync.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    let changed = tokio::task::spawn_blocking(move || {
        db_state
            .db
            .mark_notification_read(&notification_id.to_string(), &claims.sub.to_string())
    })
    .await
    .map_err(join_err)??;

    if !changed {
        return Err(ApiError::NotFound("Notification not found".into()));
    }

    state
        .dispatcher
        .send_to_user(
            claims.sub,
            GatewayEvent::NotificationRead {
                notification_id: Some(notification_id),
                all: false,
            },
        )
        .await;

    Ok(Json(json!({ "success": true })))
}

/// POST /notifications/read-all — marks every unread row for the caller.
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    let changed = tokio::task::spawn_blocking(move || {
        db_state
            .db
            .mark_all_notifications_read(&claims.sub.to_string())
    })
    .await
    .map_err(join_err)??;

    state
        .dispatcher
        .send_to_user(
            claims.sub,
            GatewayEvent::NotificationRead {
                notification_id: None,
                all: true,
            },
        )
        .await;

    Ok(Json(json!({ "success": true, "updated": changed })))
}
