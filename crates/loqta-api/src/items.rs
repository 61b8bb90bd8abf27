use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use loqta_db::models::{ItemUpdate, NewItem};
use loqta_types::api::{Claims, CreateItemRequest, ItemQuery, UpdateItemRequest};

use crate::auth::AppState;
use crate::convert::item_from_row;
use crate::error::{ApiError, join_err};

/// POST /items — report a lost or found item.
pub async fn create_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".into()));
    }
    if req.location.trim().is_empty() {
        return Err(ApiError::BadRequest("Location is required".into()));
    }
    if let Some(email) = req.contact_email.as_deref() {
        if !email.trim().is_empty() && !loqta_mail::is_valid_email(email) {
            return Err(ApiError::BadRequest("Invalid contact email".into()));
        }
    }

    let item_id = Uuid::new_v4();

    let db_state = state.clone();
    let uid = claims.sub.to_string();
    tokio::task::spawn_blocking(move || {
        let id = item_id.to_string();
        let image_id = req.image_id.map(|id| id.to_string());
        let new_item = NewItem {
            id: &id,
            user_id: &uid,
            title: req.title.trim(),
            description: &req.description,
            category: req.category.as_str(),
            location: req.location.trim(),
            lat: req.lat,
            lng: req.lng,
            date: &req.date,
            image_id: image_id.as_deref(),
            reward: req.reward,
            reward_currency: req.reward_currency.as_deref(),
            handover_location_private: req.handover_location_private.as_deref(),
            contact_email: req.contact_email.as_deref().map(str::trim),
        };
        db_state.db.insert_item(&new_item)
    })
    .await
    .map_err(join_err)??;

    let row = fetch_item(&state, item_id).await?;
    Ok((StatusCode::CREATED, Json(item_from_row(row))))
}

/// GET /items — public browse/search. `q` is free text, `filter` is
/// "all" | "lost" | "found" (anything else behaves as "all").
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = tokio::task::spawn_blocking(move || {
        let category = match query.filter.as_deref() {
            Some("lost") => Some("lost"),
            Some("found") => Some("found"),
            _ => None,
        };
        let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
        state.db.search_items(q, category)
    })
    .await
    .map_err(join_err)??;

    Ok(Json(
        rows.into_iter().map(item_from_row).collect::<Vec<_>>(),
    ))
}

/// GET /items/{id} — public item detail.
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = fetch_item(&state, item_id).await?;
    Ok(Json(item_from_row(row)))
}

/// GET /users/me/items — the caller's own reports.
pub async fn my_items(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = tokio::task::spawn_blocking(move || {
        state.db.items_by_owner(&claims.sub.to_string())
    })
    .await
    .map_err(join_err)??;

    Ok(Json(
        rows.into_iter().map(item_from_row).collect::<Vec<_>>(),
    ))
}

/// PUT /items/{id} — owner-scoped edit of the mutable field set.
pub async fn update_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(item_id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".into()));
    }

    let db_state = state.clone();
    let uid = claims.sub.to_string();
    let changed = tokio::task::spawn_blocking(move || {
        let update = ItemUpdate {
            title: req.title.trim(),
            description: &req.description,
            location: &req.location,
            date: &req.date,
        };
        db_state.db.update_item(&item_id.to_string(), &uid, &update)
    })
    .await
    .map_err(join_err)??;

    if !changed {
        return Err(ApiError::NotFound(
            "Item not found or cannot be edited".into(),
        ));
    }

    let row = fetch_item(&state, item_id).await?;
    Ok(Json(item_from_row(row)))
}

/// DELETE /items/{id} — owner-scoped. Notifications referencing the item
/// go with it (FK cascade); the image file is best-effort cleanup.
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    let iid = item_id.to_string();
    let image_id = tokio::task::spawn_blocking(move || {
        db_state.db.get_item(&iid).map(|row| row.and_then(|r| r.image_id))
    })
    .await
    .map_err(join_err)??;

    let db_state = state.clone();
    let uid = claims.sub.to_string();
    let deleted = tokio::task::spawn_blocking(move || {
        db_state.db.delete_item(&item_id.to_string(), &uid)
    })
    .await
    .map_err(join_err)??;

    if !deleted {
        return Err(ApiError::NotFound(
            "Item not found or cannot be deleted".into(),
        ));
    }

    if let Some(image_id) = image_id {
        if let Err(e) = state.storage.delete(&image_id).await {
            tracing::warn!("Failed to delete image file {}: {}", image_id, e);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn fetch_item(
    state: &AppState,
    item_id: Uuid,
) -> Result<loqta_db::models::ItemRow, ApiError> {
    let db_state = state.clone();
    tokio::task::spawn_blocking(move || db_state.db.get_item(&item_id.to_string()))
        .await
        .map_err(join_err)??
        .ok_or_else(|| ApiError::NotFound("Item not found".into()))
}
