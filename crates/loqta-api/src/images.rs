use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use loqta_types::api::Claims;

use crate::auth::AppState;
use crate::error::{ApiError, join_err};

/// 10 MB upload limit for item photos.
const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

#[derive(Serialize)]
pub struct UploadResponse {
    pub image_id: Uuid,
    pub size: u64,
}

/// POST /images — accepts raw image bytes, saves to the storage dir,
/// inserts the metadata row, returns { image_id, size }.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Empty upload".into()));
    }
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ApiError::BadRequest("Image exceeds the 10 MB limit".into()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unsupported content type '{content_type}'"
        )));
    }

    let image_id = Uuid::new_v4();
    let size = bytes.len() as i64;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let sha256 = hex::encode(hasher.finalize());

    state
        .storage
        .write(&image_id.to_string(), &bytes)
        .await
        .map_err(ApiError::Internal)?;

    let db_state = state.clone();
    let iid = image_id.to_string();
    let uid = claims.sub.to_string();
    tokio::task::spawn_blocking(move || {
        db_state
            .db
            .insert_image(&iid, &uid, &content_type, size, &sha256)
    })
    .await
    .map_err(join_err)??;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            image_id,
            size: size as u64,
        }),
    ))
}

/// GET /images/{image_id} — public: item photos render on the browse page
/// without a session.
pub async fn serve_image(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Must be a valid UUID to prevent path traversal into the storage dir.
    image_id
        .parse::<Uuid>()
        .map_err(|_| ApiError::BadRequest("Invalid image id".into()))?;

    let db_state = state.clone();
    let iid = image_id.clone();
    let row = tokio::task::spawn_blocking(move || db_state.db.get_image(&iid))
        .await
        .map_err(join_err)??
        .ok_or_else(|| ApiError::NotFound("Image not found".into()))?;

    let bytes = state
        .storage
        .read(&image_id)
        .await
        .map_err(|_| ApiError::NotFound("Image not found".into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, row.content_type),
            (header::ETAG, format!("\"{}\"", row.sha256)),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
        ],
        bytes,
    ))
}
