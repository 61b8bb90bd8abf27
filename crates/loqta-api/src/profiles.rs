use axum::{Extension, Json, extract::State, response::IntoResponse};

use loqta_types::api::{Claims, UpdateProfileRequest};

use crate::auth::AppState;
use crate::convert::profile_from_row;
use crate::error::{ApiError, join_err};

/// GET /users/me — the caller's own profile. The row is guaranteed to
/// exist: a trigger creates it on signup.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = tokio::task::spawn_blocking(move || state.db.get_profile(&claims.sub.to_string()))
        .await
        .map_err(join_err)??
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    Ok(Json(profile_from_row(row)))
}

/// PUT /users/me — partial update, omitted fields are left untouched.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(email) = req.email.as_deref() {
        if !loqta_mail::is_valid_email(email) {
            return Err(ApiError::BadRequest("Invalid email address".into()));
        }
    }

    let db_state = state.clone();
    let uid = claims.sub.to_string();
    let changed = tokio::task::spawn_blocking(move || {
        db_state.db.update_profile(
            &uid,
            req.full_name.as_deref(),
            req.avatar_url.as_deref(),
            req.email.as_deref().map(str::trim),
        )
    })
    .await
    .map_err(join_err)??;

    if !changed {
        return Err(ApiError::NotFound("Profile not found".into()));
    }

    let row = tokio::task::spawn_blocking(move || state.db.get_profile(&claims.sub.to_string()))
        .await
        .map_err(join_err)??
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    Ok(Json(profile_from_row(row)))
}
