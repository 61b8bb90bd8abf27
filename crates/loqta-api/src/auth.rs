use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use loqta_db::Database;
use loqta_gateway::Dispatcher;
use loqta_mail::{ProviderConfig, is_valid_email};
use loqta_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::{ApiError, join_err};
use crate::storage::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub dispatcher: Dispatcher,
    pub http: reqwest::Client,
    pub providers: ProviderConfig,
    pub storage: Storage,
    /// Privileged deployments may write notifications directly and read user
    /// emails as a fallback recipient source. Off by default.
    pub service_role: bool,
    /// Public base URL used for deep links in outgoing emails.
    pub app_url: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::BadRequest(
            "Username must be between 3 and 32 characters".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }
    if !is_valid_email(&req.email) {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }

    // Argon2 hashing is deliberately slow and rusqlite blocks; keep both off
    // the async runtime like every other handler.
    let db_state = state.clone();
    let username = req.username.clone();
    let user_id = tokio::task::spawn_blocking(move || {
        if db_state
            .db
            .get_user_by_username(&req.username)?
            .is_some()
        {
            return Err(ApiError::Conflict("Username is already taken".into()));
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?
            .to_string();

        let user_id = Uuid::new_v4();

        // The profiles row is created by a trigger on this insert.
        db_state.db.create_user(
            &user_id.to_string(),
            &req.username,
            &password_hash,
            req.email.trim(),
        )?;

        Ok::<_, ApiError>(user_id)
    })
    .await
    .map_err(join_err)??;

    let token = create_token(&state.jwt_secret, user_id, &username)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    let user = tokio::task::spawn_blocking(move || {
        let user = db_state
            .db
            .get_user_by_username(&req.username)?
            .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".into()))?;

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash is corrupt: {e}")))?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::Unauthorized("Invalid username or password".into()))?;

        Ok::<_, ApiError>(user)
    })
    .await
    .map_err(join_err)??;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored user id is corrupt: {e}")))?;

    let token = create_token(&state.jwt_secret, user_id, &user.username)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token encoding failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    async fn do_register(state: &AppState, username: &str) -> Result<StatusCode, ApiError> {
        register(
            State(state.clone()),
            Json(RegisterRequest {
                username: username.into(),
                password: "correct horse battery".into(),
                email: format!("{username}@example.com"),
            }),
        )
        .await
        .map(|res| res.into_response().status())
    }

    #[tokio::test]
    async fn register_hashes_password_and_triggers_profile() {
        let state = test_state(false).await;
        assert_eq!(do_register(&state, "finder").await.unwrap(), StatusCode::CREATED);

        let user = state
            .db
            .get_user_by_username("finder")
            .unwrap()
            .expect("user row");
        assert_ne!(user.password, "correct horse battery");

        let profile = state.db.get_profile(&user.id).unwrap().expect("profile row");
        assert_eq!(profile.email.as_deref(), Some("finder@example.com"));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let state = test_state(false).await;
        do_register(&state, "finder").await.unwrap();

        let err = do_register(&state, "finder").await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_verifies_the_password() {
        let state = test_state(false).await;
        do_register(&state, "finder").await.unwrap();

        match login(
            State(state.clone()),
            Json(LoginRequest {
                username: "finder".into(),
                password: "wrong password".into(),
            }),
        )
        .await
        {
            Err(ApiError::Unauthorized(_)) => {}
            Err(other) => panic!("expected Unauthorized, got {other:?}"),
            Ok(_) => panic!("expected Unauthorized, got success"),
        }

        let res = login(
            State(state),
            Json(LoginRequest {
                username: "finder".into(),
                password: "correct horse battery".into(),
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
