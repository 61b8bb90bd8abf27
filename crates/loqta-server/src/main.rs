use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use loqta_api::auth::{self, AppState, AppStateInner};
use loqta_api::middleware::require_auth;
use loqta_api::storage::Storage;
use loqta_api::{claims, emails, images, items, notifications, profiles};
use loqta_gateway::Dispatcher;
use loqta_gateway::connection;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loqta=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("LOQTA_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("LOQTA_DB_PATH").unwrap_or_else(|_| "loqta.db".into());
    let host = std::env::var("LOQTA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("LOQTA_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let storage_dir = std::env::var("LOQTA_STORAGE_DIR").unwrap_or_else(|_| "uploads".into());
    let app_url =
        std::env::var("LOQTA_APP_URL").unwrap_or_else(|_| "https://loqta.app".into());
    let service_role = std::env::var("LOQTA_SERVICE_ROLE")
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false);

    // Init database and image storage
    let db = loqta_db::Database::open(&PathBuf::from(&db_path))?;
    let storage = Storage::new(PathBuf::from(storage_dir)).await?;

    // Shared state
    let dispatcher = Dispatcher::new();
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: jwt_secret.clone(),
        dispatcher,
        http: reqwest::Client::new(),
        providers: loqta_mail::ProviderConfig::from_env(),
        storage,
        service_role,
        app_url,
    });

    if service_role {
        info!("Service role capability enabled");
    }

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/items", get(items::list_items))
        .route("/items/{id}", get(items::get_item))
        .route("/images/{id}", get(images::serve_image))
        .route("/api/claim-item", post(claims::claim_item))
        .route("/api/send-email", post(emails::send_email))
        .route("/api/send-notification-email", post(emails::send_notification_email))
        .route("/api/test-email", post(emails::test_email).get(emails::test_email_status));

    let protected_routes = Router::new()
        .route("/items", post(items::create_item))
        .route("/items/{id}", put(items::update_item))
        .route("/items/{id}", delete(items::delete_item))
        .route("/images", post(images::upload_image))
        .route("/users/me", get(profiles::get_profile))
        .route("/users/me", put(profiles::update_profile))
        .route("/users/me/items", get(items::my_items))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .layer(middleware::from_fn(require_auth));

    let ws_route = Router::new().route("/gateway", get(ws_upgrade));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Loqta server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Deserialize)]
struct GatewayQuery {
    token: Option<String>,
}

/// WebSocket upgrade. `?token=` authenticates at the HTTP layer; without it
/// the client must send an Identify command as its first frame.
async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<GatewayQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    let jwt_secret = state.jwt_secret.clone();

    let pre_auth = query
        .token
        .as_deref()
        .and_then(|token| connection::decode_token(token, &jwt_secret));

    ws.on_upgrade(move |socket| async move {
        match pre_auth {
            Some((user_id, username)) => {
                connection::handle_connection_authenticated(socket, dispatcher, user_id, username)
                    .await
            }
            None => connection::handle_connection(socket, dispatcher, jwt_secret).await,
        }
    })
}
