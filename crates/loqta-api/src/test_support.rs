use std::sync::Arc;

use uuid::Uuid;

use loqta_db::Database;
use loqta_db::models::{ItemRow, NewItem};
use loqta_gateway::Dispatcher;
use loqta_mail::ProviderConfig;

use crate::auth::{AppState, AppStateInner};
use crate::storage::Storage;

pub async fn test_state(service_role: bool) -> AppState {
    let dir = std::env::temp_dir().join(format!("loqta-test-{}", Uuid::new_v4()));
    Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "test-secret".into(),
        dispatcher: Dispatcher::new(),
        http: reqwest::Client::new(),
        providers: ProviderConfig::default(),
        storage: Storage::new(dir).await.unwrap(),
        service_role,
        app_url: "https://loqta.app".into(),
    })
}

pub fn seed_user(state: &AppState, username: &str, email: &str) -> String {
    let id = Uuid::new_v4().to_string();
    state
        .db
        .create_user(&id, username, "argon2-hash", email)
        .unwrap();
    id
}

pub fn seed_item(state: &AppState, owner: &str, contact_email: Option<&str>) -> ItemRow {
    let id = Uuid::new_v4().to_string();
    state
        .db
        .insert_item(&NewItem {
            id: &id,
            user_id: owner,
            title: "Black Wallet",
            description: "Leather",
            category: "found",
            location: "Central Station",
            lat: None,
            lng: None,
            date: "2024-06-01",
            image_id: None,
            reward: None,
            reward_currency: None,
            handover_location_private: Some("Locker 12"),
            contact_email,
        })
        .unwrap();
    state.db.get_item(&id).unwrap().unwrap()
}
