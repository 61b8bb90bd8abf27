use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ItemCategory;

// -- JWT Claims --

/// JWT claims shared between loqta-api (REST middleware) and loqta-gateway
/// (WebSocket authentication). Canonical definition lives here in loqta-types
/// to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Profiles --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
}

// -- Items --

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub title: String,
    pub description: String,
    pub category: ItemCategory,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub date: String,
    pub image_id: Option<Uuid>,
    pub reward: Option<f64>,
    pub reward_currency: Option<String>,
    pub handover_location_private: Option<String>,
    pub contact_email: Option<String>,
}

/// Field set of the edit modal: everything else on an item is immutable
/// after creation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateItemRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    /// Free-text search over title, category, and location.
    #[serde(default)]
    pub q: Option<String>,
    /// "all" | "lost" | "found"
    #[serde(default)]
    pub filter: Option<String>,
}

// -- Claim / email endpoints --
// These keep the original wire shape: camelCase keys, ids in the body.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub item_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub message: String,
    pub note: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub item_id: Option<Uuid>,
    pub item_title: Option<String>,
    pub item_type: Option<ItemCategory>,
    pub contact_email: Option<String>,
    pub sender_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEmailRequest {
    pub notification_id: Option<Uuid>,
    pub receiver_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TestEmailRequest {
    pub to: Option<String>,
}

// -- Notifications --

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default = "default_notification_limit")]
    pub limit: u32,
}

fn default_notification_limit() -> u32 {
    50
}
