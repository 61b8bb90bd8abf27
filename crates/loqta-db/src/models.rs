/// Database row types — these map directly to SQLite rows.
/// Distinct from loqta-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub created_at: String,
}

pub struct ProfileRow {
    pub id: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub created_at: String,
}

pub struct ItemRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub date: String,
    pub image_id: Option<String>,
    pub reward: Option<f64>,
    pub reward_currency: Option<String>,
    pub handover_location_private: Option<String>,
    pub contact_email: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct NotificationRow {
    pub id: String,
    pub receiver_id: String,
    pub sender_id: String,
    pub item_id: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
}

pub struct ImageRow {
    pub id: String,
    pub owner_id: String,
    pub content_type: String,
    pub size: i64,
    pub sha256: String,
    pub created_at: String,
}

/// Fields accepted by the item edit modal.
pub struct ItemUpdate<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub date: &'a str,
}

/// Everything needed to insert a new report.
pub struct NewItem<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub location: &'a str,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub date: &'a str,
    pub image_id: Option<&'a str>,
    pub reward: Option<f64>,
    pub reward_currency: Option<&'a str>,
    pub handover_location_private: Option<&'a str>,
    pub contact_email: Option<&'a str>,
}
