use crate::Database;
use crate::models::NewItem;
use uuid::Uuid;

pub fn signup(db: &Database, username: &str, email: &str) -> String {
    let id = Uuid::new_v4().to_string();
    db.create_user(&id, username, "argon2-hash-placeholder", email)
        .unwrap();
    id
}

pub fn report_item(
    db: &Database,
    user_id: &str,
    title: &str,
    category: &str,
    location: &str,
    contact_email: Option<&str>,
) -> String {
    let id = Uuid::new_v4().to_string();
    db.insert_item(&NewItem {
        id: &id,
        user_id,
        title,
        description: "test item",
        category,
        location,
        lat: None,
        lng: None,
        date: "2024-06-01",
        image_id: None,
        reward: None,
        reward_currency: None,
        handover_location_private: None,
        contact_email,
    })
    .unwrap();
    id
}
