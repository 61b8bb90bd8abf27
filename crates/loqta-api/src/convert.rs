use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use loqta_db::models::{ItemRow, NotificationRow, ProfileRow};
use loqta_types::models::{Item, ItemCategory, Notification, Profile};

/// Row-to-model conversions. The DB layer hands out strings; anything corrupt
/// gets a warning and a default rather than a 500 — a single bad row must not
/// take down a whole listing.

pub fn parse_id(raw: &str, context: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}' ({}): {}", raw, context, e);
        Uuid::default()
    })
}

pub fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' ({}): {}", raw, context, e);
            DateTime::default()
        })
}

pub fn item_from_row(row: ItemRow) -> Item {
    Item {
        id: parse_id(&row.id, "item id"),
        user_id: parse_id(&row.user_id, "item user_id"),
        category: ItemCategory::parse(&row.category).unwrap_or_else(|| {
            warn!("Corrupt category '{}' on item '{}'", row.category, row.id);
            ItemCategory::Lost
        }),
        title: row.title,
        description: row.description,
        location: row.location,
        lat: row.lat,
        lng: row.lng,
        date: row.date,
        image_id: row.image_id.as_deref().map(|id| parse_id(id, "item image_id")),
        reward: row.reward,
        reward_currency: row.reward_currency,
        contact_email: row.contact_email,
        created_at: parse_timestamp(&row.created_at, "item created_at"),
    }
}

pub fn notification_from_row(row: NotificationRow) -> Notification {
    Notification {
        id: parse_id(&row.id, "notification id"),
        receiver_id: parse_id(&row.receiver_id, "notification receiver_id"),
        sender_id: parse_id(&row.sender_id, "notification sender_id"),
        item_id: parse_id(&row.item_id, "notification item_id"),
        message: row.message,
        read: row.read,
        created_at: parse_timestamp(&row.created_at, "notification created_at"),
    }
}

pub fn profile_from_row(row: ProfileRow) -> Profile {
    Profile {
        id: parse_id(&row.id, "profile id"),
        full_name: row.full_name,
        avatar_url: row.avatar_url,
        email: row.email,
        created_at: parse_timestamp(&row.created_at, "profile created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_naive_timestamps_parse_as_utc() {
        let ts = parse_timestamp("2024-06-01 12:30:00", "test");
        assert_eq!(ts.to_rfc3339(), "2024-06-01T12:30:00+00:00");
    }

    #[test]
    fn rfc3339_timestamps_parse_directly() {
        let ts = parse_timestamp("2024-06-01T12:30:00Z", "test");
        assert_eq!(ts.timestamp(), 1717245000);
    }
}
