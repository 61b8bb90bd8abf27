use anyhow::Result;
use thiserror::Error;

use crate::Database;
use crate::models::NotificationRow;
use crate::queries::OptionalExt;

/// Structured failure of a notification write: message (Display), a stable
/// code, and a human hint, surfaced verbatim to the caller.
#[derive(Debug, Error)]
pub enum NotifyWriteError {
    #[error("Referenced item does not exist")]
    ItemMissing,

    #[error("Notification receiver and sender must be distinct users")]
    SelfNotification,

    #[error("{0}")]
    Sqlite(String),
}

impl NotifyWriteError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ItemMissing => "item_missing",
            Self::SelfNotification => "self_notification",
            Self::Sqlite(_) => "sqlite_error",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Self::ItemMissing => "The claimed item may have been deleted in the meantime.",
            Self::SelfNotification => "A user cannot notify themselves about their own item.",
            Self::Sqlite(_) => "Check that the receiver, sender, and item all exist.",
        }
    }
}

impl Database {
    /// Guarded insert: a single statement that re-validates the referenced
    /// item and the receiver/sender relationship before writing. The receiver
    /// is taken from the item row itself, so a stale caller-supplied owner id
    /// can never misdirect a notification.
    pub fn create_notification(
        &self,
        id: &str,
        sender_id: &str,
        item_id: &str,
        message: &str,
    ) -> Result<NotificationRow, NotifyWriteError> {
        let inserted = self
            .with_conn_mut(|conn| {
                let n = conn.execute(
                    "INSERT INTO notifications (id, receiver_id, sender_id, item_id, message, read)
                     SELECT ?1, i.user_id, ?2, i.id, ?3, 0
                     FROM items i
                     WHERE i.id = ?4 AND i.user_id != ?2",
                    rusqlite::params![id, sender_id, message, item_id],
                )?;
                Ok(n)
            })
            .map_err(|e| NotifyWriteError::Sqlite(e.to_string()))?;

        if inserted == 0 {
            let item_exists = self
                .with_conn(|conn| {
                    let n: i64 = conn.query_row(
                        "SELECT COUNT(*) FROM items WHERE id = ?1",
                        [item_id],
                        |row| row.get(0),
                    )?;
                    Ok(n)
                })
                .map_err(|e| NotifyWriteError::Sqlite(e.to_string()))?;

            return Err(if item_exists == 0 {
                NotifyWriteError::ItemMissing
            } else {
                NotifyWriteError::SelfNotification
            });
        }

        self.get_notification(id)
            .map_err(|e| NotifyWriteError::Sqlite(e.to_string()))?
            .ok_or_else(|| NotifyWriteError::Sqlite("inserted row not found".into()))
    }

    /// Privileged direct insert: no relationship validation beyond foreign
    /// keys. Only reachable when the service role capability is configured.
    pub fn insert_notification(
        &self,
        id: &str,
        receiver_id: &str,
        sender_id: &str,
        item_id: &str,
        message: &str,
    ) -> Result<NotificationRow, NotifyWriteError> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, receiver_id, sender_id, item_id, message, read)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                rusqlite::params![id, receiver_id, sender_id, item_id, message],
            )?;
            Ok(())
        })
        .map_err(|e| NotifyWriteError::Sqlite(e.to_string()))?;

        self.get_notification(id)
            .map_err(|e| NotifyWriteError::Sqlite(e.to_string()))?
            .ok_or_else(|| NotifyWriteError::Sqlite("inserted row not found".into()))
    }

    pub fn get_notification(&self, id: &str) -> Result<Option<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{NOTIFICATION_SELECT} WHERE id = ?1"))?;
            let row = stmt.query_row([id], read_notification_row).optional()?;
            Ok(row)
        })
    }

    /// Newest-first feed for one receiver.
    pub fn notifications_for(&self, receiver_id: &str, limit: u32) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{NOTIFICATION_SELECT}
                 WHERE receiver_id = ?1
                 ORDER BY created_at DESC, id
                 LIMIT ?2"
            ))?;

            let rows = stmt
                .query_map(rusqlite::params![receiver_id, limit], read_notification_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// One-way unread -> read, scoped to the receiver. Idempotent: marking an
    /// already-read notification succeeds and leaves the row read.
    pub fn mark_notification_read(&self, id: &str, receiver_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET read = 1 WHERE id = ?1 AND receiver_id = ?2",
                [id, receiver_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Marks every unread row for the receiver. Returns how many changed.
    pub fn mark_all_notifications_read(&self, receiver_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET read = 1 WHERE receiver_id = ?1 AND read = 0",
                [receiver_id],
            )?;
            Ok(changed)
        })
    }
}

const NOTIFICATION_SELECT: &str =
    "SELECT id, receiver_id, sender_id, item_id, message, read, created_at
 FROM notifications";

fn read_notification_row(
    row: &rusqlite::Row<'_>,
) -> std::result::Result<NotificationRow, rusqlite::Error> {
    Ok(NotificationRow {
        id: row.get(0)?,
        receiver_id: row.get(1)?,
        sender_id: row.get(2)?,
        item_id: row.get(3)?,
        message: row.get(4)?,
        read: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{report_item, signup};
    use uuid::Uuid;

    fn nid() -> String {
        Uuid::new_v4().to_string()
    }

    #[test]
    fn guarded_insert_targets_the_item_owner() {
        let db = Database::open_in_memory().unwrap();
        let owner = signup(&db, "finder", "finder@example.com");
        let claimant = signup(&db, "seeker", "seeker@example.com");
        let item_id = report_item(&db, &owner, "Black Wallet", "found", "Station", None);

        let row = db
            .create_notification(&nid(), &claimant, &item_id, "Someone claims they lost the item: Black Wallet")
            .unwrap();

        assert_eq!(row.receiver_id, owner);
        assert_eq!(row.sender_id, claimant);
        assert_eq!(row.item_id, item_id);
        assert!(!row.read);
    }

    #[test]
    fn guarded_insert_rejects_self_notification() {
        let db = Database::open_in_memory().unwrap();
        let owner = signup(&db, "finder", "finder@example.com");
        let item_id = report_item(&db, &owner, "Black Wallet", "found", "Station", None);

        let err = db
            .create_notification(&nid(), &owner, &item_id, "msg")
            .unwrap_err();
        assert!(matches!(err, NotifyWriteError::SelfNotification));
        assert_eq!(err.code(), "self_notification");
        assert!(db.notifications_for(&owner, 10).unwrap().is_empty());
    }

    #[test]
    fn guarded_insert_rejects_missing_item() {
        let db = Database::open_in_memory().unwrap();
        let claimant = signup(&db, "seeker", "seeker@example.com");

        let err = db
            .create_notification(&nid(), &claimant, &Uuid::new_v4().to_string(), "msg")
            .unwrap_err();
        assert!(matches!(err, NotifyWriteError::ItemMissing));
    }

    #[test]
    fn repeated_claims_create_repeated_rows() {
        // No dedup key: the duplicate-notification behavior is intentional.
        let db = Database::open_in_memory().unwrap();
        let owner = signup(&db, "finder", "finder@example.com");
        let claimant = signup(&db, "seeker", "seeker@example.com");
        let item_id = report_item(&db, &owner, "Keys", "found", "Park", None);

        db.create_notification(&nid(), &claimant, &item_id, "msg").unwrap();
        db.create_notification(&nid(), &claimant, &item_id, "msg").unwrap();

        assert_eq!(db.notifications_for(&owner, 10).unwrap().len(), 2);
    }

    #[test]
    fn mark_read_is_idempotent_and_receiver_scoped() {
        let db = Database::open_in_memory().unwrap();
        let owner = signup(&db, "finder", "finder@example.com");
        let claimant = signup(&db, "seeker", "seeker@example.com");
        let item_id = report_item(&db, &owner, "Keys", "found", "Park", None);
        let row = db.create_notification(&nid(), &claimant, &item_id, "msg").unwrap();

        // The sender cannot mark the receiver's notification.
        assert!(!db.mark_notification_read(&row.id, &claimant).unwrap());

        assert!(db.mark_notification_read(&row.id, &owner).unwrap());
        assert!(db.mark_notification_read(&row.id, &owner).unwrap());

        let rows = db.notifications_for(&owner, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].read);
    }

    #[test]
    fn mark_all_read_only_touches_unread() {
        let db = Database::open_in_memory().unwrap();
        let owner = signup(&db, "finder", "finder@example.com");
        let claimant = signup(&db, "seeker", "seeker@example.com");
        let item_id = report_item(&db, &owner, "Keys", "found", "Park", None);

        let first = db.create_notification(&nid(), &claimant, &item_id, "one").unwrap();
        db.create_notification(&nid(), &claimant, &item_id, "two").unwrap();
        db.mark_notification_read(&first.id, &owner).unwrap();

        assert_eq!(db.mark_all_notifications_read(&owner).unwrap(), 1);
        assert_eq!(db.mark_all_notifications_read(&owner).unwrap(), 0);
    }
}
