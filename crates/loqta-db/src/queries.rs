use crate::Database;
use crate::models::{ImageRow, ItemRow, ItemUpdate, NewItem, ProfileRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        email: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, email) VALUES (?1, ?2, ?3, ?4)",
                (id, username, password_hash, email),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Profiles --

    pub fn get_profile(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, full_name, avatar_url, email, created_at FROM profiles WHERE id = ?1",
            )?;

            let row = stmt
                .query_row([id], |row| {
                    Ok(ProfileRow {
                        id: row.get(0)?,
                        full_name: row.get(1)?,
                        avatar_url: row.get(2)?,
                        email: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    /// Partial update: None leaves the stored value untouched.
    pub fn update_profile(
        &self,
        id: &str,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE profiles SET
                    full_name  = COALESCE(?2, full_name),
                    avatar_url = COALESCE(?3, avatar_url),
                    email      = COALESCE(?4, email)
                 WHERE id = ?1",
                rusqlite::params![id, full_name, avatar_url, email],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Items --

    pub fn insert_item(&self, item: &NewItem<'_>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO items (id, user_id, title, description, category, location,
                                    lat, lng, date, image_id, reward, reward_currency,
                                    handover_location_private, contact_email)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                rusqlite::params![
                    item.id,
                    item.user_id,
                    item.title,
                    item.description,
                    item.category,
                    item.location,
                    item.lat,
                    item.lng,
                    item.date,
                    item.image_id,
                    item.reward,
                    item.reward_currency,
                    item.handover_location_private,
                    item.contact_email,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_item(&self, id: &str) -> Result<Option<ItemRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{ITEM_SELECT} WHERE id = ?1"))?;
            let row = stmt.query_row([id], read_item_row).optional()?;
            Ok(row)
        })
    }

    /// Browse/search: `category` narrows to lost or found, `q` is a
    /// case-insensitive substring match over title, category, and location.
    pub fn search_items(&self, q: Option<&str>, category: Option<&str>) -> Result<Vec<ItemRow>> {
        let pattern = q.map(|q| format!("%{}%", q.to_lowercase()));

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{ITEM_SELECT}
                 WHERE (?1 IS NULL OR category = ?1)
                   AND (?2 IS NULL
                        OR lower(title) LIKE ?2
                        OR lower(category) LIKE ?2
                        OR lower(location) LIKE ?2)
                 ORDER BY created_at DESC"
            ))?;

            let rows = stmt
                .query_map(rusqlite::params![category, pattern], read_item_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn items_by_owner(&self, user_id: &str) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{ITEM_SELECT} WHERE user_id = ?1 ORDER BY created_at DESC"
            ))?;

            let rows = stmt
                .query_map([user_id], read_item_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Owner-scoped edit. Returns false when the row does not exist or
    /// belongs to someone else.
    pub fn update_item(&self, id: &str, user_id: &str, update: &ItemUpdate<'_>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE items SET title = ?3, description = ?4, location = ?5, date = ?6
                 WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![
                    id,
                    user_id,
                    update.title,
                    update.description,
                    update.location,
                    update.date
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Owner-scoped delete. Returns false when nothing was deleted.
    pub fn delete_item(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM items WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )?;
            Ok(deleted > 0)
        })
    }

    // -- Images --

    pub fn insert_image(
        &self,
        id: &str,
        owner_id: &str,
        content_type: &str,
        size: i64,
        sha256: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO images (id, owner_id, content_type, size, sha256)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, owner_id, content_type, size, sha256],
            )?;
            Ok(())
        })
    }

    pub fn get_image(&self, id: &str) -> Result<Option<ImageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, content_type, size, sha256, created_at
                 FROM images WHERE id = ?1",
            )?;

            let row = stmt
                .query_row([id], |row| {
                    Ok(ImageRow {
                        id: row.get(0)?,
                        owner_id: row.get(1)?,
                        content_type: row.get(2)?,
                        size: row.get(3)?,
                        sha256: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }
}

const ITEM_SELECT: &str = "SELECT id, user_id, title, description, category, location,
        lat, lng, date, image_id, reward, reward_currency,
        handover_location_private, contact_email, created_at
 FROM items";

fn read_item_row(row: &rusqlite::Row<'_>) -> std::result::Result<ItemRow, rusqlite::Error> {
    Ok(ItemRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        location: row.get(5)?,
        lat: row.get(6)?,
        lng: row.get(7)?,
        date: row.get(8)?,
        image_id: row.get(9)?,
        reward: row.get(10)?,
        reward_currency: row.get(11)?,
        handover_location_private: row.get(12)?,
        contact_email: row.get(13)?,
        created_at: row.get(14)?,
    })
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, password, email, created_at FROM users WHERE {column} = ?1"
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                email: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{report_item, signup};

    #[test]
    fn signup_trigger_creates_profile() {
        let db = Database::open_in_memory().unwrap();
        let uid = signup(&db, "finder", "finder@example.com");

        let profile = db.get_profile(&uid).unwrap().expect("profile row");
        assert_eq!(profile.email.as_deref(), Some("finder@example.com"));
        assert!(profile.full_name.is_none());
    }

    #[test]
    fn search_matches_title_category_and_location() {
        let db = Database::open_in_memory().unwrap();
        let uid = signup(&db, "finder", "finder@example.com");
        report_item(&db, &uid, "Black Wallet", "found", "Central Station", None);
        report_item(&db, &uid, "Umbrella", "lost", "Old Town", None);

        assert_eq!(db.search_items(Some("wallet"), None).unwrap().len(), 1);
        assert_eq!(db.search_items(Some("LOST"), None).unwrap().len(), 1);
        assert_eq!(db.search_items(Some("town"), None).unwrap().len(), 1);
        assert_eq!(db.search_items(None, Some("found")).unwrap().len(), 1);
        assert_eq!(db.search_items(None, None).unwrap().len(), 2);
        assert!(db.search_items(Some("bicycle"), None).unwrap().is_empty());
    }

    #[test]
    fn item_mutations_are_owner_scoped() {
        let db = Database::open_in_memory().unwrap();
        let owner = signup(&db, "owner", "owner@example.com");
        let other = signup(&db, "other", "other@example.com");
        let item_id = report_item(&db, &owner, "Keys", "lost", "Park", None);

        let update = ItemUpdate {
            title: "House Keys",
            description: "Bundle of three keys",
            location: "City Park",
            date: "2024-06-01",
        };
        assert!(!db.update_item(&item_id, &other, &update).unwrap());
        assert!(db.update_item(&item_id, &owner, &update).unwrap());
        assert_eq!(db.get_item(&item_id).unwrap().unwrap().title, "House Keys");

        assert!(!db.delete_item(&item_id, &other).unwrap());
        assert!(db.delete_item(&item_id, &owner).unwrap());
        assert!(db.get_item(&item_id).unwrap().is_none());
    }
}
