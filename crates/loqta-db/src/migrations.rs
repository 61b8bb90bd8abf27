use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id          TEXT PRIMARY KEY REFERENCES users(id),
            full_name   TEXT,
            avatar_url  TEXT,
            email       TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Profile rows are created by trigger on signup, never by handlers.
        CREATE TRIGGER IF NOT EXISTS trg_profile_on_signup
            AFTER INSERT ON users
        BEGIN
            INSERT INTO profiles (id, email) VALUES (NEW.id, NEW.email);
        END;

        CREATE TABLE IF NOT EXISTS items (
            id                          TEXT PRIMARY KEY,
            user_id                     TEXT NOT NULL REFERENCES users(id),
            title                       TEXT NOT NULL,
            description                 TEXT NOT NULL,
            category                    TEXT NOT NULL CHECK (category IN ('lost', 'found')),
            location                    TEXT NOT NULL,
            lat                         REAL,
            lng                         REAL,
            date                        TEXT NOT NULL,
            image_id                    TEXT,
            reward                      REAL,
            reward_currency             TEXT,
            handover_location_private   TEXT,
            contact_email               TEXT,
            created_at                  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_items_owner
            ON items(user_id, created_at);

        CREATE TABLE IF NOT EXISTS notifications (
            id          TEXT PRIMARY KEY,
            receiver_id TEXT NOT NULL REFERENCES users(id),
            sender_id   TEXT NOT NULL REFERENCES users(id),
            item_id     TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            message     TEXT NOT NULL,
            read        INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_receiver
            ON notifications(receiver_id, created_at);

        CREATE TABLE IF NOT EXISTS images (
            id              TEXT PRIMARY KEY,
            owner_id        TEXT NOT NULL REFERENCES users(id),
            content_type    TEXT NOT NULL,
            size            INTEGER NOT NULL,
            sha256          TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
