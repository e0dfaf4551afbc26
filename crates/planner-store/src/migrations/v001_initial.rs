//! v001 -- Initial schema creation.
//!
//! Creates `accounts` and `schedules`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Accounts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    id                  TEXT PRIMARY KEY NOT NULL,  -- identity-provider key
    name                TEXT NOT NULL,
    email               TEXT NOT NULL,
    avatar              TEXT,
    suggestions_enabled INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,              -- RFC-3339, UTC, micros
    updated_at          TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Saved schedules
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS schedules (
    id          TEXT PRIMARY KEY NOT NULL,          -- UUID v4
    owner_id    TEXT NOT NULL,
    name        TEXT NOT NULL,
    activities  TEXT NOT NULL,                      -- JSON array (bank)
    schedule    TEXT NOT NULL,                      -- JSON object (day map)
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_schedules_owner_updated
    ON schedules(owner_id, updated_at DESC);
"#;

/// Apply the initial schema.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
