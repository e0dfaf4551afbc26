use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use planner_shared::{OwnerId, Profile, ProfileUpdate};

use crate::database::{parse_timestamp, to_timestamp, Database};
use crate::error::{Result, StoreError};
use crate::models::Account;

impl Database {
    /// Insert the account, or overwrite its profile if it already exists.
    pub fn upsert_account(&self, owner: &OwnerId, profile: &Profile) -> Result<Account> {
        let now = to_timestamp(&Utc::now());
        self.conn().execute(
            "INSERT INTO accounts (id, name, email, avatar, suggestions_enabled, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                avatar = excluded.avatar,
                suggestions_enabled = excluded.suggestions_enabled,
                updated_at = excluded.updated_at",
            params![
                owner.as_str(),
                profile.name,
                profile.email,
                profile.avatar,
                profile.suggestions_enabled,
                now,
            ],
        )?;
        self.get_account(owner)
    }

    pub fn get_account(&self, owner: &OwnerId) -> Result<Account> {
        self.conn()
            .query_row(
                "SELECT id, name, email, avatar, suggestions_enabled, created_at, updated_at
                 FROM accounts WHERE id = ?1",
                params![owner.as_str()],
                row_to_account,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
    }

    /// Apply a partial profile edit to an existing account.
    pub fn update_account(&self, owner: &OwnerId, update: &ProfileUpdate) -> Result<Account> {
        let mut account = self.get_account(owner)?;
        account.profile.apply(update);
        tracing::debug!(owner = %owner, "account profile updated");
        self.upsert_account(owner, &account.profile)
    }
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    let id: String = row.get(0)?;
    let created_str: String = row.get(5)?;
    let updated_str: String = row.get(6)?;

    Ok(Account {
        id: OwnerId(id),
        profile: Profile {
            name: row.get(1)?,
            email: row.get(2)?,
            avatar: row.get(3)?,
            suggestions_enabled: row.get(4)?,
        },
        created_at: parse_timestamp(5, &created_str)?,
        updated_at: parse_timestamp(6, &updated_str)?,
    })
}
