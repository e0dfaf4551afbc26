use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use planner_shared::{OwnerId, ScheduleDocument, ScheduleStore, ValidationError};

use crate::database::{parse_timestamp, to_timestamp, Database};
use crate::error::{Result, StoreError};
use crate::models::SavedSchedule;

const SELECT_COLUMNS: &str =
    "SELECT id, owner_id, name, activities, schedule, created_at, updated_at FROM schedules";

impl Database {
    pub fn create_schedule(
        &self,
        owner: &OwnerId,
        name: &str,
        document: &ScheduleDocument,
    ) -> Result<SavedSchedule> {
        let name = checked_name(name)?;
        let (activities, schedule) = encode_document(document)?;
        let id = Uuid::new_v4();
        let now = to_timestamp(&Utc::now());

        self.conn().execute(
            "INSERT INTO schedules (id, owner_id, name, activities, schedule, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![id.to_string(), owner.as_str(), name, activities, schedule, now],
        )?;

        tracing::debug!(%id, owner = %owner, "schedule created");
        self.get_schedule(id, owner)
    }

    /// Overwrite a saved schedule with the current planner state.
    pub fn update_schedule(
        &self,
        id: Uuid,
        owner: &OwnerId,
        name: &str,
        document: &ScheduleDocument,
    ) -> Result<SavedSchedule> {
        let name = checked_name(name)?;
        let (activities, schedule) = encode_document(document)?;
        let now = to_timestamp(&Utc::now());

        let affected = self.conn().execute(
            "UPDATE schedules SET name = ?1, activities = ?2, schedule = ?3, updated_at = ?4
             WHERE id = ?5 AND owner_id = ?6",
            params![name, activities, schedule, now, id.to_string(), owner.as_str()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        tracing::debug!(%id, owner = %owner, "schedule updated");
        self.get_schedule(id, owner)
    }

    pub fn get_schedule(&self, id: Uuid, owner: &OwnerId) -> Result<SavedSchedule> {
        self.conn()
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1 AND owner_id = ?2"),
                params![id.to_string(), owner.as_str()],
                row_to_schedule,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
    }

    /// All schedules of `owner`, most recently saved first.
    pub fn list_schedules(&self, owner: &OwnerId) -> Result<Vec<SavedSchedule>> {
        let mut stmt = self.conn().prepare(&format!(
            "{SELECT_COLUMNS} WHERE owner_id = ?1 ORDER BY updated_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map(params![owner.as_str()], row_to_schedule)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// `false` when there was nothing of `owner`'s to delete.
    pub fn delete_schedule(&self, id: Uuid, owner: &OwnerId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM schedules WHERE id = ?1 AND owner_id = ?2",
            params![id.to_string(), owner.as_str()],
        )?;
        Ok(affected > 0)
    }
}

fn checked_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingScheduleName.into());
    }
    Ok(trimmed)
}

/// Validate the document and return its two JSON columns. Placed instances
/// are stored narrowed to the day they sit on.
fn encode_document(document: &ScheduleDocument) -> Result<(String, String)> {
    let normalized = ScheduleStore::from_document(document.clone())?.to_document();
    Ok((
        serde_json::to_string(&normalized.activities)?,
        serde_json::to_string(&normalized.schedule)?,
    ))
}

fn row_to_schedule(row: &rusqlite::Row<'_>) -> rusqlite::Result<SavedSchedule> {
    let id_str: String = row.get(0)?;
    let owner: String = row.get(1)?;
    let name: String = row.get(2)?;
    let activities_json: String = row.get(3)?;
    let schedule_json: String = row.get(4)?;
    let created_str: String = row.get(5)?;
    let updated_str: String = row.get(6)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion_failure(0, e))?;
    let activities = serde_json::from_str(&activities_json).map_err(|e| conversion_failure(3, e))?;
    let schedule = serde_json::from_str(&schedule_json).map_err(|e| conversion_failure(4, e))?;

    Ok(SavedSchedule {
        id,
        owner: OwnerId(owner),
        name,
        activities,
        schedule,
        created_at: parse_timestamp(5, &created_str)?,
        updated_at: parse_timestamp(6, &updated_str)?,
    })
}

fn conversion_failure<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}
