//! Rows as returned by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use planner_shared::{
    Activity, OwnerId, Profile, ScheduleDocument, ScheduleStore, ValidationError, WeekMap,
};

/// A named, owned snapshot of a planner state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSchedule {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub owner: OwnerId,
    pub name: String,
    /// Bank contents at save time.
    pub activities: Vec<Activity>,
    /// Day map at save time.
    pub schedule: WeekMap<Vec<Activity>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavedSchedule {
    pub fn document(&self) -> ScheduleDocument {
        ScheduleDocument {
            activities: self.activities.clone(),
            schedule: self.schedule.clone(),
        }
    }

    /// Load the snapshot back into a working store.
    pub fn into_store(self) -> Result<ScheduleStore, ValidationError> {
        ScheduleStore::from_document(ScheduleDocument {
            activities: self.activities,
            schedule: self.schedule,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: OwnerId,
    #[serde(flatten)]
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
