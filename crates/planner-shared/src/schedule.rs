//! The in-memory Schedule Store.
//!
//! A [`ScheduleStore`] partitions the activities a user is working with into
//! the *bank* (unplaced activities) and the seven calendar days (placed
//! instances). Every id lives in exactly one of the two: either a single bank
//! entry, or one or more placed instances spread across days.
//!
//! Mutations referencing an id that is not where the operation expects it are
//! reported as [`Mutation::NotFound`] and leave the store untouched. They are
//! never errors: callers only issue them from state they are displaying.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activity::{Activity, ActivityDraft, ActivityId};
use crate::conflicts::{self, Suggestion};
use crate::error::ValidationError;
use crate::weekday::{WeekMap, Weekday};

/// Outcome of a store mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    NotFound,
}

impl Mutation {
    pub fn is_applied(self) -> bool {
        self == Mutation::Applied
    }
}

/// Where an activity id currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Bank,
    /// Days carrying at least one placed instance with the id.
    Placed(BTreeSet<Weekday>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleStore {
    bank: Vec<Activity>,
    week: WeekMap<Vec<Activity>>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn bank(&self) -> &[Activity] {
        &self.bank
    }

    /// Placed instances on `day` in display order.
    pub fn day(&self, day: Weekday) -> &[Activity] {
        &self.week[day]
    }

    pub fn week(&self) -> &WeekMap<Vec<Activity>> {
        &self.week
    }

    pub fn location(&self, id: &ActivityId) -> Option<Location> {
        if self.bank.iter().any(|a| &a.id == id) {
            return Some(Location::Bank);
        }
        let days = self.placed_days(id);
        (!days.is_empty()).then_some(Location::Placed(days))
    }

    fn placed_days(&self, id: &ActivityId) -> BTreeSet<Weekday> {
        self.week
            .iter()
            .filter(|(_, instances)| instances.iter().any(|a| &a.id == id))
            .map(|(day, _)| day)
            .collect()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Validate form input and append the new activity to the bank.
    pub fn add(&mut self, draft: ActivityDraft) -> Result<ActivityId, ValidationError> {
        let activity = Activity::from_draft(ActivityId::new(), draft)?;
        let id = activity.id.clone();
        debug!(id = %id, name = %activity.name, "activity added to bank");
        self.bank.push(activity);
        Ok(id)
    }

    /// Move a bank activity onto every day it recurs on.
    pub fn place(&mut self, id: &ActivityId) -> Mutation {
        let Some(pos) = self.bank.iter().position(|a| &a.id == id) else {
            return Mutation::NotFound;
        };
        let activity = self.bank.remove(pos);
        self.place_instances(&activity);
        debug!(id = %id, days = activity.days.len(), "activity placed");
        Mutation::Applied
    }

    /// Pull every placed instance of `id` back into a single bank entry whose
    /// days are exactly the days it was found on.
    pub fn unplace(&mut self, id: &ActivityId) -> Mutation {
        let days = self.placed_days(id);
        let Some(first_day) = days.first().copied() else {
            return Mutation::NotFound;
        };

        let Some(template) = self.week[first_day].iter().find(|a| &a.id == id).cloned() else {
            return Mutation::NotFound;
        };
        self.remove_instances(id);

        debug!(id = %id, days = days.len(), "activity returned to bank");
        self.bank.push(Activity { days, ..template });
        Mutation::Applied
    }

    /// Replace an activity with its edited version.
    ///
    /// A bank entry is replaced in place. A placed activity has all of its
    /// instances dropped and re-placed from the edited day list, so adding or
    /// removing days adds or removes calendar placements; the bank is not
    /// touched.
    pub fn edit(&mut self, activity: Activity) -> Result<Mutation, ValidationError> {
        activity.validate()?;

        if let Some(slot) = self.bank.iter_mut().find(|a| a.id == activity.id) {
            debug!(id = %activity.id, "bank activity edited");
            *slot = activity;
            return Ok(Mutation::Applied);
        }

        if self.placed_days(&activity.id).is_empty() {
            return Ok(Mutation::NotFound);
        }

        self.remove_instances(&activity.id);
        self.place_instances(&activity);
        debug!(id = %activity.id, days = activity.days.len(), "placed activity edited");
        Ok(Mutation::Applied)
    }

    /// Remove the id from the bank and from every day. Deleting an unknown id
    /// is a no-op.
    pub fn delete(&mut self, id: &ActivityId) -> Mutation {
        let before = self.bank.len();
        self.bank.retain(|a| &a.id != id);
        let removed_from_bank = self.bank.len() != before;
        let removed_from_days = self.remove_instances(id);

        if removed_from_bank || removed_from_days {
            debug!(id = %id, "activity deleted");
            Mutation::Applied
        } else {
            Mutation::NotFound
        }
    }

    /// Move the suggested instance to its proposed start time.
    pub fn apply_suggestion(&mut self, suggestion: &Suggestion) -> Mutation {
        let mut applied = Mutation::NotFound;
        for instance in self.week[suggestion.day]
            .iter_mut()
            .filter(|a| a.id == suggestion.activity_id)
        {
            instance.time = suggestion.suggested_time;
            applied = Mutation::Applied;
        }
        if applied.is_applied() {
            debug!(
                id = %suggestion.activity_id,
                day = %suggestion.day,
                time = %suggestion.suggested_time,
                "suggestion applied"
            );
        }
        applied
    }

    fn place_instances(&mut self, activity: &Activity) {
        for day in activity.days.iter().copied() {
            self.week[day].push(activity.narrowed_to(day));
        }
    }

    /// Drop all instances of `id`, keeping the relative order of the rest.
    fn remove_instances(&mut self, id: &ActivityId) -> bool {
        let mut removed = false;
        for (_, instances) in self.week.iter_mut() {
            let before = instances.len();
            instances.retain(|a| &a.id != id);
            removed |= instances.len() != before;
        }
        removed
    }

    // ------------------------------------------------------------------
    // Conflict engine shortcuts
    // ------------------------------------------------------------------

    pub fn conflicts(&self) -> WeekMap<BTreeSet<ActivityId>> {
        conflicts::detect_conflicts(&self.week)
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        conflicts::suggest_shifts(&self.week)
    }

    // ------------------------------------------------------------------
    // Serialization boundary
    // ------------------------------------------------------------------

    pub fn to_document(&self) -> ScheduleDocument {
        ScheduleDocument {
            activities: self.bank.clone(),
            schedule: self.week.clone(),
        }
    }

    /// Rebuild a store from a saved document.
    ///
    /// Every activity is validated and placed instances are narrowed to the
    /// day they sit on. An id repeated within the bank or within one day, or
    /// found both in the bank and on the calendar, is rejected.
    pub fn from_document(document: ScheduleDocument) -> Result<Self, ValidationError> {
        let ScheduleDocument {
            activities,
            mut schedule,
        } = document;

        let mut banked = BTreeSet::new();
        for activity in &activities {
            activity.validate()?;
            if !banked.insert(&activity.id) {
                return Err(ValidationError::DuplicateActivity(activity.id.to_string()));
            }
        }

        for (day, instances) in schedule.iter_mut() {
            let mut on_day = BTreeSet::new();
            for instance in instances.iter_mut() {
                instance.days = BTreeSet::from([day]);
                instance.validate()?;
                if banked.contains(&instance.id) {
                    return Err(ValidationError::DuplicatePlacement(instance.id.to_string()));
                }
                if !on_day.insert(instance.id.clone()) {
                    return Err(ValidationError::DuplicateActivity(instance.id.to_string()));
                }
            }
        }

        Ok(Self {
            bank: activities,
            week: schedule,
        })
    }
}

/// Serializable snapshot of a store: the bank plus the day map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    /// Bank (unplaced) activities.
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// Placed instances per day.
    #[serde(default)]
    pub schedule: WeekMap<Vec<Activity>>,
}
