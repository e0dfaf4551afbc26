//! Conflict Engine: time-overlap detection and shift suggestions.
//!
//! Everything here is a pure function of a day map. Each placed instance
//! occupies the half-open interval `[start, start + duration)` in minutes
//! since midnight; two instances on the same day conflict when their
//! intervals intersect. Intervals are not wrapped past midnight.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::activity::{Activity, ActivityId, ClockTime};
use crate::constants::{SUGGESTION_MAX_SHIFT_MINUTES, SUGGESTION_STEP_MINUTES};
use crate::weekday::{WeekMap, Weekday};

/// Ids of every instance on the day that overlaps at least one other.
pub fn day_conflicts(instances: &[Activity]) -> BTreeSet<ActivityId> {
    let mut conflicting = BTreeSet::new();
    for (i, a) in instances.iter().enumerate() {
        for b in &instances[i + 1..] {
            if a.overlaps(b) {
                conflicting.insert(a.id.clone());
                conflicting.insert(b.id.clone());
            }
        }
    }
    conflicting
}

/// Whether any pair of instances on the day overlaps.
pub fn has_conflicts(instances: &[Activity]) -> bool {
    instances
        .iter()
        .enumerate()
        .any(|(i, a)| instances[i + 1..].iter().any(|b| a.overlaps(b)))
}

/// Conflict sets for all seven days. Days with zero or one instance always
/// yield an empty set.
pub fn detect_conflicts(week: &WeekMap<Vec<Activity>>) -> WeekMap<BTreeSet<ActivityId>> {
    week.map(|_, instances| day_conflicts(instances))
}

// ---------------------------------------------------------------------------
// Overlap tooltip
// ---------------------------------------------------------------------------

/// Details shown when a conflicting instance is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapInfo {
    /// Selected activity's name first, then every instance it overlaps.
    pub activities: Vec<String>,
    pub minutes: i64,
}

/// Overlap summary for the instance `id` against everything it overlaps on
/// the same day.
///
/// `minutes` is `min(end, max(other ends)) - max(start, min(other starts))`.
/// With three or more staggered instances this aggregate can exceed the
/// true number of overlapping minutes; it is kept as-is so the figure
/// matches what users have always been shown.
pub fn overlap_info(instances: &[Activity], id: &ActivityId) -> Option<OverlapInfo> {
    let target = instances.iter().find(|a| &a.id == id)?;
    let others: Vec<&Activity> = instances
        .iter()
        .filter(|a| a.id != target.id && a.overlaps(target))
        .collect();

    let latest_end = others.iter().map(|a| a.end()).max()?;
    let earliest_start = others.iter().map(|a| a.start()).min()?;

    let minutes = i64::from(target.end().min(latest_end))
        - i64::from(target.start().max(earliest_start));

    let mut activities = vec![target.name.clone()];
    activities.extend(others.iter().map(|a| a.name.clone()));

    Some(OverlapInfo {
        activities,
        minutes,
    })
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// A proposed start-time change for one conflicting instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub day: Weekday,
    pub activity_id: ActivityId,
    pub activity_name: String,
    pub original_time: ClockTime,
    pub suggested_time: ClockTime,
    pub offset_minutes: i32,
    /// The whole day as it would look with the shift applied.
    pub schedule: Vec<Activity>,
}

/// Shifts tried in order: -120, -90, ..., 0, ..., +120.
pub fn shift_offsets() -> impl Iterator<Item = i32> {
    (-SUGGESTION_MAX_SHIFT_MINUTES..=SUGGESTION_MAX_SHIFT_MINUTES)
        .step_by(SUGGESTION_STEP_MINUTES as usize)
}

/// For each conflicting instance, the first shift that leaves its day free of
/// conflicts.
///
/// Each suggestion is computed against the unmodified day and stands on its
/// own; suggestions are neither merged nor ranked. Instances for which no
/// shift works produce nothing.
pub fn suggest_shifts(week: &WeekMap<Vec<Activity>>) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    for (day, instances) in week.iter() {
        let conflicting = day_conflicts(instances);
        if conflicting.is_empty() {
            continue;
        }

        // Display order, one attempt per id.
        let mut tried = BTreeSet::new();
        for activity in instances {
            if !conflicting.contains(&activity.id) || !tried.insert(activity.id.clone()) {
                continue;
            }
            if let Some(suggestion) = first_resolving_shift(day, instances, activity) {
                suggestions.push(suggestion);
            }
        }
    }

    suggestions
}

fn first_resolving_shift(
    day: Weekday,
    instances: &[Activity],
    activity: &Activity,
) -> Option<Suggestion> {
    shift_offsets().find_map(|offset| {
        let time = ClockTime::from_minutes(i64::from(activity.start()) + i64::from(offset))?;

        let candidate: Vec<Activity> = instances
            .iter()
            .map(|a| {
                if a.id == activity.id {
                    Activity { time, ..a.clone() }
                } else {
                    a.clone()
                }
            })
            .collect();

        (!has_conflicts(&candidate)).then(|| Suggestion {
            day,
            activity_id: activity.id.clone(),
            activity_name: activity.name.clone(),
            original_time: activity.time,
            suggested_time: time,
            offset_minutes: offset,
            schedule: candidate,
        })
    })
}
