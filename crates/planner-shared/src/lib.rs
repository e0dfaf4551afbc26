//! # planner-shared
//!
//! Core of the weekly planner: the activity model, the in-memory Schedule
//! Store with its bank/calendar partition, the Conflict Engine, and the
//! calendar export. Nothing in this crate performs I/O; the store is an
//! explicit value owned by whoever drives it.

pub mod activity;
pub mod conflicts;
pub mod constants;
pub mod error;
pub mod export;
pub mod identity;
pub mod schedule;
pub mod weekday;

pub use activity::{Activity, ActivityDraft, ActivityId, ClockTime, CoverImage};
pub use error::ValidationError;
pub use identity::{OwnerId, Profile, ProfileUpdate};
pub use schedule::{Location, Mutation, ScheduleDocument, ScheduleStore};
pub use weekday::{WeekMap, Weekday};
