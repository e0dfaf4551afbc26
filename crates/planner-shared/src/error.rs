use thiserror::Error;

/// Rejections raised while building or editing an [`Activity`](crate::activity::Activity).
///
/// These are surfaced inline to the user; the offending operation is never
/// applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Activity name must not be empty")]
    MissingName,

    #[error("Activity duration is required")]
    MissingDuration,

    #[error("Activity duration must be a positive number of minutes, got {0}")]
    InvalidDuration(i64),

    #[error("Activity start time is required")]
    MissingTime,

    #[error("Invalid start time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Activity must recur on at least one day")]
    NoDays,

    #[error("Unknown weekday '{0}'")]
    UnknownDay(String),

    #[error("Activity id must not be empty")]
    EmptyId,

    #[error("Invalid cover image: {0}")]
    InvalidCoverImage(String),

    #[error("Schedule name must not be empty")]
    MissingScheduleName,

    #[error("Activity {0} appears more than once in the same list")]
    DuplicateActivity(String),

    #[error("Activity {0} is both in the bank and placed on the calendar")]
    DuplicatePlacement(String),
}
