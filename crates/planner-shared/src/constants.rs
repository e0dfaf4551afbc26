/// Application name, also used as the calendar export product id.
pub const APP_NAME: &str = "Schedule Builder";

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Largest shift, in either direction, tried by the suggestion search.
pub const SUGGESTION_MAX_SHIFT_MINUTES: i32 = 120;

/// Step between candidate shifts in the suggestion search.
pub const SUGGESTION_STEP_MINUTES: i32 = 30;

/// Color given to activities created without one.
pub const DEFAULT_COLOR: &str = "#E6E6FA";

/// Longest accepted activity, one full week.
pub const MAX_DURATION_MINUTES: u32 = 7 * MINUTES_PER_DAY;

/// Avatar assigned to new accounts that do not supply one.
pub const DEFAULT_AVATAR: &str =
    "https://images.unsplash.com/photo-1507525428034-b723cf961d3e?w=800&auto=format&fit=crop&q=60";
