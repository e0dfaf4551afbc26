//! The [`Activity`] model and its typed fields.
//!
//! Field names on the wire follow the planner's JSON documents (`coverImage`,
//! `"HH:MM"` start times, weekday names), so saved schedules written by older
//! clients deserialize unchanged.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_COLOR, MAX_DURATION_MINUTES, MINUTES_PER_DAY};
use crate::error::ValidationError;
use crate::weekday::Weekday;

// ---------------------------------------------------------------------------
// ActivityId
// ---------------------------------------------------------------------------

/// Opaque activity identifier, stable for the activity's lifetime.
///
/// Every placed instance of an activity carries the same id as its bank entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub String);

impl ActivityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// ClockTime
// ---------------------------------------------------------------------------

/// Local wall-clock start time, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn new(hours: u32, minutes: u32) -> Option<Self> {
        if hours < 24 && minutes < 60 {
            Some(Self((hours * 60 + minutes) as u16))
        } else {
            None
        }
    }

    /// `None` unless `minutes` falls within `[0, 1440)`.
    pub fn from_minutes(minutes: i64) -> Option<Self> {
        if (0..MINUTES_PER_DAY as i64).contains(&minutes) {
            Some(Self(minutes as u16))
        } else {
            None
        }
    }

    pub fn minutes(self) -> u32 {
        self.0 as u32
    }

    pub fn hour(self) -> u32 {
        self.minutes() / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes() % 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTime(s.to_string());

        let (hh, mm) = s.trim().split_once(':').ok_or_else(invalid)?;
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(hh) || hh.len() > 2 || !all_digits(mm) || mm.len() != 2 {
            return Err(invalid());
        }

        let hours: u32 = hh.parse().map_err(|_| invalid())?;
        let minutes: u32 = mm.parse().map_err(|_| invalid())?;
        ClockTime::new(hours, minutes).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

// ---------------------------------------------------------------------------
// CoverImage
// ---------------------------------------------------------------------------

/// Reference to an activity's cover image.
///
/// Freshly picked images travel inline as `data:` URLs until they are
/// uploaded, after which the activity points at a remote URL. Both forms
/// serialize to the plain string they were parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CoverImage {
    Url(String),
    Embedded { mime: String, data: Vec<u8> },
}

impl CoverImage {
    pub fn is_embedded(&self) -> bool {
        matches!(self, CoverImage::Embedded { .. })
    }
}

impl FromStr for CoverImage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::InvalidCoverImage("empty reference".into()));
        }

        let Some(rest) = s.strip_prefix("data:") else {
            return Ok(CoverImage::Url(s.to_string()));
        };

        let (meta, payload) = rest.split_once(',').ok_or_else(|| {
            ValidationError::InvalidCoverImage("data URL without payload".into())
        })?;
        let mime = meta.strip_suffix(";base64").ok_or_else(|| {
            ValidationError::InvalidCoverImage("only base64 data URLs are supported".into())
        })?;
        let data = STANDARD
            .decode(payload)
            .map_err(|e| ValidationError::InvalidCoverImage(format!("bad base64 payload: {e}")))?;

        Ok(CoverImage::Embedded {
            mime: mime.to_string(),
            data,
        })
    }
}

impl TryFrom<String> for CoverImage {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CoverImage> for String {
    fn from(image: CoverImage) -> Self {
        match image {
            CoverImage::Url(url) => url,
            CoverImage::Embedded { mime, data } => {
                format!("data:{mime};base64,{}", STANDARD.encode(data))
            }
        }
    }
}

/// Treat `null` and `""` as "no image"; the activity form sends an empty
/// string when nothing was picked.
fn deserialize_cover_image<'de, D>(deserializer: D) -> Result<Option<CoverImage>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// A recurring, time-boxed task.
///
/// In the bank, `days` lists every weekday the activity recurs on. A placed
/// instance has `days` narrowed to the single day it sits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    /// Minutes, positive and at most [`MAX_DURATION_MINUTES`].
    pub duration: u32,
    pub days: BTreeSet<Weekday>,
    pub time: ClockTime,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(
        default,
        deserialize_with = "deserialize_cover_image",
        skip_serializing_if = "Option::is_none"
    )]
    pub cover_image: Option<CoverImage>,
}

impl Activity {
    /// Validate raw form input and assign the given id.
    pub fn from_draft(id: ActivityId, draft: ActivityDraft) -> Result<Self, ValidationError> {
        if id.as_str().is_empty() {
            return Err(ValidationError::EmptyId);
        }

        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }

        let duration = draft.duration.ok_or(ValidationError::MissingDuration)?;
        if duration <= 0 || duration > i64::from(MAX_DURATION_MINUTES) {
            return Err(ValidationError::InvalidDuration(duration));
        }

        if draft.time.trim().is_empty() {
            return Err(ValidationError::MissingTime);
        }
        let time: ClockTime = draft.time.parse()?;

        if draft.days.is_empty() {
            return Err(ValidationError::NoDays);
        }
        let days = draft
            .days
            .iter()
            .map(|d| d.trim().parse::<Weekday>())
            .collect::<Result<BTreeSet<_>, _>>()?;

        let color = draft
            .color
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(default_color);

        let cover_image = match draft.cover_image.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse()?),
        };

        Ok(Self {
            id,
            name: name.to_string(),
            duration: duration as u32,
            days,
            time,
            color,
            cover_image,
        })
    }

    /// Re-check an already typed activity, e.g. one received as JSON.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.as_str().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.duration == 0 || self.duration > MAX_DURATION_MINUTES {
            return Err(ValidationError::InvalidDuration(i64::from(self.duration)));
        }
        if self.days.is_empty() {
            return Err(ValidationError::NoDays);
        }
        Ok(())
    }

    /// Start of the activity in minutes since midnight.
    pub fn start(&self) -> u32 {
        self.time.minutes()
    }

    /// Exclusive end in minutes since midnight. May exceed one day; no
    /// wrap-around to the following day is applied.
    pub fn end(&self) -> u32 {
        self.start().saturating_add(self.duration)
    }

    /// Half-open interval overlap: touching intervals do not overlap.
    pub fn overlaps(&self, other: &Activity) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }

    /// The placed instance of this activity on `day`.
    pub fn narrowed_to(&self, day: Weekday) -> Activity {
        Activity {
            days: BTreeSet::from([day]),
            ..self.clone()
        }
    }
}

/// Raw, unvalidated input from the activity creation/edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ActivityDraft {
        ActivityDraft {
            name: "Ballet I".into(),
            duration: Some(90),
            days: vec!["Wednesday".into(), "Monday".into(), "Monday".into()],
            time: "12:00".into(),
            color: Some("#FFE4E4".into()),
            cover_image: None,
        }
    }

    #[test]
    fn clock_time_parsing() {
        assert_eq!("09:20".parse::<ClockTime>().unwrap().minutes(), 560);
        assert_eq!("9:05".parse::<ClockTime>().unwrap().to_string(), "09:05");
        assert_eq!("23:59".parse::<ClockTime>().unwrap().minutes(), 1439);
        assert_eq!("00:00".parse::<ClockTime>().unwrap().minutes(), 0);

        for bad in ["24:00", "12:60", "12", "12:5", "ab:cd", "", "-1:00", "123:00"] {
            assert!(bad.parse::<ClockTime>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn clock_time_from_minutes_bounds() {
        assert!(ClockTime::from_minutes(-30).is_none());
        assert!(ClockTime::from_minutes(1440).is_none());
        assert_eq!(ClockTime::from_minutes(1439).unwrap().to_string(), "23:59");
    }

    #[test]
    fn draft_dedups_and_orders_days() {
        let activity = Activity::from_draft(ActivityId::from("1"), draft()).unwrap();
        let days: Vec<_> = activity.days.iter().copied().collect();
        assert_eq!(days, vec![Weekday::Monday, Weekday::Wednesday]);
        assert_eq!(activity.time.minutes(), 720);
        assert_eq!(activity.duration, 90);
    }

    #[test]
    fn draft_validation_errors() {
        let mut d = draft();
        d.name = "   ".into();
        assert_eq!(
            Activity::from_draft(ActivityId::new(), d).unwrap_err(),
            ValidationError::MissingName
        );

        let mut d = draft();
        d.duration = None;
        assert_eq!(
            Activity::from_draft(ActivityId::new(), d).unwrap_err(),
            ValidationError::MissingDuration
        );

        let mut d = draft();
        d.duration = Some(0);
        assert_eq!(
            Activity::from_draft(ActivityId::new(), d).unwrap_err(),
            ValidationError::InvalidDuration(0)
        );

        let mut d = draft();
        d.time = String::new();
        assert_eq!(
            Activity::from_draft(ActivityId::new(), d).unwrap_err(),
            ValidationError::MissingTime
        );

        let mut d = draft();
        d.days.clear();
        assert_eq!(
            Activity::from_draft(ActivityId::new(), d).unwrap_err(),
            ValidationError::NoDays
        );

        let mut d = draft();
        d.days = vec!["Someday".into()];
        assert_eq!(
            Activity::from_draft(ActivityId::new(), d).unwrap_err(),
            ValidationError::UnknownDay("Someday".into())
        );
    }

    #[test]
    fn duration_is_capped_at_one_week() {
        let mut d = draft();
        d.duration = Some(i64::from(MAX_DURATION_MINUTES));
        assert!(Activity::from_draft(ActivityId::new(), d).is_ok());

        let mut d = draft();
        d.duration = Some(i64::from(u32::MAX));
        assert_eq!(
            Activity::from_draft(ActivityId::new(), d).unwrap_err(),
            ValidationError::InvalidDuration(i64::from(u32::MAX))
        );
    }

    #[test]
    fn oversized_duration_from_json_fails_validation() {
        let json = r#"{"id":"1","name":"x","duration":4294967295,"days":["Monday"],"time":"10:00"}"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(
            activity.validate().unwrap_err(),
            ValidationError::InvalidDuration(4_294_967_295)
        );
        // Unvalidated values still answer without overflowing.
        assert_eq!(activity.end(), u32::MAX);
        let mut other = activity.clone();
        other.time = "12:00".parse().unwrap();
        other.duration = 30;
        assert!(activity.overlaps(&other));
    }

    #[test]
    fn empty_color_falls_back_to_default() {
        let mut d = draft();
        d.color = Some(String::new());
        let activity = Activity::from_draft(ActivityId::new(), d).unwrap();
        assert_eq!(activity.color, DEFAULT_COLOR);
    }

    #[test]
    fn cover_image_forms() {
        let url: CoverImage = "https://cdn.example.com/a.png".parse().unwrap();
        assert!(!url.is_embedded());

        let embedded: CoverImage = "data:image/png;base64,aGVsbG8=".parse().unwrap();
        assert_eq!(
            embedded,
            CoverImage::Embedded {
                mime: "image/png".into(),
                data: b"hello".to_vec()
            }
        );
        assert_eq!(String::from(embedded), "data:image/png;base64,aGVsbG8=");

        assert!("data:image/png;base64,%%%".parse::<CoverImage>().is_err());
        assert!("data:image/png,raw".parse::<CoverImage>().is_err());
    }

    #[test]
    fn json_uses_original_field_names() {
        let json = r##"{
            "id": "4",
            "name": "Computer Science II",
            "duration": 90,
            "days": ["Thursday", "Monday", "Tuesday"],
            "time": "09:20",
            "color": "#F4D9E4",
            "coverImage": ""
        }"##;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.id, ActivityId::from("4"));
        assert!(activity.cover_image.is_none());
        assert_eq!(activity.days.len(), 3);

        let value = serde_json::to_value(&activity).unwrap();
        assert_eq!(value["time"], "09:20");
        assert_eq!(value["days"][0], "Monday");
        assert!(value.get("coverImage").is_none());
    }

    #[test]
    fn bad_time_is_rejected_in_json() {
        let json = r#"{"id":"1","name":"x","duration":5,"days":["Monday"],"time":"25:00"}"#;
        assert!(serde_json::from_str::<Activity>(json).is_err());
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let mut a = Activity::from_draft(ActivityId::from("a"), draft()).unwrap();
        let mut b = a.clone();
        a.time = "09:00".parse().unwrap();
        a.duration = 30;
        b.time = "09:30".parse().unwrap();
        b.duration = 30;
        assert!(!a.overlaps(&b));
        b.time = "09:15".parse().unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }
}
