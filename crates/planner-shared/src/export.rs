//! Calendar export.
//!
//! Projects the day map onto concrete dates: each weekday resolves to its
//! next occurrence from the export moment (today counts), and every placed
//! instance becomes one event. Times are local wall-clock, so the iCalendar
//! output uses floating `DTSTART`/`DTEND` values without a zone.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::{Activity, ActivityId};
use crate::constants::APP_NAME;
use crate::weekday::{WeekMap, Weekday};

const ICS_DATE_TIME: &str = "%Y%m%dT%H%M%S";
const ICS_MAX_LINE: usize = 75;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub activity_id: ActivityId,
    pub day: Weekday,
    pub summary: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// The first date on or after `from` that falls on `day`.
pub fn next_occurrence(day: Weekday, from: NaiveDate) -> NaiveDate {
    let target = day.to_chrono().num_days_from_monday();
    let current = from.weekday().num_days_from_monday();
    let ahead = (target + 7 - current) % 7;
    from + Duration::days(i64::from(ahead))
}

/// One event per placed instance, Monday first, in display order.
pub fn calendar_events(week: &WeekMap<Vec<Activity>>, now: NaiveDateTime) -> Vec<CalendarEvent> {
    let today = now.date();
    week.iter()
        .flat_map(|(day, instances)| {
            let midnight = NaiveDateTime::new(next_occurrence(day, today), NaiveTime::default());
            instances.iter().map(move |activity| {
                let start = midnight + Duration::minutes(i64::from(activity.start()));
                CalendarEvent {
                    activity_id: activity.id.clone(),
                    day,
                    summary: activity.name.clone(),
                    description: format!("Duration: {} minutes", activity.duration),
                    start,
                    end: start + Duration::minutes(i64::from(activity.duration)),
                }
            })
        })
        .collect()
}

/// Render events as an RFC 5545 calendar.
pub fn to_ics(events: &[CalendarEvent], stamp: DateTime<Utc>) -> String {
    let dtstamp = format!("{}Z", stamp.format(ICS_DATE_TIME));

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:-//{APP_NAME}//EN"),
        "CALSCALE:GREGORIAN".to_string(),
    ];

    for event in events {
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!(
            "UID:{}-{}@schedule-builder",
            escape_text(event.activity_id.as_str()),
            event.day.name().to_lowercase()
        ));
        lines.push(format!("DTSTAMP:{dtstamp}"));
        lines.push(format!("DTSTART:{}", event.start.format(ICS_DATE_TIME)));
        lines.push(format!("DTEND:{}", event.end.format(ICS_DATE_TIME)));
        lines.push(format!("SUMMARY:{}", escape_text(&event.summary)));
        lines.push(format!("DESCRIPTION:{}", escape_text(&event.description)));
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());

    let mut out = String::new();
    for line in &lines {
        fold_line(line, &mut out);
    }
    out
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Append `line` with CRLF, folding at 75 octets without splitting a char.
fn fold_line(line: &str, out: &mut String) {
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > ICS_MAX_LINE {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn instance(id: &str, name: &str, day: Weekday, time: &str, duration: u32) -> Activity {
        Activity {
            id: ActivityId::from(id),
            name: name.into(),
            duration,
            days: BTreeSet::from([day]),
            time: time.parse().unwrap(),
            color: "#FFE4E4".into(),
            cover_image: None,
        }
    }

    fn wednesday_noon() -> NaiveDateTime {
        // 2026-10-21 is a Wednesday.
        NaiveDate::from_ymd_opt(2026, 10, 21)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn next_occurrence_counts_today() {
        let wed = wednesday_noon().date();
        assert_eq!(next_occurrence(Weekday::Wednesday, wed), wed);
        assert_eq!(
            next_occurrence(Weekday::Thursday, wed),
            NaiveDate::from_ymd_opt(2026, 10, 22).unwrap()
        );
        assert_eq!(
            next_occurrence(Weekday::Monday, wed),
            NaiveDate::from_ymd_opt(2026, 10, 26).unwrap()
        );
        assert_eq!(
            next_occurrence(Weekday::Tuesday, wed),
            NaiveDate::from_ymd_opt(2026, 10, 27).unwrap()
        );
    }

    #[test]
    fn one_event_per_placed_instance() {
        let mut week: WeekMap<Vec<Activity>> = WeekMap::default();
        week[Weekday::Monday].push(instance("1", "Ballet I", Weekday::Monday, "12:00", 90));
        week[Weekday::Wednesday].push(instance("1", "Ballet I", Weekday::Wednesday, "12:00", 90));
        week[Weekday::Wednesday].push(instance("2", "Physics II", Weekday::Wednesday, "08:00", 90));

        let events = calendar_events(&week, wednesday_noon());
        assert_eq!(events.len(), 3);

        let monday = &events[0];
        assert_eq!(monday.day, Weekday::Monday);
        assert_eq!(monday.start.to_string(), "2026-10-26 12:00:00");
        assert_eq!(monday.end.to_string(), "2026-10-26 13:30:00");

        let physics = &events[2];
        assert_eq!(physics.summary, "Physics II");
        assert_eq!(physics.start.to_string(), "2026-10-21 08:00:00");
        assert_eq!(physics.description, "Duration: 90 minutes");
    }

    #[test]
    fn late_event_ends_on_next_date() {
        let mut week: WeekMap<Vec<Activity>> = WeekMap::default();
        week[Weekday::Friday].push(instance("n", "Night shift", Weekday::Friday, "23:00", 120));
        let events = calendar_events(&week, wednesday_noon());
        assert_eq!(events[0].end.to_string(), "2026-10-24 01:00:00");
    }

    #[test]
    fn ics_document_shape() {
        let mut week: WeekMap<Vec<Activity>> = WeekMap::default();
        week[Weekday::Thursday].push(instance("3", "Surf, then lunch", Weekday::Thursday, "16:00", 120));
        let events = calendar_events(&week, wednesday_noon());
        let stamp = DateTime::parse_from_rfc3339("2026-10-21T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let ics = to_ics(&events, stamp);
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.contains("PRODID:-//Schedule Builder//EN\r\n"));
        assert!(ics.contains("UID:3-thursday@schedule-builder\r\n"));
        assert!(ics.contains("DTSTAMP:20261021T100000Z\r\n"));
        assert!(ics.contains("DTSTART:20261022T160000\r\n"));
        assert!(ics.contains("DTEND:20261022T180000\r\n"));
        assert!(ics.contains("SUMMARY:Surf\\, then lunch\r\n"));
        assert!(ics.contains("DESCRIPTION:Duration: 120 minutes\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn long_lines_are_folded() {
        let mut out = String::new();
        let line = format!("SUMMARY:{}", "x".repeat(100));
        fold_line(&line, &mut out);
        let physical: Vec<&str> = out.trim_end_matches("\r\n").split("\r\n").collect();
        assert_eq!(physical.len(), 2);
        assert_eq!(physical[0].len(), 75);
        assert!(physical[1].starts_with(' '));
        assert_eq!(physical.concat().len(), line.len() + 1);
    }
}
