//! Weekly class schedule: sessions and time-of-day arithmetic.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use aula_core::ValidationErrors;

/// Shortest class session accepted.
pub const MIN_SESSION_MINUTES: u32 = 30;

/// Day of the week a session takes place on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    pub fn days_from_monday(&self) -> i64 {
        *self as i64
    }
}

impl core::str::FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [Weekday; 7] = [
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
            Weekday::Saturday,
            Weekday::Sunday,
        ];
        let wanted = s.trim().to_ascii_lowercase();
        ALL.into_iter()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| format!("unknown weekday '{s}'"))
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(value: chrono::Weekday) -> Self {
        match value {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

/// One weekly class meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub weekday: Weekday,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl Session {
    pub fn duration_minutes(&self) -> u32 {
        minutes_of_day(self.end_time).saturating_sub(minutes_of_day(self.start_time))
    }

    /// Whether two sessions share the same weekday and intersect in time.
    /// Back-to-back sessions (one ends when the other starts) do not overlap.
    pub fn overlaps(&self, other: &Session) -> bool {
        self.weekday == other.weekday
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}

/// Minutes elapsed since midnight.
pub fn minutes_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Parse a strict `HH:MM` 24-hour clock value.
pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.trim().split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

pub fn format_hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Validate a set of sessions on their own (no calendar context).
///
/// Field paths are `sessions`, `sessions[i].end_time`, ...
pub fn check_sessions(sessions: &[Session]) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if sessions.is_empty() {
        errors.push("sessions", "at least one session is required");
        return errors;
    }

    for (i, s) in sessions.iter().enumerate() {
        if s.start_time >= s.end_time {
            errors.push(format!("sessions[{i}].end_time"), "must be later than start_time");
        } else if s.duration_minutes() < MIN_SESSION_MINUTES {
            errors.push(
                format!("sessions[{i}].end_time"),
                format!("session must last at least {MIN_SESSION_MINUTES} minutes"),
            );
        }
    }

    for (i, a) in sessions.iter().enumerate() {
        for (j, b) in sessions.iter().enumerate().skip(i + 1) {
            if a.start_time < a.end_time && b.start_time < b.end_time && a.overlaps(b) {
                errors.push(
                    format!("sessions[{j}]"),
                    format!("overlaps session {i} on {}", b.weekday.as_str()),
                );
            }
        }
    }

    errors
}

/// Total class minutes per week.
pub fn weekly_minutes(sessions: &[Session]) -> u32 {
    sessions.iter().map(Session::duration_minutes).sum()
}

/// Every calendar date in `[start, end]` with at least one session.
pub fn class_dates(start: NaiveDate, end: NaiveDate, sessions: &[Session]) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| has_session_on(sessions, *d))
        .collect()
}

/// Whether any date in `[start, end]` has a session. Stops at the first hit.
pub fn has_class_day(start: NaiveDate, end: NaiveDate, sessions: &[Session]) -> bool {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .any(|d| has_session_on(sessions, d))
}

/// Number of dates [`class_dates`] would return, without building them.
pub fn class_count(start: NaiveDate, end: NaiveDate, sessions: &[Session]) -> u64 {
    let mut days: Vec<Weekday> = sessions.iter().map(|s| s.weekday).collect();
    days.sort();
    days.dedup();
    days.into_iter().map(|wd| occurrences(start, end, wd)).sum()
}

/// Total class minutes across the whole `[start, end]` range.
///
/// Counted per weekday rather than per date, so any range the calendar
/// accepts (years 1 to 9999) stays well inside `u64`.
pub fn total_minutes(start: NaiveDate, end: NaiveDate, sessions: &[Session]) -> u64 {
    sessions
        .iter()
        .map(|s| occurrences(start, end, s.weekday) * u64::from(s.duration_minutes()))
        .sum()
}

fn has_session_on(sessions: &[Session], date: NaiveDate) -> bool {
    let wd = Weekday::from(date.weekday());
    sessions.iter().any(|s| s.weekday == wd)
}

/// How many times `weekday` falls in `[start, end]`.
fn occurrences(start: NaiveDate, end: NaiveDate, weekday: Weekday) -> u64 {
    if end < start {
        return 0;
    }
    let days = (end - start).num_days() + 1;
    let offset = (weekday.days_from_monday() - Weekday::from(start.weekday()).days_from_monday()).rem_euclid(7);
    let count = days / 7 + i64::from(offset < days % 7);
    count as u64
}

/// `NaiveTime` as `HH:MM` on the wire.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_hhmm(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_hhmm(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{raw}', expected HH:MM")))
    }
}
