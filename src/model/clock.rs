use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Signed minutes from the plan's day origin (00:00 of the base date).
pub type Minutes = i32;

pub const MINUTES_PER_DAY: Minutes = 24 * 60;

/// Which calendar day a minute offset falls on, relative to the base date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOffset {
    Previous,
    Current,
    Next,
}

impl DayOffset {
    pub fn of(minutes: Minutes) -> Self {
        if minutes < 0 {
            DayOffset::Previous
        } else if minutes >= MINUTES_PER_DAY {
            DayOffset::Next
        } else {
            DayOffset::Current
        }
    }
}

/// Format as a wall-clock `HH:MM`, wrapping offsets outside the base day.
pub fn format_hhmm(minutes: Minutes) -> String {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY) as u32;
    NaiveTime::from_hms_opt(wrapped / 60, wrapped % 60, 0)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Parse `H:MM` or `HH:MM` into minutes after midnight.
pub fn parse_hhmm(s: &str) -> Option<Minutes> {
    let time = NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()?;
    Some((time.hour() * 60 + time.minute()) as Minutes)
}

/// Resolve a minute offset against the base date.
pub fn to_datetime(base: NaiveDate, minutes: Minutes) -> NaiveDateTime {
    base.and_time(NaiveTime::MIN) + Duration::minutes(minutes as i64)
}

/// Human-readable length, e.g. `9h` or `9h 30m`.
pub fn format_duration(minutes: Minutes) -> String {
    let minutes = minutes.max(0);
    let (h, m) = (minutes / 60, minutes % 60);
    if m > 0 {
        format!("{}h {}m", h, m)
    } else {
        format!("{}h", h)
    }
}
