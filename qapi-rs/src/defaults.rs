//! Default values for absent arguments.
//!
//! When a request does not carry a token for a parameter, the binder asks this
//! module for a stand-in. Parameters whose hint reads like a "recent N"/"last N"
//! window get a non-zero default (N units, or the start of the day N days ago);
//! everything else gets the zero of its kind.

use crate::value::{TypeTag, Value, ValueKind};
use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Window size used when a hint implies a recent window.
pub const DEFAULT_RECENT_WINDOW: u32 = 5;

/// Markers that flag a hint as a recent-window phrase: "近" (recent) and
/// "几" (how many / last N).
pub const DEFAULT_RECENT_MARKERS: [&str; 2] = ["近", "几"];

/// Decides whether a parameter hint describes a "recent N" window.
pub trait HintPolicy: Send + Sync {
    fn implies_recent_window(&self, hint: &str) -> bool;
}

impl<F> HintPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn implies_recent_window(&self, hint: &str) -> bool {
        self(hint)
    }
}

/// Substring matching against a fixed set of markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerHints {
    markers: Vec<String>,
}

impl MarkerHints {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for MarkerHints {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_MARKERS)
    }
}

impl HintPolicy for MarkerHints {
    fn implies_recent_window(&self, hint: &str) -> bool {
        self.markers
            .iter()
            .any(|m| !m.is_empty() && hint.contains(m.as_str()))
    }
}

/// Midnight of the day `days_back` days before `day`.
pub fn start_of_day(day: NaiveDate, days_back: u32) -> NaiveDateTime {
    day.checked_sub_days(Days::new(u64::from(days_back)))
        .unwrap_or(day)
        .and_time(NaiveTime::MIN)
}

/// Default for an absent argument, relative to today's local date.
pub fn default_for(tag: TypeTag, hint: &str, policy: &dyn HintPolicy, window: u32) -> Value {
    default_for_on(tag, hint, policy, window, Local::now().date_naive())
}

/// Same as [`default_for`] with an explicit reference day.
pub fn default_for_on(
    tag: TypeTag,
    hint: &str,
    policy: &dyn HintPolicy,
    window: u32,
    today: NaiveDate,
) -> Value {
    if tag.kind == ValueKind::Str {
        return Value::Str(String::new());
    }

    let recent = policy.implies_recent_window(hint);
    let magnitude = if recent { window } else { 0 };

    match Value::numeric(tag.kind, magnitude) {
        Some(value) => value,
        None => Value::Timestamp(start_of_day(today, magnitude)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_recent_hint_defaults_to_window() {
        let hints = MarkerHints::default();
        let today = day("2024-05-10");

        assert_eq!(
            default_for_on(TypeTag::INT32, "近N天内的数据", &hints, 5, today),
            Value::Int32(5)
        );
        assert_eq!(
            default_for_on(TypeTag::FLOAT64, "最近几个月", &hints, 5, today),
            Value::Float64(5.0)
        );
        assert_eq!(
            default_for_on(TypeTag::TIMESTAMP, "近几天", &hints, 5, today),
            Value::Timestamp(start_of_day(day("2024-05-05"), 0))
        );
    }

    #[test]
    fn test_plain_hint_defaults_to_zero() {
        let hints = MarkerHints::default();
        let today = day("2024-05-10");

        assert_eq!(
            default_for_on(TypeTag::INT32, "总数", &hints, 5, today),
            Value::Int32(0)
        );
        assert_eq!(
            default_for_on(TypeTag::FLOAT32, "", &hints, 5, today),
            Value::Float32(0.0)
        );
        assert_eq!(
            default_for_on(TypeTag::TIMESTAMP, "开始时间", &hints, 5, today),
            Value::Timestamp(start_of_day(today, 0))
        );
    }

    #[test]
    fn test_string_default_ignores_hint() {
        let hints = MarkerHints::default();
        let today = day("2024-05-10");
        assert_eq!(
            default_for_on(TypeTag::STRING.variadic(), "近几天", &hints, 5, today),
            Value::Str(String::new())
        );
    }

    #[test]
    fn test_closure_policy() {
        let policy = |hint: &str| hint.starts_with("last");
        let today = day("2024-01-03");
        assert_eq!(
            default_for_on(TypeTag::INT64, "last N orders", &policy, 3, today),
            Value::Int64(3)
        );
        assert_eq!(
            default_for_on(TypeTag::TIMESTAMP, "last N days", &policy, 3, today),
            Value::Timestamp(start_of_day(day("2023-12-31"), 0))
        );
    }

    #[test]
    fn test_start_of_day() {
        let ts = start_of_day(day("2024-03-01"), 1);
        assert_eq!(ts.to_string(), "2024-02-29 00:00:00");
    }
}
