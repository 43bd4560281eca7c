//! Turning OCR'd clock strings into comparable minute offsets.
//!
//! The default model only looks at the minute-of-hour: a target minute that
//! is smaller than the origin minute is assumed to fall in the next hour.
//! This is only right for deliveries shorter than an hour. `TimeModel::Clock`
//! uses the full time of day instead and wraps at midnight.

use crate::heuristics::fields;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    fn parse(marker: &str) -> Option<Self> {
        match marker.to_ascii_uppercase().as_str() {
            "AM" => Some(Self::Am),
            "PM" => Some(Self::Pm),
            _ => None,
        }
    }
}

/// A clock reading recovered from a screenshot line.
///
/// `hour` is the 24-hour value and is `None` when the OCR'd hour cannot be
/// interpreted (e.g. `0:15 PM`). The minute is always valid. Without a
/// marker an hour in `1..=12` may be either half of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeOfDay")]
pub struct TimeOfDay {
    hour: Option<u8>,
    minute: u8,
    meridiem: Option<Meridiem>,
}

#[derive(Deserialize)]
struct RawTimeOfDay {
    hour: Option<u8>,
    minute: u8,
    meridiem: Option<Meridiem>,
}

impl TryFrom<RawTimeOfDay> for TimeOfDay {
    type Error = String;

    fn try_from(raw: RawTimeOfDay) -> Result<Self, Self::Error> {
        if raw.minute > 59 {
            return Err(format!("minute {} out of range", raw.minute));
        }
        if raw.hour.is_some_and(|h| h > 23) {
            return Err(format!("hour {:?} out of range", raw.hour));
        }
        Ok(Self {
            hour: raw.hour,
            minute: raw.minute,
            meridiem: raw.meridiem,
        })
    }
}

impl TimeOfDay {
    /// Build from a 12-hour reading (`meridiem` present) or a literal 24-hour
    /// reading. Returns `None` only when the minute is out of range.
    pub fn new(hour: u8, minute: u8, meridiem: Option<Meridiem>) -> Option<Self> {
        if minute > 59 {
            return None;
        }
        let hour = match meridiem {
            Some(_) if !(1..=12).contains(&hour) => None,
            Some(Meridiem::Am) => Some(hour % 12),
            Some(Meridiem::Pm) => Some(hour % 12 + 12),
            None if hour <= 23 => Some(hour),
            None => None,
        };
        Some(Self {
            hour,
            minute,
            meridiem,
        })
    }

    /// Parse the first clock time found on `line`.
    pub fn parse(line: &str) -> Option<Self> {
        let (clock, marker) = fields::time_parts(line)?;
        let minute = minute_of_hour(clock)? as u8;
        let (hour, _) = clock.split_once(':')?;
        let hour: u8 = hour.parse().ok()?;
        Self::new(hour, minute, marker.and_then(Meridiem::parse))
    }

    pub fn hour(&self) -> Option<u8> {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn meridiem(&self) -> Option<Meridiem> {
        self.meridiem
    }

    pub fn minutes_since_midnight(&self) -> Option<u32> {
        self.hour
            .map(|h| u32::from(h) * MINUTES_PER_HOUR as u32 + u32::from(self.minute))
    }

    /// Every minutes-since-midnight this reading could stand for: two for an
    /// unmarked 12-hour reading, one otherwise.
    fn clock_candidates(&self) -> Vec<i64> {
        let Some(hour) = self.hour else {
            return Vec::new();
        };
        let minute = i64::from(self.minute);
        match (self.meridiem, hour) {
            (None, 1..=12) => {
                let h = i64::from(hour % 12);
                vec![h * MINUTES_PER_HOUR + minute, (h + 12) * MINUTES_PER_HOUR + minute]
            }
            _ => vec![i64::from(hour) * MINUTES_PER_HOUR + minute],
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.hour, self.meridiem) {
            (Some(h), Some(m)) => {
                let h12 = if h % 12 == 0 { 12 } else { h % 12 };
                let marker = match m {
                    Meridiem::Am => "AM",
                    Meridiem::Pm => "PM",
                };
                write!(f, "{h12}:{:02} {marker}", self.minute)
            }
            (Some(h), None) => write!(f, "{h}:{:02}", self.minute),
            (None, _) => write!(f, "?:{:02}", self.minute),
        }
    }
}

/// Minute-of-hour of an `H:MM` string: the integer after the colon.
pub fn minute_of_hour(time_string: &str) -> Option<u32> {
    let (_, minute) = time_string.split_once(':')?;
    minute.trim().parse::<u32>().ok().filter(|m| *m <= 59)
}

/// Minutes from `origin` to `target`, both minute-of-hour values.
///
/// A target earlier in the hour than the origin is taken to be in the
/// following hour, so the result stays in `0..=59`. Inputs are reduced
/// modulo 60 first.
pub fn elapsed_minutes(origin: u32, target: u32) -> u32 {
    let (origin, target) = (origin % 60, target % 60);
    let delta = i64::from(target) - i64::from(origin);
    let delta = if delta < 0 {
        i64::from(target) + MINUTES_PER_HOUR - i64::from(origin)
    } else {
        delta
    };
    delta as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeModel {
    #[default]
    MinuteOfHour,
    Clock,
}

impl TimeModel {
    pub fn elapsed(self, origin: &TimeOfDay, target: &TimeOfDay) -> u32 {
        match self {
            Self::MinuteOfHour => {
                elapsed_minutes(u32::from(origin.minute), u32::from(target.minute))
            }
            // An unmarked reading takes whichever half of the day lands
            // soonest after (or at) the origin.
            Self::Clock => {
                let origins = origin.clock_candidates();
                let targets = target.clock_candidates();
                let soonest = origins
                    .iter()
                    .flat_map(|r| {
                        targets
                            .iter()
                            .map(move |t| (t - r).rem_euclid(MINUTES_PER_DAY))
                    })
                    .min();
                if let Some(delta) = soonest {
                    return delta as u32;
                }
                warn!(
                    origin = %origin,
                    target = %target,
                    "Hour unreadable, falling back to minute-of-hour arithmetic"
                );
                Self::MinuteOfHour.elapsed(origin, target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_minutes_examples() {
        assert_eq!(elapsed_minutes(50, 10), 20);
        assert_eq!(elapsed_minutes(10, 50), 40);
        assert_eq!(elapsed_minutes(30, 30), 0);
        assert_eq!(elapsed_minutes(59, 0), 1);
    }

    #[test]
    fn test_elapsed_minutes_reduces_out_of_range_input() {
        assert_eq!(elapsed_minutes(200, 0), 40);
        assert_eq!(elapsed_minutes(10, 75), 5);
    }

    #[test]
    fn test_deserialize_rejects_bad_minute() {
        let ok: TimeOfDay =
            serde_json::from_str(r#"{"hour":19,"minute":31,"meridiem":"PM"}"#).unwrap();
        assert_eq!(ok, TimeOfDay::parse("7:31 PM").unwrap());
        assert!(serde_json::from_str::<TimeOfDay>(r#"{"hour":7,"minute":75,"meridiem":null}"#).is_err());
        assert!(serde_json::from_str::<TimeOfDay>(r#"{"hour":31,"minute":5,"meridiem":null}"#).is_err());
    }

    #[test]
    fn test_elapsed_minutes_always_within_hour() {
        for r in 0..=59 {
            for t in 0..=59 {
                assert!(elapsed_minutes(r, t) <= 59, "r={r} t={t}");
            }
        }
    }

    #[test]
    fn test_minute_of_hour() {
        assert_eq!(minute_of_hour("7:42"), Some(42));
        assert_eq!(minute_of_hour("12:05"), Some(5));
        assert_eq!(minute_of_hour("7:75"), None);
        assert_eq!(minute_of_hour("742"), None);
    }

    #[test]
    fn test_parse_twelve_hour() {
        let t = TimeOfDay::parse("Deliver by 7:42 PM").unwrap();
        assert_eq!(t.hour(), Some(19));
        assert_eq!(t.minute(), 42);
        assert_eq!(t.meridiem(), Some(Meridiem::Pm));
        assert_eq!(t.to_string(), "7:42 PM");

        let midnight = TimeOfDay::parse("12:05 am").unwrap();
        assert_eq!(midnight.hour(), Some(0));
        let noon = TimeOfDay::parse("12:05 PM").unwrap();
        assert_eq!(noon.hour(), Some(12));
    }

    #[test]
    fn test_parse_keeps_minute_when_hour_is_garbage() {
        let t = TimeOfDay::parse("0:15 PM").unwrap();
        assert_eq!(t.hour(), None);
        assert_eq!(t.minute(), 15);
        assert!(TimeOfDay::parse("9:61").is_none());
        assert!(TimeOfDay::parse("nothing").is_none());
    }

    #[test]
    fn test_minute_model_ignores_hour() {
        let origin = TimeOfDay::parse("6:50 PM").unwrap();
        let target = TimeOfDay::parse("8:10 PM").unwrap();
        assert_eq!(TimeModel::MinuteOfHour.elapsed(&origin, &target), 20);
        assert_eq!(TimeModel::Clock.elapsed(&origin, &target), 80);
    }

    #[test]
    fn test_clock_model_reads_unmarked_hour_as_twelve_hour() {
        let status_bar = TimeOfDay::parse("6:58").unwrap();
        let deliver_by = TimeOfDay::parse("Deliver by 7:31 PM").unwrap();
        let completed = TimeOfDay::parse("7:24").unwrap();
        assert_eq!(TimeModel::Clock.elapsed(&status_bar, &deliver_by), 33);
        assert_eq!(TimeModel::Clock.elapsed(&status_bar, &completed), 26);

        let before_noon = TimeOfDay::parse("11:40").unwrap();
        let after_noon = TimeOfDay::parse("12:15").unwrap();
        assert_eq!(TimeModel::Clock.elapsed(&before_noon, &after_noon), 35);
    }

    #[test]
    fn test_clock_model_wraps_midnight() {
        let origin = TimeOfDay::parse("11:50 PM").unwrap();
        let target = TimeOfDay::parse("12:20 AM").unwrap();
        assert_eq!(TimeModel::Clock.elapsed(&origin, &target), 30);
    }

    #[test]
    fn test_clock_model_falls_back_without_hour() {
        let origin = TimeOfDay::parse("0:50 PM").unwrap();
        let target = TimeOfDay::parse("1:10 PM").unwrap();
        assert_eq!(TimeModel::Clock.elapsed(&origin, &target), 20);
    }
}
