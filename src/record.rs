use crate::config::ParseConfig;
use crate::heuristics::{AfterScreenshot, BeforeScreenshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use tracing::{info, warn};

/// What to do when pay or mileage could not be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFieldPolicy {
    /// Store zero for the missing amount.
    #[default]
    Zero,
    /// Refuse to build a record.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    Origin,
    DeliverBy,
    Completion,
    Pay,
    Mileage,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Origin => "offer time",
            Self::DeliverBy => "deliver-by time",
            Self::Completion => "completion time",
            Self::Pay => "pay",
            Self::Mileage => "mileage",
        };
        f.write_str(name)
    }
}

/// One completed delivery. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub money: f64,
    pub expected_minutes: u32,
    pub actual_minutes: u32,
    pub miles: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Built(DeliveryRecord),
    /// Required fields were not found in the screenshots.
    InsufficientData(Vec<MissingField>),
}

impl BuildOutcome {
    pub fn record(&self) -> Option<&DeliveryRecord> {
        match self {
            Self::Built(record) => Some(record),
            Self::InsufficientData(_) => None,
        }
    }
}

/// Combine both parsed screenshots into a delivery record.
///
/// Expected time runs from the offer time to the deliver-by time, actual time
/// from the offer time to the completion time.
pub fn build_record(
    before: &BeforeScreenshot,
    after: &AfterScreenshot,
    settings: &ParseConfig,
    created_at: OffsetDateTime,
) -> BuildOutcome {
    let mut missing = Vec::new();
    if before.origin.is_none() {
        missing.push(MissingField::Origin);
    }
    if before.deliver_by.is_none() {
        missing.push(MissingField::DeliverBy);
    }
    if after.completion.is_none() {
        missing.push(MissingField::Completion);
    }
    if settings.missing_field == MissingFieldPolicy::Reject {
        if before.pay.is_none() {
            missing.push(MissingField::Pay);
        }
        if before.miles.is_none() {
            missing.push(MissingField::Mileage);
        }
    }

    let (Some(origin), Some(deliver_by), Some(completion), true) = (
        before.origin,
        before.deliver_by,
        after.completion,
        missing.is_empty(),
    ) else {
        warn!(missing = ?missing, "Insufficient data to build delivery record");
        return BuildOutcome::InsufficientData(missing);
    };

    let model = settings.time_model;
    let record = DeliveryRecord {
        money: before.pay.unwrap_or(0.0),
        expected_minutes: model.elapsed(&origin, &deliver_by),
        actual_minutes: model.elapsed(&origin, &completion),
        miles: before.miles.unwrap_or(0.0),
        created_at,
    };
    info!(
        money = record.money,
        miles = record.miles,
        expected = record.expected_minutes,
        actual = record.actual_minutes,
        origin = %origin,
        deliver_by = %deliver_by,
        completion = %completion,
        "Delivery record built"
    );
    BuildOutcome::Built(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::tests::{COMPLETED, OFFER};
    use crate::heuristics::{parse_after, parse_before};
    use crate::reconcile::{TimeModel, TimeOfDay};

    fn at(hour: u8, minute: u8) -> Option<TimeOfDay> {
        TimeOfDay::new(hour, minute, None)
    }

    fn before() -> BeforeScreenshot {
        BeforeScreenshot {
            pay: Some(12.50),
            miles: Some(3.2),
            origin: at(18, 10),
            deliver_by: at(18, 40),
        }
    }

    #[test]
    fn test_build_record() {
        let after = AfterScreenshot {
            completion: at(18, 25),
        };
        let now = OffsetDateTime::UNIX_EPOCH;
        let outcome = build_record(&before(), &after, &ParseConfig::default(), now);
        assert_eq!(
            outcome,
            BuildOutcome::Built(DeliveryRecord {
                money: 12.50,
                expected_minutes: 30,
                actual_minutes: 15,
                miles: 3.2,
                created_at: now,
            })
        );
    }

    #[test]
    fn test_missing_deliver_by_builds_nothing() {
        let before = BeforeScreenshot {
            deliver_by: None,
            ..before()
        };
        let after = AfterScreenshot {
            completion: at(18, 25),
        };
        let outcome = build_record(
            &before,
            &after,
            &ParseConfig::default(),
            OffsetDateTime::UNIX_EPOCH,
        );
        assert_eq!(
            outcome,
            BuildOutcome::InsufficientData(vec![MissingField::DeliverBy])
        );
        assert!(outcome.record().is_none());
    }

    #[test]
    fn test_missing_completion_builds_nothing() {
        let outcome = build_record(
            &before(),
            &AfterScreenshot::default(),
            &ParseConfig::default(),
            OffsetDateTime::UNIX_EPOCH,
        );
        assert_eq!(
            outcome,
            BuildOutcome::InsufficientData(vec![MissingField::Completion])
        );
    }

    #[test]
    fn test_missing_pay_policy() {
        let before = BeforeScreenshot {
            pay: None,
            miles: None,
            ..before()
        };
        let after = AfterScreenshot {
            completion: at(18, 25),
        };

        let zero = build_record(
            &before,
            &after,
            &ParseConfig::default(),
            OffsetDateTime::UNIX_EPOCH,
        );
        let record = zero.record().unwrap();
        assert_eq!(record.money, 0.0);
        assert_eq!(record.miles, 0.0);

        let strict = ParseConfig {
            missing_field: MissingFieldPolicy::Reject,
            ..ParseConfig::default()
        };
        let rejected = build_record(&before, &after, &strict, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(
            rejected,
            BuildOutcome::InsufficientData(vec![MissingField::Pay, MissingField::Mileage])
        );
    }

    #[test]
    fn test_completion_in_next_hour() {
        let before = BeforeScreenshot {
            origin: at(18, 50),
            deliver_by: at(19, 20),
            ..before()
        };
        let after = AfterScreenshot {
            completion: at(19, 5),
        };
        let record = build_record(
            &before,
            &after,
            &ParseConfig::default(),
            OffsetDateTime::UNIX_EPOCH,
        );
        let record = record.record().unwrap();
        assert_eq!(record.expected_minutes, 30);
        assert_eq!(record.actual_minutes, 15);
    }

    #[test]
    fn test_clock_model_handles_long_deliveries() {
        let before = BeforeScreenshot {
            origin: at(18, 10),
            deliver_by: at(19, 40),
            ..before()
        };
        let after = AfterScreenshot {
            completion: at(19, 25),
        };
        let settings = ParseConfig {
            time_model: TimeModel::Clock,
            ..ParseConfig::default()
        };
        let outcome = build_record(&before, &after, &settings, OffsetDateTime::UNIX_EPOCH);
        let record = outcome.record().unwrap();
        assert_eq!(record.expected_minutes, 90);
        assert_eq!(record.actual_minutes, 75);
    }

    #[test]
    fn test_clock_model_with_status_bar_origin() {
        let settings = ParseConfig {
            time_model: TimeModel::Clock,
            ..ParseConfig::default()
        };
        let outcome = build_record(
            &parse_before(OFFER),
            &parse_after(COMPLETED),
            &settings,
            OffsetDateTime::UNIX_EPOCH,
        );
        let record = outcome.record().unwrap();
        assert_eq!(record.expected_minutes, 33);
        assert_eq!(record.actual_minutes, 26);

        let minute_only = build_record(
            &parse_before(OFFER),
            &parse_after(COMPLETED),
            &ParseConfig::default(),
            OffsetDateTime::UNIX_EPOCH,
        );
        assert_eq!(minute_only.record(), Some(record));
    }
}
