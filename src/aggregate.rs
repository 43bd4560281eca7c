//! Dashboard numbers derived from the full delivery history.
//!
//! Everything here is a pure function of the history slice, so the dashboard
//! can be recomputed whenever the history changes.

use crate::config::AggregateConfig;
use crate::record::DeliveryRecord;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Averages {
    pub money: f64,
    pub miles: f64,
    pub expected_minutes: f64,
    pub actual_minutes: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub dollars_per_hour: f64,
    pub total_miles: f64,
    pub total_profit_no_cost: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    /// Mean of `expected - actual`; positive means ahead of schedule.
    pub avg_time_difference: f64,
    pub total_expected_minutes: u64,
    pub total_actual_minutes: u64,
    pub averages: Averages,
}

/// Per-delivery derived metrics. `None` marks a value that is undefined
/// because the delivery took zero minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPoint {
    pub index: usize,
    pub money: f64,
    pub miles: f64,
    pub expected_minutes: u32,
    pub actual_minutes: u32,
    /// Dollars per minute.
    pub efficiency: Option<f64>,
    /// Miles per minute.
    pub speed: Option<f64>,
    pub money_per_mile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingPoint {
    /// 1-based position of the last record in the window.
    pub index: usize,
    pub dollars_per_hour: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub summary: Summary,
    pub points: Vec<RecordPoint>,
    pub rolling_window: usize,
    pub rolling: Vec<RollingPoint>,
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

fn per_minute(amount: f64, minutes: u32) -> Option<f64> {
    if minutes == 0 {
        return None;
    }
    Some(amount / f64::from(minutes)).filter(|v| v.is_finite())
}

/// Hourly earnings over `records`, 0 when no time was logged.
pub fn dollars_per_hour(records: &[DeliveryRecord]) -> f64 {
    let money = records.iter().fold(0.0, |acc, r| acc + r.money);
    let minutes: u64 = records.iter().map(|r| u64::from(r.actual_minutes)).sum();
    if minutes > 0 {
        money / minutes as f64 * 60.0
    } else {
        0.0
    }
}

pub fn summarize(history: &[DeliveryRecord], cost_per_mile: f64) -> Summary {
    let count = history.len();
    let total_money = history.iter().fold(0.0, |acc, r| acc + r.money);
    let total_miles = history.iter().fold(0.0, |acc, r| acc + r.miles);
    let total_expected: u64 = history.iter().map(|r| u64::from(r.expected_minutes)).sum();
    let total_actual: u64 = history.iter().map(|r| u64::from(r.actual_minutes)).sum();
    let time_diff = history.iter().fold(0.0, |acc, r| {
        acc + f64::from(r.expected_minutes) - f64::from(r.actual_minutes)
    });
    let total_cost = total_miles * cost_per_mile;

    Summary {
        count,
        dollars_per_hour: dollars_per_hour(history),
        total_miles,
        total_profit_no_cost: total_money,
        total_cost,
        total_profit: total_money - total_cost,
        avg_time_difference: mean(time_diff, count),
        total_expected_minutes: total_expected,
        total_actual_minutes: total_actual,
        averages: Averages {
            money: mean(total_money, count),
            miles: mean(total_miles, count),
            expected_minutes: mean(total_expected as f64, count),
            actual_minutes: mean(total_actual as f64, count),
        },
    }
}

pub fn record_series(history: &[DeliveryRecord]) -> Vec<RecordPoint> {
    history
        .iter()
        .enumerate()
        .map(|(i, r)| RecordPoint {
            index: i + 1,
            money: r.money,
            miles: r.miles,
            expected_minutes: r.expected_minutes,
            actual_minutes: r.actual_minutes,
            efficiency: per_minute(r.money, r.actual_minutes),
            speed: per_minute(r.miles, r.actual_minutes),
            money_per_mile: if r.miles > 0.0 { r.money / r.miles } else { 0.0 },
        })
        .collect()
}

/// Hourly earnings over each trailing window of `window` records.
///
/// Positions before the first full window produce no point at all.
pub fn rolling_dollars_per_hour(history: &[DeliveryRecord], window: usize) -> Vec<RollingPoint> {
    if window == 0 {
        return Vec::new();
    }
    history
        .windows(window)
        .enumerate()
        .map(|(i, slice)| RollingPoint {
            index: i + window,
            dollars_per_hour: dollars_per_hour(slice),
        })
        .collect()
}

pub fn dashboard(history: &[DeliveryRecord], cfg: &AggregateConfig) -> Dashboard {
    Dashboard {
        summary: summarize(history, cfg.cost_per_mile),
        points: record_series(history),
        rolling_window: cfg.rolling_window,
        rolling: rolling_dollars_per_hour(history, cfg.rolling_window),
    }
}
