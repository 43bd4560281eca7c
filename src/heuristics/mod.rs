// src/heuristics/mod.rs

pub mod fields;
pub mod normalize;

use crate::reconcile::TimeOfDay;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

pub use normalize::normalize_lines;

/// Everything readable from the offer screen, captured before accepting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeforeScreenshot {
    pub pay: Option<f64>,
    pub miles: Option<f64>,
    /// First clock time on the screen (the status-bar time when the offer
    /// was shown).
    pub origin: Option<TimeOfDay>,
    /// Second clock time on the screen.
    pub deliver_by: Option<TimeOfDay>,
}

impl BeforeScreenshot {
    pub fn origin_minute(&self) -> Option<u32> {
        self.origin.map(|t| u32::from(t.minute()))
    }

    pub fn deliver_by_minute(&self) -> Option<u32> {
        self.deliver_by.map(|t| u32::from(t.minute()))
    }

    /// How many fields were successfully extracted.
    pub fn coverage(&self) -> (usize, usize) {
        let filled = [
            self.pay.is_some(),
            self.miles.is_some(),
            self.origin.is_some(),
            self.deliver_by.is_some(),
        ]
        .iter()
        .filter(|&&v| v)
        .count();
        (filled, 4)
    }
}

/// The completion screen, captured after dropping off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AfterScreenshot {
    pub completion: Option<TimeOfDay>,
}

impl AfterScreenshot {
    pub fn completion_minute(&self) -> Option<u32> {
        self.completion.map(|t| u32::from(t.minute()))
    }
}

/// Parse the OCR text of the offer screenshot.
pub fn parse_before(text: &str) -> BeforeScreenshot {
    let lines = normalize_lines(text);
    let times = fields::time_lines(&lines);
    debug!(lines = lines.len(), time_lines = ?times, "Before screenshot lines");

    BeforeScreenshot {
        pay: fields::extract_money(text),
        miles: fields::extract_mileage(&lines),
        origin: times.first().and_then(|line| TimeOfDay::parse(line)),
        deliver_by: times.get(1).and_then(|line| TimeOfDay::parse(line)),
    }
}

/// Parse the OCR text of the completion screenshot.
pub fn parse_after(text: &str) -> AfterScreenshot {
    let lines = normalize_lines(text);
    let times = fields::time_lines(&lines);
    debug!(lines = lines.len(), time_lines = ?times, "After screenshot lines");

    AfterScreenshot {
        completion: times.first().and_then(|line| TimeOfDay::parse(line)),
    }
}
