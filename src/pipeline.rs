// src/pipeline.rs

use crate::config::ParseConfig;
use crate::delivery_db::{self, DeliveryStore};
use crate::error::{Error, Result};
use crate::heuristics::{self, AfterScreenshot, BeforeScreenshot};
use crate::ocr::OcrEngine;
use crate::record::{self, BuildOutcome, DeliveryRecord, MissingField};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{Instrument, error, info, info_span};

/// What happened to the record after both screenshots were parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordStatus {
    Saved { id: i64, record: DeliveryRecord },
    /// The record was built but the store refused it. It can still be shown.
    SaveFailed { record: DeliveryRecord, error: String },
    /// Built but deliberately not persisted.
    Unsaved { record: DeliveryRecord },
    InsufficientData { missing: Vec<MissingField> },
}

impl RecordStatus {
    pub fn record(&self) -> Option<&DeliveryRecord> {
        match self {
            Self::Saved { record, .. } | Self::SaveFailed { record, .. } | Self::Unsaved { record } => {
                Some(record)
            }
            Self::InsufficientData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub before: BeforeScreenshot,
    pub after: AfterScreenshot,
    pub status: RecordStatus,
}

async fn recognize(
    engine: &dyn OcrEngine,
    screenshot: &'static str,
    image: &[u8],
    language: &str,
) -> Result<String> {
    engine
        .recognize(image, language)
        .instrument(info_span!("ocr", screenshot))
        .await
        .map_err(|e| {
            error!(screenshot, error = %e, "Recognition failed");
            Error::recognition(screenshot, e.to_string())
        })
}

/// OCR both screenshots concurrently, then parse, build and persist.
///
/// If either recognition fails nothing is built or stored.
pub async fn process_screenshots(
    engine: &dyn OcrEngine,
    store: Option<&dyn DeliveryStore>,
    before_image: &[u8],
    after_image: &[u8],
    language: &str,
    settings: &ParseConfig,
    now: OffsetDateTime,
) -> Result<DeliveryOutcome> {
    let (before_text, after_text) = tokio::try_join!(
        recognize(engine, "before", before_image, language),
        recognize(engine, "after", after_image, language),
    )?;
    info!(
        before_chars = before_text.len(),
        after_chars = after_text.len(),
        "Both screenshots recognized"
    );
    Ok(process_texts(store, &before_text, &after_text, settings, now))
}

/// Parse already-recognized text and persist the record if `store` is given.
pub fn process_texts(
    store: Option<&dyn DeliveryStore>,
    before_text: &str,
    after_text: &str,
    settings: &ParseConfig,
    now: OffsetDateTime,
) -> DeliveryOutcome {
    let before = {
        let _guard = info_span!("parse", screenshot = "before").entered();
        let before = heuristics::parse_before(before_text);
        let (filled, total) = before.coverage();
        info!(
            filled,
            total,
            pay = ?before.pay,
            miles = ?before.miles,
            origin = ?before.origin_minute(),
            deliver_by = ?before.deliver_by_minute(),
            "Extraction result"
        );
        before
    };
    let after = {
        let _guard = info_span!("parse", screenshot = "after").entered();
        let after = heuristics::parse_after(after_text);
        info!(completion = ?after.completion_minute(), "Extraction result");
        after
    };

    let status = match record::build_record(&before, &after, settings, now) {
        BuildOutcome::InsufficientData(missing) => RecordStatus::InsufficientData { missing },
        BuildOutcome::Built(record) => match store {
            None => RecordStatus::Unsaved { record },
            Some(store) => {
                let digest = delivery_db::source_digest(before_text, after_text);
                match store.append(&record, Some(&digest)) {
                    Ok(id) => RecordStatus::Saved { id, record },
                    Err(e) => {
                        error!(error = %e, "Failed to persist delivery record");
                        RecordStatus::SaveFailed {
                            record,
                            error: e.to_string(),
                        }
                    }
                }
            }
        },
    };

    DeliveryOutcome {
        before,
        after,
        status,
    }
}
