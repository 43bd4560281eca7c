//! Delivery metrics from gig-app screenshots.
//!
//! Two OCR text dumps (the offer screen and the completion screen) are parsed
//! into a [`record::DeliveryRecord`], appended to a store, and the stored
//! history is rolled up into dashboard numbers by [`aggregate`].

pub mod aggregate;
pub mod config;
pub mod delivery_db;
pub mod error;
pub mod heuristics;
pub mod ocr;
pub mod pipeline;
pub mod reconcile;
pub mod record;

pub use error::{Error, Result};
