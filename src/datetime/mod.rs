//! Dates in spoken language: finding them in an utterance, and saying them back

mod extract;
mod format;

pub use extract::{extract_datetime, has_time, normalize, resolve_day, Extraction};
pub use format::{nice_date, nice_time};
