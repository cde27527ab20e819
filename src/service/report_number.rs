//! Human-readable report numbers: `NCR-<yyyyMMddHHmmss>-<000..999>` in UTC.

use chrono::{DateTime, Utc};
use rand::Rng;

pub const REPORT_NUMBER_PREFIX: &str = "NCR";

pub fn generate_report_number() -> String {
    format_report_number(Utc::now(), rand::rng().random_range(0..1000))
}

pub fn format_report_number(at: DateTime<Utc>, suffix: u16) -> String {
    format!(
        "{}-{}-{:03}",
        REPORT_NUMBER_PREFIX,
        at.format("%Y%m%d%H%M%S"),
        suffix % 1000
    )
}
