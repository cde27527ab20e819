//! Aggregate counts over nonconformance reports for the dashboard cards.

use super::CrudService;
use crate::error::AppError;
use crate::store::{FindOptions, Record, MAX_LIMIT};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct QualitySummary {
    pub total_reports: u64,
    pub open_reports: u64,
    pub in_progress_reports: u64,
    /// Critical severity, not yet closed or cancelled.
    pub critical_issues: u64,
    pub by_severity: BTreeMap<String, u64>,
}

impl QualitySummary {
    pub fn add(&mut self, report: &Record) {
        let status = report.get("status").and_then(|v| v.as_str()).unwrap_or("");
        let severity = report
            .get("severity_level")
            .and_then(|v| v.as_str())
            .unwrap_or("unspecified");
        self.total_reports += 1;
        match status {
            "open" => self.open_reports += 1,
            "in_progress" => self.in_progress_reports += 1,
            _ => {}
        }
        if severity == "critical" && !matches!(status, "closed" | "cancelled") {
            self.critical_issues += 1;
        }
        *self.by_severity.entry(severity.to_string()).or_default() += 1;
    }
}

/// Page through every report; each page is its own round-trip.
pub async fn quality_summary(reports: &CrudService) -> Result<QualitySummary, AppError> {
    let mut summary = QualitySummary::default();
    let mut offset = 0u32;
    loop {
        let page = reports
            .find_many(&[], &FindOptions::new(Some(MAX_LIMIT), Some(offset)))
            .await?;
        for report in &page {
            summary.add(report);
        }
        if page.len() < MAX_LIMIT as usize {
            break;
        }
        offset += MAX_LIMIT;
    }
    Ok(summary)
}
