//! Row explorer ordering and CSV export of the analyzed table.

use std::cmp::Ordering;

use crate::error::AnalyticsError;
use crate::types::{AnalyzedPost, PostTable, TableView};

/// Rows ordered by `engagement_rate`, highest first. Ties keep table order.
#[must_use]
pub fn explorer_rows(table: &PostTable<AnalyzedPost>) -> Vec<&AnalyzedPost> {
    let mut rows: Vec<&AnalyzedPost> = table.rows.iter().collect();
    // Rates are finite after ingestion; partial_cmp keeps -0.0 and 0.0 tied.
    rows.sort_by(|a, b| {
        b.post
            .engagement_rate
            .partial_cmp(&a.post.engagement_rate)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

/// The explorer table: every input column plus the derived ones, in
/// [`explorer_rows`] order.
#[must_use]
pub fn explorer_view(table: &PostTable<AnalyzedPost>) -> TableView {
    TableView::from_rows(&table.columns, explorer_rows(table))
}

/// Serialize `view` as CSV with a header row and no index column.
///
/// # Errors
///
/// Returns [`AnalyticsError::Csv`] if a record cannot be written and
/// [`AnalyticsError::Export`] if the writer cannot be flushed.
pub fn export_csv(view: &TableView) -> Result<Vec<u8>, AnalyticsError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&view.columns)?;
    for row in &view.rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AnalyticsError::Export(e.to_string()))?;

    tracing::debug!(rows = view.rows.len(), bytes = bytes.len(), "exported table");
    Ok(bytes)
}
