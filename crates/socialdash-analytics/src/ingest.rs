//! CSV ingestion and schema validation.
//!
//! Parsing is split from validation: [`read_csv`] only understands the CSV
//! framing, [`validate`] checks the required columns once and converts every
//! required cell to its typed field, so a malformed upload fails here with a
//! single clear error instead of deep inside a later step.

use socialdash_core::{PostRecord, DERIVED_COLUMNS, REQUIRED_COLUMNS, TOTAL_ENGAGEMENT_COLUMN};

use crate::error::AnalyticsError;
use crate::types::PostTable;

/// A parsed but untyped CSV payload.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<csv::StringRecord>,
}

/// Parse CSV bytes: header row required, comma separated, every record must
/// have as many fields as the header.
///
/// # Errors
///
/// Returns [`AnalyticsError::Csv`] for malformed CSV, invalid UTF-8, or
/// ragged rows.
pub fn read_csv(bytes: &[u8]) -> Result<RawTable, AnalyticsError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let records = reader
        .records()
        .collect::<Result<Vec<csv::StringRecord>, csv::Error>>()?;

    Ok(RawTable { headers, records })
}

/// Check the schema and type every row.
///
/// Input columns named like a derived column are dropped so the pipeline
/// recomputes them; this keeps a re-uploaded export from carrying stale values.
///
/// # Errors
///
/// Returns [`AnalyticsError::MissingColumns`] listing every absent required
/// column, or [`AnalyticsError::InvalidValue`] for the first cell that does
/// not parse or whose counts overflow the engagement or likes totals.
pub fn validate(raw: RawTable) -> Result<PostTable<PostRecord>, AnalyticsError> {
    let keep: Vec<usize> = raw
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !DERIVED_COLUMNS.contains(&h.as_str()))
        .map(|(i, _)| i)
        .collect();

    if keep.len() != raw.headers.len() {
        tracing::debug!(
            dropped = raw.headers.len() - keep.len(),
            "dropping input columns that are recomputed by the pipeline"
        );
    }

    let columns: Vec<String> = keep.iter().map(|&i| raw.headers[i].clone()).collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|c| c == *required))
        .map(|c| (*c).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AnalyticsError::MissingColumns { missing });
    }

    let position = |name: &str| columns.iter().position(|c| c == name).unwrap_or(0);
    let idx = SchemaIndex {
        platform: position("platform"),
        post_type: position("post_type"),
        likes: position("likes"),
        comments: position("comments"),
        shares: position("shares"),
        views: position("views"),
        engagement_rate: position("engagement_rate"),
        post_length: position("post_length"),
    };

    // Sums built downstream (per-row engagement, total likes) must fit in u64.
    let mut total_likes: u64 = 0;
    let mut rows = Vec::with_capacity(raw.records.len());
    for (n, record) in raw.records.iter().enumerate() {
        let row = n + 1;
        let cells: Vec<String> = keep
            .iter()
            .map(|&i| record.get(i).unwrap_or("").to_string())
            .collect();
        let post = idx.parse_row(row, cells)?;

        if post.checked_total_engagement().is_none() {
            let value = format!("{} + {} + {}", post.likes, post.comments, post.shares);
            return Err(invalid(
                row,
                TOTAL_ENGAGEMENT_COLUMN,
                &value,
                "likes + comments + shares is too large",
            ));
        }
        total_likes = total_likes.checked_add(post.likes).ok_or_else(|| {
            invalid(row, "likes", &post.likes.to_string(), "total likes is too large")
        })?;

        rows.push(post);
    }

    let outside = rows.iter().filter(|p| !p.engagement_rate_is_fraction()).count();
    if outside > 0 {
        tracing::warn!(
            rows = outside,
            "engagement_rate values outside [0, 1]; percentages will look off"
        );
    }

    Ok(PostTable { columns, rows })
}

/// Parse and validate an uploaded CSV payload in one step.
///
/// # Errors
///
/// See [`read_csv`] and [`validate`].
pub fn read_posts(bytes: &[u8]) -> Result<PostTable<PostRecord>, AnalyticsError> {
    let table = validate(read_csv(bytes)?)?;
    tracing::info!(
        rows = table.len(),
        columns = table.columns.len(),
        "ingested upload"
    );
    Ok(table)
}

/// Positions of the required columns within a row's kept cells.
struct SchemaIndex {
    platform: usize,
    post_type: usize,
    likes: usize,
    comments: usize,
    shares: usize,
    views: usize,
    engagement_rate: usize,
    post_length: usize,
}

impl SchemaIndex {
    fn parse_row(&self, row: usize, cells: Vec<String>) -> Result<PostRecord, AnalyticsError> {
        Ok(PostRecord {
            platform: cells[self.platform].clone(),
            post_type: cells[self.post_type].clone(),
            likes: parse_count(row, "likes", &cells[self.likes])?,
            comments: parse_count(row, "comments", &cells[self.comments])?,
            shares: parse_count(row, "shares", &cells[self.shares])?,
            views: parse_count(row, "views", &cells[self.views])?,
            engagement_rate: parse_number(row, "engagement_rate", &cells[self.engagement_rate])?,
            post_length: parse_number(row, "post_length", &cells[self.post_length])?,
            cells,
        })
    }
}

fn invalid(row: usize, column: &str, value: &str, reason: &str) -> AnalyticsError {
    AnalyticsError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Non-negative integer. Integral floats (`"10.0"`) are accepted because
/// spreadsheet exports often write counts that way.
fn parse_count(row: usize, column: &str, value: &str) -> Result<u64, AnalyticsError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(row, column, value, "value is empty"));
    }
    if let Ok(n) = trimmed.parse::<u64>() {
        return Ok(n);
    }

    #[allow(clippy::cast_precision_loss)]
    let max = u64::MAX as f64;
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < max => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let n = f as u64;
            Ok(n)
        }
        _ => Err(invalid(row, column, value, "expected a non-negative integer")),
    }
}

fn parse_number(row: usize, column: &str, value: &str) -> Result<f64, AnalyticsError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(row, column, value, "value is empty"));
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(f),
        _ => Err(invalid(row, column, value, "expected a finite number")),
    }
}

#[cfg(test)]
#[path = "ingest_test.rs"]
mod tests;
