use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("row {row}, column {column}: invalid value \"{value}\" ({reason})")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("cannot compute {metric} on an empty table")]
    EmptyTable { metric: &'static str },

    #[error("column {column} has zero variance and cannot be standardized")]
    ZeroVariance { column: String },

    #[error("clustering needs at least {k} distinct rows, found {distinct}")]
    InsufficientClusterData { distinct: usize, k: usize },

    #[error("cluster label {label} is out of range (expected 0..{k})")]
    InvalidClusterLabel { label: u8, k: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("chart rendering failed for {chart}: {reason}")]
    Chart { chart: &'static str, reason: String },

    #[error("export failed: {0}")]
    Export(String),
}

impl AnalyticsError {
    /// `true` when the error stems from the uploaded data rather than from the
    /// service itself; the user fixes these by correcting the file.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AnalyticsError::Csv(_)
                | AnalyticsError::MissingColumns { .. }
                | AnalyticsError::InvalidValue { .. }
                | AnalyticsError::EmptyTable { .. }
                | AnalyticsError::ZeroVariance { .. }
                | AnalyticsError::InsufficientClusterData { .. }
                | AnalyticsError::InvalidUpload(_)
        )
    }
}
