/// Columns every uploaded file must carry, in the order they are reported
/// when missing.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "platform",
    "post_type",
    "likes",
    "comments",
    "shares",
    "views",
    "engagement_rate",
    "post_length",
];

pub const TOTAL_ENGAGEMENT_COLUMN: &str = "total_engagement";
pub const PERFORMANCE_CLUSTER_COLUMN: &str = "performance_cluster";

/// Columns computed by the pipeline and appended after the input columns.
pub const DERIVED_COLUMNS: [&str; 2] = [TOTAL_ENGAGEMENT_COLUMN, PERFORMANCE_CLUSTER_COLUMN];

/// Fixed download name for the analyzed table.
pub const EXPORT_FILE_NAME: &str = "social_media_analysis.csv";

/// Names of the clustering features, in the order of [`PostRecord::cluster_features`].
pub const CLUSTER_FEATURE_COLUMNS: [&str; 4] = ["likes", "comments", "shares", "views"];

/// One social-media post as uploaded, with its required columns parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub platform: String,
    pub post_type: String,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
    /// Expected to be a fraction in `[0, 1]`; not enforced.
    pub engagement_rate: f64,
    pub post_length: f64,
    /// Original cell text for every input column, in header order.
    pub cells: Vec<String>,
}

impl PostRecord {
    /// Likes + comments + shares, or `None` when the sum does not fit in a `u64`.
    #[must_use]
    pub fn checked_total_engagement(&self) -> Option<u64> {
        self.likes
            .checked_add(self.comments)?
            .checked_add(self.shares)
    }

    /// Likes + comments + shares. Saturates at `u64::MAX`; ingestion rejects
    /// rows where that would happen.
    #[must_use]
    pub fn total_engagement(&self) -> u64 {
        self.likes
            .saturating_add(self.comments)
            .saturating_add(self.shares)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cluster_features(&self) -> [f64; 4] {
        [
            self.likes as f64,
            self.comments as f64,
            self.shares as f64,
            self.views as f64,
        ]
    }

    #[must_use]
    pub fn engagement_rate_is_fraction(&self) -> bool {
        (0.0..=1.0).contains(&self.engagement_rate)
    }
}

impl AsRef<PostRecord> for PostRecord {
    fn as_ref(&self) -> &PostRecord {
        self
    }
}
