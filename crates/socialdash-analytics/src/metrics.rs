//! Derived engagement column and the headline summary figures.

use serde::Serialize;
use socialdash_core::PostRecord;

use crate::error::AnalyticsError;
use crate::types::{EngagedPost, PostTable};

/// Append `total_engagement = likes + comments + shares` to every row.
#[must_use]
pub fn add_total_engagement(table: PostTable<PostRecord>) -> PostTable<EngagedPost> {
    let rows = table
        .rows
        .into_iter()
        .map(|post| EngagedPost {
            total_engagement: post.total_engagement(),
            post,
        })
        .collect();

    PostTable {
        columns: table.columns,
        rows,
    }
}

/// The four headline figures shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_posts: usize,
    pub avg_engagement_rate: f64,
    pub total_likes: u64,
    pub max_views: u64,
}

/// A labelled, display-formatted summary figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
}

impl SummaryMetrics {
    #[must_use]
    pub fn cards(&self) -> [MetricCard; 4] {
        [
            MetricCard {
                label: "Total Posts",
                value: self.total_posts.to_string(),
            },
            MetricCard {
                label: "Avg Engagement Rate",
                value: format_percent(self.avg_engagement_rate),
            },
            MetricCard {
                label: "Total Likes",
                value: format_grouped(self.total_likes),
            },
            MetricCard {
                label: "Max Views",
                value: format_grouped(self.max_views),
            },
        ]
    }
}

/// Compute row count, mean engagement rate, total likes and max views.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptyTable`] when the table has no rows: the
/// mean and the maximum are undefined. Returns
/// [`AnalyticsError::InvalidValue`] if total likes overflow a `u64`.
pub fn summarize<R: AsRef<PostRecord>>(
    table: &PostTable<R>,
) -> Result<SummaryMetrics, AnalyticsError> {
    let posts = || table.rows.iter().map(AsRef::<PostRecord>::as_ref);

    let max_views = posts()
        .map(|p| p.views)
        .max()
        .ok_or(AnalyticsError::EmptyTable { metric: "max views" })?;

    #[allow(clippy::cast_precision_loss)]
    let avg_engagement_rate =
        posts().map(|p| p.engagement_rate).sum::<f64>() / table.rows.len() as f64;

    let total_likes = posts()
        .enumerate()
        .try_fold(0_u64, |total, (n, p)| {
            total
                .checked_add(p.likes)
                .ok_or_else(|| AnalyticsError::InvalidValue {
                    row: n + 1,
                    column: "likes".to_string(),
                    value: p.likes.to_string(),
                    reason: "total likes is too large".to_string(),
                })
        })?;

    Ok(SummaryMetrics {
        total_posts: table.rows.len(),
        avg_engagement_rate,
        total_likes,
        max_views,
    })
}

/// Format a fraction as a percentage with two decimals: `0.0523` → `5.23%`.
#[must_use]
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Format an integer with comma thousands separators: `1234567` → `1,234,567`.
#[must_use]
pub fn format_grouped(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
