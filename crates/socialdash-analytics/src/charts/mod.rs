//! The three dashboard charts, rendered as SVG documents.

pub mod data;
pub mod render;

use serde::Serialize;

use crate::error::AnalyticsError;
use crate::types::{EngagedPost, PostTable};

pub use data::{
    engagement_scatter, fit_ols, grouped_means, length_vs_rate, GroupedBars, OlsFit,
    ScatterData, ScatterMarker,
};
pub use render::{content_length_svg, engagement_trends_svg, platform_comparison_svg, CHART_SIZE};

/// Rendered SVG for each chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSet {
    pub platform_comparison: String,
    pub engagement_trends: String,
    pub content_length: String,
}

impl ChartSet {
    /// `(file stem, svg)` pairs, in display order.
    #[must_use]
    pub fn named(&self) -> [(&'static str, &str); 3] {
        [
            ("platform_comparison", &self.platform_comparison),
            ("engagement_trends", &self.engagement_trends),
            ("content_length", &self.content_length),
        ]
    }
}

/// Render all three charts for `table`.
///
/// A degenerate regression (fewer than two points or constant post length)
/// is drawn without the fitted line and logged as a warning.
///
/// # Errors
///
/// Returns [`AnalyticsError::Chart`] if any chart fails to render.
pub fn render_charts(table: &PostTable<EngagedPost>) -> Result<ChartSet, AnalyticsError> {
    let platform_comparison = platform_comparison_svg(&grouped_means(&table.rows))?;
    let engagement_trends = engagement_trends_svg(&engagement_scatter(&table.rows))?;

    let points = length_vs_rate(&table.rows);
    let fit = fit_ols(&points);
    if fit.is_none() {
        tracing::warn!(
            points = points.len(),
            "regression line skipped: post_length has no spread"
        );
    }
    let content_length = content_length_svg(&points, fit.as_ref())?;

    Ok(ChartSet {
        platform_comparison,
        engagement_trends,
        content_length,
    })
}
