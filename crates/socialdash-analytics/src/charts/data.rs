//! Pure chart inputs: group means, scatter markers and the least-squares fit.

use crate::types::EngagedPost;

/// Marker radius bounds, in pixels, for the views-scaled scatter.
pub const MIN_MARKER_RADIUS: u32 = 3;
pub const MAX_MARKER_RADIUS: u32 = 12;

/// Two-sided 95% normal quantile used for the regression band.
pub const Z_95: f64 = 1.96;

/// Mean `total_engagement` per (platform, post type).
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedBars {
    /// Platforms in order of first appearance.
    pub platforms: Vec<String>,
    /// Post types in order of first appearance.
    pub post_types: Vec<String>,
    /// `means[platform][post_type]`; `None` when the pair never occurs.
    pub means: Vec<Vec<Option<f64>>>,
}

impl GroupedBars {
    #[must_use]
    pub fn max_mean(&self) -> Option<f64> {
        self.means
            .iter()
            .flatten()
            .flatten()
            .copied()
            .reduce(f64::max)
    }
}

#[must_use]
pub fn grouped_means(rows: &[EngagedPost]) -> GroupedBars {
    let mut platforms: Vec<String> = Vec::new();
    let mut post_types: Vec<String> = Vec::new();
    let mut cells: Vec<(usize, usize, u64)> = Vec::with_capacity(rows.len());

    for row in rows {
        let p = index_of(&mut platforms, &row.post.platform);
        let t = index_of(&mut post_types, &row.post.post_type);
        cells.push((p, t, row.total_engagement));
    }

    let mut sums = vec![vec![0.0_f64; post_types.len()]; platforms.len()];
    let mut counts = vec![vec![0_usize; post_types.len()]; platforms.len()];
    for (p, t, total) in cells {
        #[allow(clippy::cast_precision_loss)]
        let value = total as f64;
        sums[p][t] += value;
        counts[p][t] += 1;
    }

    let means = sums
        .into_iter()
        .zip(counts)
        .map(|(row_sums, row_counts)| {
            row_sums
                .into_iter()
                .zip(row_counts)
                .map(|(sum, count)| {
                    #[allow(clippy::cast_precision_loss)]
                    let mean = (count > 0).then(|| sum / count as f64);
                    mean
                })
                .collect()
        })
        .collect();

    GroupedBars {
        platforms,
        post_types,
        means,
    }
}

fn index_of(seen: &mut Vec<String>, value: &str) -> usize {
    if let Some(i) = seen.iter().position(|s| s == value) {
        i
    } else {
        seen.push(value.to_string());
        seen.len() - 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterMarker {
    pub x: f64,
    pub y: f64,
    pub radius: u32,
    /// Index into [`ScatterData::groups`].
    pub group: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterData {
    pub groups: Vec<String>,
    pub markers: Vec<ScatterMarker>,
}

/// Likes against comments, sized by views and grouped by platform.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn engagement_scatter(rows: &[EngagedPost]) -> ScatterData {
    let min_views = rows.iter().map(|r| r.post.views).min().unwrap_or(0);
    let max_views = rows.iter().map(|r| r.post.views).max().unwrap_or(0);

    let mut groups = Vec::new();
    let markers = rows
        .iter()
        .map(|row| ScatterMarker {
            x: row.post.likes as f64,
            y: row.post.comments as f64,
            radius: marker_radius(row.post.views, min_views, max_views),
            group: index_of(&mut groups, &row.post.platform),
        })
        .collect();

    ScatterData { groups, markers }
}

/// Linear map of `views` from `[min, max]` onto the marker radius range.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn marker_radius(views: u64, min: u64, max: u64) -> u32 {
    let span = f64::from(MAX_MARKER_RADIUS - MIN_MARKER_RADIUS);
    if max <= min {
        return MIN_MARKER_RADIUS + (span / 2.0).round() as u32;
    }
    let t = (views.saturating_sub(min)) as f64 / (max - min) as f64;
    MIN_MARKER_RADIUS + (t.clamp(0.0, 1.0) * span).round() as u32
}

/// `(post_length, engagement_rate)` pairs for the regression chart.
#[must_use]
pub fn length_vs_rate(rows: &[EngagedPost]) -> Vec<(f64, f64)> {
    rows.iter()
        .map(|r| (r.post.post_length, r.post.engagement_rate))
        .collect()
}

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub slope: f64,
    pub intercept: f64,
    n: usize,
    mean_x: f64,
    sxx: f64,
    /// Residual standard error; `None` with only two points.
    residual_se: Option<f64>,
}

impl OlsFit {
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// 95% confidence interval of the mean prediction at `x`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn confidence_band(&self, x: f64) -> Option<(f64, f64)> {
        let s = self.residual_se?;
        let dx = x - self.mean_x;
        let se = s * (1.0 / self.n as f64 + dx * dx / self.sxx).sqrt();
        let y = self.predict(x);
        Some((y - Z_95 * se, y + Z_95 * se))
    }
}

/// Fit a line through `points`. `None` for fewer than two points or when
/// every x is equal.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fit_ols(points: &[(f64, f64)]) -> Option<OlsFit> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = points
        .iter()
        .map(|p| (p.0 - mean_x) * (p.1 - mean_y))
        .sum();

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let residual_se = (points.len() > 2).then(|| {
        let sse: f64 = points
            .iter()
            .map(|p| (p.1 - (slope * p.0 + intercept)).powi(2))
            .sum();
        (sse / (n - 2.0)).sqrt()
    });

    Some(OlsFit {
        slope,
        intercept,
        n: points.len(),
        mean_x,
        sxx,
        residual_se,
    })
}
