//! Performance clustering over standardized likes/comments/shares/views.

pub mod kmeans;
pub mod scale;

use socialdash_core::CLUSTER_FEATURE_COLUMNS;

use crate::error::AnalyticsError;
use crate::types::{AnalyzedPost, EngagedPost, PostTable};

pub use kmeans::{KMeans, KMeansFit, DEFAULT_CLUSTERS, DEFAULT_SEED};
pub use scale::{standardize, StandardScaler};

/// Standardize the four engagement features, run k-means with the fixed
/// dashboard parameters and append `performance_cluster` to every row.
///
/// # Errors
///
/// Returns [`AnalyticsError::InsufficientClusterData`] when the table has
/// fewer than three distinct feature rows and [`AnalyticsError::ZeroVariance`]
/// when one of the features is constant.
pub fn assign_clusters(
    table: PostTable<EngagedPost>,
) -> Result<PostTable<AnalyzedPost>, AnalyticsError> {
    let model = KMeans::default();
    let features: Vec<[f64; 4]> = table
        .rows
        .iter()
        .map(|row| row.post.cluster_features())
        .collect();

    // Report too few rows before a constant column, which is its usual symptom.
    let distinct = kmeans::count_distinct(&features);
    if distinct < model.k {
        return Err(AnalyticsError::InsufficientClusterData {
            distinct,
            k: model.k,
        });
    }

    let scaled = standardize(&features, &CLUSTER_FEATURE_COLUMNS)?;
    let fit = model.fit(&scaled)?;
    tracing::info!(
        rows = table.rows.len(),
        clusters = model.k,
        inertia = fit.inertia,
        iterations = fit.iterations,
        "assigned performance clusters"
    );

    let rows = table
        .rows
        .into_iter()
        .zip(fit.labels)
        .map(|(row, label)| {
            let performance_cluster = u8::try_from(label).map_err(|_| {
                AnalyticsError::InvalidParameter(format!("cluster label {label} exceeds u8"))
            })?;
            Ok(AnalyzedPost {
                post: row.post,
                total_engagement: row.total_engagement,
                performance_cluster,
            })
        })
        .collect::<Result<Vec<_>, AnalyticsError>>()?;

    Ok(PostTable {
        columns: table.columns,
        rows,
    })
}

/// Rows whose `performance_cluster` equals `label`, in table order.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidClusterLabel`] for a label outside
/// `0..DEFAULT_CLUSTERS`.
pub fn rows_in_cluster(
    table: &PostTable<AnalyzedPost>,
    label: u8,
) -> Result<Vec<&AnalyzedPost>, AnalyticsError> {
    if usize::from(label) >= DEFAULT_CLUSTERS {
        return Err(AnalyticsError::InvalidClusterLabel {
            label,
            k: DEFAULT_CLUSTERS,
        });
    }
    Ok(table
        .rows
        .iter()
        .filter(|row| row.performance_cluster == label)
        .collect())
}
