//! Dashboard orchestration: one entry point that re-runs every stage.

use serde::Serialize;

use crate::charts::{render_charts, ChartSet};
use crate::cluster::{assign_clusters, rows_in_cluster, DEFAULT_CLUSTERS};
use crate::error::AnalyticsError;
use crate::explorer::{explorer_view, export_csv};
use crate::ingest::read_posts;
use crate::metrics::{add_total_engagement, summarize, MetricCard, SummaryMetrics};
use crate::types::TableView;

/// Shown instead of the dashboard until a file has been provided.
pub const AWAITING_UPLOAD_MESSAGE: &str = "Please upload a CSV file to see the full analysis.";

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Client-supplied file name, when the transport carries one.
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    #[must_use]
    pub fn new(file_name: Option<String>, bytes: Vec<u8>) -> Self {
        Self { file_name, bytes }
    }

    /// Reject uploads whose name does not end in `.csv`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidUpload`] naming the file.
    pub fn check_extension(&self) -> Result<(), AnalyticsError> {
        match self.file_name.as_deref() {
            Some(name) if !name.to_ascii_lowercase().ends_with(".csv") => Err(
                AnalyticsError::InvalidUpload(format!("{name} is not a .csv file")),
            ),
            _ => Ok(()),
        }
    }
}

/// Everything a dashboard pass depends on. Callers own this state and pass
/// it in on every interaction.
#[derive(Debug, Clone, Default)]
pub struct DashboardContext {
    pub upload: Option<Upload>,
    /// Cluster shown in the cluster view, `0..3`.
    pub cluster_choice: u8,
}

/// Rows of the chosen performance cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterView {
    pub selected: u8,
    pub table: TableView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub summary: SummaryMetrics,
    pub cards: [MetricCard; 4],
    pub charts: ChartSet,
    pub cluster: ClusterView,
    pub explorer: TableView,
    /// CSV of the explorer table, ready for download.
    #[serde(skip)]
    pub export: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardOutcome {
    AwaitingUpload { message: &'static str },
    Ready(Box<Dashboard>),
}

/// Run the whole pipeline for `ctx`: ingest, derive, summarize, render,
/// cluster, select, explore and export.
///
/// No upload yields [`DashboardOutcome::AwaitingUpload`]; that is not an error.
///
/// # Errors
///
/// Returns the first [`AnalyticsError`] raised by any stage. The cluster
/// choice is checked before the upload is read.
pub fn run_dashboard(ctx: &DashboardContext) -> Result<DashboardOutcome, AnalyticsError> {
    let Some(upload) = &ctx.upload else {
        tracing::debug!("no upload yet");
        return Ok(DashboardOutcome::AwaitingUpload {
            message: AWAITING_UPLOAD_MESSAGE,
        });
    };

    if usize::from(ctx.cluster_choice) >= DEFAULT_CLUSTERS {
        return Err(AnalyticsError::InvalidClusterLabel {
            label: ctx.cluster_choice,
            k: DEFAULT_CLUSTERS,
        });
    }
    upload.check_extension()?;

    tracing::debug!(
        file = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = upload.bytes.len(),
        "processing upload"
    );
    let posts = read_posts(&upload.bytes)?;

    let engaged = add_total_engagement(posts);
    let summary = summarize(&engaged)?;
    let charts = render_charts(&engaged)?;
    tracing::debug!("rendered charts");

    let analyzed = assign_clusters(engaged)?;
    let selected = rows_in_cluster(&analyzed, ctx.cluster_choice)?;
    let cluster = ClusterView {
        selected: ctx.cluster_choice,
        table: TableView::from_rows(&analyzed.columns, selected),
    };

    let explorer = explorer_view(&analyzed);
    let export = export_csv(&explorer)?;
    tracing::info!(
        cluster = ctx.cluster_choice,
        cluster_rows = cluster.table.rows.len(),
        export_bytes = export.len(),
        "dashboard ready"
    );

    Ok(DashboardOutcome::Ready(Box::new(Dashboard {
        cards: summary.cards(),
        summary,
        charts,
        cluster,
        explorer,
        export,
    })))
}
