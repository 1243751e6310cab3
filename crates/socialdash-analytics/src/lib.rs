//! Analysis pipeline for the social media performance dashboard.
//!
//! A single CSV upload flows through ingestion and schema validation, the
//! `total_engagement` metric, summary figures, three SVG charts, k-means
//! performance clustering and finally the sorted explorer table and its CSV
//! export. [`run_dashboard`] runs every stage for one [`DashboardContext`].

pub mod charts;
pub mod cluster;
pub mod error;
pub mod explorer;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod types;

pub use charts::{render_charts, ChartSet};
pub use cluster::{assign_clusters, rows_in_cluster, KMeans, DEFAULT_CLUSTERS, DEFAULT_SEED};
pub use error::AnalyticsError;
pub use explorer::{explorer_rows, explorer_view, export_csv};
pub use ingest::{read_csv, read_posts, validate, RawTable};
pub use metrics::{add_total_engagement, summarize, MetricCard, SummaryMetrics};
pub use pipeline::{
    run_dashboard, ClusterView, Dashboard, DashboardContext, DashboardOutcome, Upload,
    AWAITING_UPLOAD_MESSAGE,
};
pub use types::{AnalyzedPost, EngagedPost, PostTable, TableView};
