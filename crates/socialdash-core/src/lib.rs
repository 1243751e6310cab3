//! Shared data model and configuration for the social media dashboard.

pub mod app_config;
pub mod config;
pub mod posts;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use posts::{
    PostRecord, CLUSTER_FEATURE_COLUMNS, DERIVED_COLUMNS, EXPORT_FILE_NAME,
    PERFORMANCE_CLUSTER_COLUMN, REQUIRED_COLUMNS, TOTAL_ENGAGEMENT_COLUMN,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
