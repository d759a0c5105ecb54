pub mod app_config;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod retailer;
pub mod static_products;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use catalog::{CatalogError, CatalogSource};
pub use config::{load_app_config, load_app_config_from_env};
pub use domain::{Listing, Pincode, Product, RetailerResult, RunOutcome, RunSummary};
pub use retailer::{RetailerTag, UnknownRetailer};
pub use static_products::{load_static_products, StaticProductEntry, StaticProductsFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read static products file {path}: {source}")]
    StaticProductsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse static products file: {0}")]
    StaticProductsParse(#[from] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
