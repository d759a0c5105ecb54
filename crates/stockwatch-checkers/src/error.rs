use thiserror::Error;

use stockwatch_core::RetailerTag;

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The storefront answered with a well-formed error of its own, e.g. a
    /// non-success envelope code or a PA-API `Errors` array.
    #[error("{retailer} API error: {message}")]
    Upstream {
        retailer: RetailerTag,
        message: String,
    },

    #[error("{retailer} checker is missing credentials")]
    MissingCredentials { retailer: RetailerTag },

    #[error("cannot build {retailer} request for product {source_product_id}: {reason}")]
    InvalidProduct {
        retailer: RetailerTag,
        source_product_id: String,
        reason: String,
    },
}

impl CheckerError {
    /// Fold a `reqwest` send error into the taxonomy, keeping deadline
    /// overruns distinguishable from other transport failures.
    pub(crate) fn from_send(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CheckerError::Timeout {
                url: url.to_string(),
            }
        } else {
            CheckerError::Http(e)
        }
    }
}
