use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A product's retailer tag was not one of the supported storefronts.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown retailer tag: {0}")]
pub struct UnknownRetailer(pub String);

/// The closed set of storefronts the engine knows how to check.
///
/// The snake_case form produced by [`RetailerTag::as_str`] is the one stored
/// in the catalog and accepted in configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetailerTag {
    Croma,
    Amazon,
    Flipkart,
    RelianceDigital,
    Apple,
    Vivo,
    Iqoo,
    Oppo,
}

impl RetailerTag {
    pub const ALL: [RetailerTag; 8] = [
        RetailerTag::Croma,
        RetailerTag::Amazon,
        RetailerTag::Flipkart,
        RetailerTag::RelianceDigital,
        RetailerTag::Apple,
        RetailerTag::Vivo,
        RetailerTag::Iqoo,
        RetailerTag::Oppo,
    ];

    /// The canonical snake_case identifier, as stored in the catalog.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RetailerTag::Croma => "croma",
            RetailerTag::Amazon => "amazon",
            RetailerTag::Flipkart => "flipkart",
            RetailerTag::RelianceDigital => "reliance_digital",
            RetailerTag::Apple => "apple",
            RetailerTag::Vivo => "vivo",
            RetailerTag::Iqoo => "iqoo",
            RetailerTag::Oppo => "oppo",
        }
    }

    /// Human-readable storefront name, used in alert headers.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            RetailerTag::Croma => "Croma",
            RetailerTag::Amazon => "Amazon",
            RetailerTag::Flipkart => "Flipkart",
            RetailerTag::RelianceDigital => "Reliance Digital",
            RetailerTag::Apple => "Apple",
            RetailerTag::Vivo => "vivo",
            RetailerTag::Iqoo => "iQOO",
            RetailerTag::Oppo => "OPPO",
        }
    }

    /// Emoji used in alert headers when no override is configured.
    #[must_use]
    pub fn default_emoji(self) -> &'static str {
        match self {
            RetailerTag::Croma => "🏬",
            RetailerTag::Amazon => "📦",
            RetailerTag::Flipkart => "🛒",
            RetailerTag::RelianceDigital => "🔌",
            RetailerTag::Apple => "🍎",
            RetailerTag::Vivo => "📱",
            RetailerTag::Iqoo => "🚀",
            RetailerTag::Oppo => "🟢",
        }
    }
}

impl std::fmt::Display for RetailerTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetailerTag {
    type Err = UnknownRetailer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "croma" => Ok(RetailerTag::Croma),
            "amazon" => Ok(RetailerTag::Amazon),
            "flipkart" => Ok(RetailerTag::Flipkart),
            "reliance_digital" => Ok(RetailerTag::RelianceDigital),
            "apple" => Ok(RetailerTag::Apple),
            "vivo" => Ok(RetailerTag::Vivo),
            "iqoo" => Ok(RetailerTag::Iqoo),
            "oppo" => Ok(RetailerTag::Oppo),
            other => Err(UnknownRetailer(other.to_string())),
        }
    }
}
