use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::domain::Product;
use crate::retailer::RetailerTag;
use crate::ConfigError;

/// One statically defined product, outside the catalog. Used for retailers
/// whose launch-window sets are pinned in config rather than managed rows.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticProductEntry {
    pub name: String,
    pub url: String,
    /// Same meaning as `Product::source_product_id`; for SKU-based
    /// storefronts this is `product_code:sku_code`.
    pub product_id: String,
    pub affiliate_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StaticProductsFile {
    pub retailers: BTreeMap<RetailerTag, Vec<StaticProductEntry>>,
}

impl StaticProductsFile {
    /// Products defined for one retailer, as domain values. Empty when the
    /// file has no section for the tag.
    #[must_use]
    pub fn products_for(&self, tag: RetailerTag) -> Vec<Product> {
        self.retailers
            .get(&tag)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| Product {
                        name: e.name.clone(),
                        url: e.url.clone(),
                        source_product_id: e.product_id.clone(),
                        retailer: tag,
                        affiliate_url: e.affiliate_url.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Load and validate the static products configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_static_products(path: &Path) -> Result<StaticProductsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StaticProductsIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: StaticProductsFile = serde_yaml::from_str(&content)?;

    validate_static_products(&file)?;

    Ok(file)
}

fn validate_static_products(file: &StaticProductsFile) -> Result<(), ConfigError> {
    for (tag, entries) in &file.retailers {
        let mut seen_ids = HashSet::new();
        for entry in entries {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "static product for {tag} has an empty name"
                )));
            }
            if entry.url.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "static product '{}' for {tag} has an empty url",
                    entry.name
                )));
            }
            if entry.product_id.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "static product '{}' for {tag} has an empty product_id",
                    entry.name
                )));
            }
            if !seen_ids.insert(entry.product_id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate static product_id '{}' for {tag}",
                    entry.product_id
                )));
            }
        }
    }
    Ok(())
}
