//! Wires every supported storefront to a checker and a product source.

use std::collections::BTreeMap;
use std::sync::Arc;

use stockwatch_core::{AppConfig, Product, RetailerTag, StaticProductsFile};

use crate::error::CheckerError;
use crate::http::build_http_client;
use crate::retailers::{
    AmazonChecker, AmazonCredentials, AppleChecker, CromaChecker, FlipkartChecker, OppoChecker,
    RelianceDigitalChecker, VivoShopChecker,
};
use crate::Checker;

/// Where a retailer's tracked products come from.
#[derive(Debug, Clone)]
pub enum ProductSource {
    /// The shared catalog, filtered to this retailer.
    Catalog,
    /// A fixed set loaded from the static products file at startup.
    Static(Vec<Product>),
}

pub struct RetailerEntry {
    pub checker: Arc<dyn Checker>,
    /// Location-aware checkers walk the configured pincodes; the rest get
    /// a single check without one.
    pub location_aware: bool,
    pub source: ProductSource,
}

/// The full set of retailers a run fans out over, keyed by tag.
#[derive(Default)]
pub struct CheckerRegistry {
    entries: BTreeMap<RetailerTag, RetailerEntry>,
}

impl CheckerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entry under its checker's own tag, replacing any
    /// previous entry for that tag.
    pub fn insert(&mut self, entry: RetailerEntry) {
        self.entries.insert(entry.checker.retailer(), entry);
    }

    #[must_use]
    pub fn get(&self, tag: RetailerTag) -> Option<&RetailerEntry> {
        self.entries.get(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RetailerTag, &RetailerEntry)> {
        self.entries.iter().map(|(tag, entry)| (*tag, entry))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds the production registry: one shared HTTP client, every supported
/// retailer registered, product sources resolved from configuration.
///
/// Amazon is registered even without credentials so that its products
/// surface as failed checks rather than silently vanishing from runs.
pub fn build_registry(
    config: &AppConfig,
    static_products: Option<&StaticProductsFile>,
) -> Result<CheckerRegistry, CheckerError> {
    let client = build_http_client(config.check_timeout_secs, &config.http_user_agent)?;
    let amazon_credentials = amazon_credentials(config);

    let source_for = |tag: RetailerTag| -> ProductSource {
        if config.static_retailers.contains(&tag) {
            let products = static_products
                .map(|file| file.products_for(tag))
                .unwrap_or_default();
            if products.is_empty() {
                tracing::warn!(
                    retailer = %tag,
                    "static product source configured but no entries loaded"
                );
            }
            ProductSource::Static(products)
        } else {
            ProductSource::Catalog
        }
    };

    let mut registry = CheckerRegistry::new();
    for tag in RetailerTag::ALL {
        let checker: Arc<dyn Checker> = match tag {
            RetailerTag::Croma => Arc::new(CromaChecker::new(client.clone())),
            RetailerTag::Amazon => Arc::new(AmazonChecker::new(
                client.clone(),
                amazon_credentials.clone(),
            )),
            RetailerTag::Flipkart => Arc::new(FlipkartChecker::new(client.clone())),
            RetailerTag::RelianceDigital => {
                Arc::new(RelianceDigitalChecker::new(client.clone()))
            }
            RetailerTag::Apple => Arc::new(AppleChecker::new(client.clone())),
            RetailerTag::Vivo => Arc::new(VivoShopChecker::vivo(client.clone())),
            RetailerTag::Iqoo => Arc::new(VivoShopChecker::iqoo(client.clone())),
            RetailerTag::Oppo => Arc::new(OppoChecker::new(client.clone())),
        };

        registry.insert(RetailerEntry {
            checker,
            location_aware: is_location_aware(tag),
            source: source_for(tag),
        });
    }

    Ok(registry)
}

/// Whether availability at this storefront depends on the delivery pincode.
#[must_use]
pub fn is_location_aware(tag: RetailerTag) -> bool {
    matches!(
        tag,
        RetailerTag::Croma
            | RetailerTag::Flipkart
            | RetailerTag::RelianceDigital
            | RetailerTag::Apple
    )
}

fn amazon_credentials(config: &AppConfig) -> Option<AmazonCredentials> {
    match (
        &config.amazon_access_key_id,
        &config.amazon_secret_access_key,
        &config.amazon_partner_tag,
    ) {
        (Some(access_key_id), Some(secret_access_key), Some(partner_tag)) => {
            Some(AmazonCredentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                partner_tag: partner_tag.clone(),
            })
        }
        (None, None, None) => None,
        _ => {
            tracing::warn!(
                "amazon credentials are partially configured; amazon checks will fail \
                 until the access key, secret key, and partner tag are all set"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use stockwatch_core::{Environment, StaticProductEntry};

    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/stockwatch_test".to_string(),
            env: Environment::Test,
            bind_addr: "127.0.0.1:0".parse().expect("valid addr"),
            log_level: "info".to_string(),
            pincodes: vec![stockwatch_core::Pincode::new("110001")],
            max_concurrent_retailers: 10,
            check_timeout_secs: 15,
            http_user_agent: "stockwatch-test/0".to_string(),
            check_schedule: None,
            alert_threads: HashMap::new(),
            retailer_emoji: HashMap::new(),
            static_retailers: Vec::new(),
            static_products_path: "./config/static_products.yaml".into(),
            telegram_bot_token: None,
            telegram_chat_id: None,
            amazon_access_key_id: None,
            amazon_secret_access_key: None,
            amazon_partner_tag: None,
            db_max_connections: 10,
            db_min_connections: 1,
            db_acquire_timeout_secs: 10,
        }
    }

    #[test]
    fn build_registry_covers_every_retailer() {
        let registry = build_registry(&test_config(), None).expect("registry builds");

        assert_eq!(registry.len(), RetailerTag::ALL.len());
        for tag in RetailerTag::ALL {
            let entry = registry.get(tag).expect("entry registered");
            assert_eq!(entry.checker.retailer(), tag);
            assert!(matches!(entry.source, ProductSource::Catalog));
        }
    }

    #[test]
    fn location_awareness_matches_the_storefronts() {
        let registry = build_registry(&test_config(), None).expect("registry builds");

        let aware: Vec<RetailerTag> = registry
            .iter()
            .filter(|(_, entry)| entry.location_aware)
            .map(|(tag, _)| tag)
            .collect();
        assert_eq!(
            aware,
            vec![
                RetailerTag::Croma,
                RetailerTag::Flipkart,
                RetailerTag::RelianceDigital,
                RetailerTag::Apple,
            ]
        );
    }

    #[test]
    fn static_retailers_pull_products_from_the_file() {
        let mut config = test_config();
        config.static_retailers = vec![RetailerTag::Oppo];

        let mut file = StaticProductsFile::default();
        file.retailers.insert(
            RetailerTag::Oppo,
            vec![StaticProductEntry {
                name: "Find X8".to_string(),
                url: "https://www.oppo.com/in/find-x8.P.P402GF01.html".to_string(),
                product_id: "P402GF01:402GF01AA01".to_string(),
                affiliate_url: None,
            }],
        );

        let registry = build_registry(&config, Some(&file)).expect("registry builds");
        let entry = registry.get(RetailerTag::Oppo).expect("oppo registered");
        match &entry.source {
            ProductSource::Static(products) => {
                assert_eq!(products.len(), 1);
                assert_eq!(products[0].source_product_id, "P402GF01:402GF01AA01");
            }
            ProductSource::Catalog => panic!("expected static source"),
        }
    }

    #[test]
    fn static_retailer_without_file_gets_an_empty_set() {
        let mut config = test_config();
        config.static_retailers = vec![RetailerTag::Vivo];

        let registry = build_registry(&config, None).expect("registry builds");
        let entry = registry.get(RetailerTag::Vivo).expect("vivo registered");
        assert!(
            matches!(&entry.source, ProductSource::Static(products) if products.is_empty()),
            "expected empty static source"
        );
    }
}
