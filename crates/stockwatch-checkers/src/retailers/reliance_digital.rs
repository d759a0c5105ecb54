//! Reliance Digital product-page JSON-LD.
//!
//! The product pages embed schema.org `Product` nodes whose offer
//! availability tracks the serviceability of the selected pincode.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use stockwatch_core::{Listing, Pincode, Product, RetailerTag};

use crate::error::CheckerError;
use crate::http::{read_text, send_checked};
use crate::Checker;

pub struct RelianceDigitalChecker {
    client: reqwest::Client,
}

impl RelianceDigitalChecker {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Checker for RelianceDigitalChecker {
    fn retailer(&self) -> RetailerTag {
        RetailerTag::RelianceDigital
    }

    async fn check(
        &self,
        product: &Product,
        pincode: Option<&Pincode>,
    ) -> Result<Option<Listing>, CheckerError> {
        let pincode = pincode.ok_or_else(|| CheckerError::InvalidProduct {
            retailer: RetailerTag::RelianceDigital,
            source_product_id: product.source_product_id.clone(),
            reason: "reliance digital checks require a pincode".to_string(),
        })?;

        let mut url =
            reqwest::Url::parse(&product.url).map_err(|e| CheckerError::InvalidProduct {
                retailer: RetailerTag::RelianceDigital,
                source_product_id: product.source_product_id.clone(),
                reason: format!("stored url does not parse: {e}"),
            })?;
        url.query_pairs_mut().append_pair("pincode", pincode.as_str());
        let url = url.to_string();

        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml");

        let response = send_checked(request, &url).await?;
        let body = read_text(response, &url).await?;

        Ok(classify_page(&body, product, pincode))
    }
}

fn classify_page(body: &str, product: &Product, pincode: &Pincode) -> Option<Listing> {
    let offer = extract_jsonld_blocks(body)
        .into_iter()
        .filter_map(|block| serde_json::from_str::<Value>(&block).ok())
        .flat_map(flatten_nodes)
        .filter(is_product_node)
        .find_map(|node| in_stock_offer(&node))?;

    Some(Listing {
        title: product.name.clone(),
        price: offer_price(&offer),
        pincode: Some(pincode.clone()),
        link: product.alert_link().to_string(),
    })
}

fn extract_jsonld_blocks(html: &str) -> Vec<String> {
    let pattern = Regex::new(
        r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#,
    )
    .expect("valid regex");

    pattern
        .captures_iter(html)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

/// A block may be a single node, an array of nodes, or a node holding a
/// `@graph` array.
fn flatten_nodes(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(ref map) => {
            if let Some(Value::Array(graph)) = map.get("@graph") {
                graph.clone()
            } else {
                vec![value]
            }
        }
        _ => Vec::new(),
    }
}

fn is_product_node(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case("product"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.eq_ignore_ascii_case("product")),
        _ => false,
    }
}

/// Returns the first offer on the node whose availability reads as in
/// stock, in either `https://schema.org/InStock` or bare `InStock` form.
fn in_stock_offer(node: &Value) -> Option<Value> {
    let offers = match node.get("offers") {
        Some(Value::Array(items)) => items.clone(),
        Some(offer @ Value::Object(_)) => vec![offer.clone()],
        _ => return None,
    };

    offers.into_iter().find(|offer| {
        offer
            .get("availability")
            .and_then(Value::as_str)
            .is_some_and(|a| a.to_lowercase().contains("instock"))
    })
}

fn offer_price(offer: &Value) -> Option<String> {
    match offer.get("price") {
        Some(Value::String(p)) if !p.is_empty() => Some(format!("₹{p}")),
        Some(Value::Number(p)) => Some(format!("₹{p}")),
        _ => None,
    }
}
