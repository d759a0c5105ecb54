//! Flipkart product-page markers.
//!
//! Flipkart has no public availability API, so this checker fetches the
//! product page scoped to a pincode and looks for the storefront's own
//! call-to-action strings. Unavailability markers win over purchase
//! markers so a "notify me" page with a cached buy button never alerts.

use async_trait::async_trait;
use regex::Regex;

use stockwatch_core::{Listing, Pincode, Product, RetailerTag};

use crate::error::CheckerError;
use crate::http::{read_text, send_checked};
use crate::Checker;

const UNAVAILABLE_MARKERS: &[&str] = &["notify me", "currently unavailable", "sold out"];
const PURCHASE_MARKERS: &[&str] = &["add to cart", "buy now"];

/// Fetches the stored product URL with a `pincode` query parameter and
/// classifies the rendered page.
pub struct FlipkartChecker {
    client: reqwest::Client,
}

impl FlipkartChecker {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Checker for FlipkartChecker {
    fn retailer(&self) -> RetailerTag {
        RetailerTag::Flipkart
    }

    async fn check(
        &self,
        product: &Product,
        pincode: Option<&Pincode>,
    ) -> Result<Option<Listing>, CheckerError> {
        let pincode = pincode.ok_or_else(|| CheckerError::InvalidProduct {
            retailer: RetailerTag::Flipkart,
            source_product_id: product.source_product_id.clone(),
            reason: "flipkart checks require a pincode".to_string(),
        })?;

        let mut url =
            reqwest::Url::parse(&product.url).map_err(|e| CheckerError::InvalidProduct {
                retailer: RetailerTag::Flipkart,
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
    let haystack = body.to_lowercase();

    if UNAVAILABLE_MARKERS.iter().any(|m| haystack.contains(m)) {
        return None;
    }
    if !PURCHASE_MARKERS.iter().any(|m| haystack.contains(m)) {
        // Unrecognised page layout reads as out of stock rather than a
        // false-positive alert.
        return None;
    }

    Some(Listing {
        title: product.name.clone(),
        price: extract_price(body),
        pincode: Some(pincode.clone()),
        link: product.alert_link().to_string(),
    })
}

fn extract_price(body: &str) -> Option<String> {
    let pattern = Regex::new(r"₹\s*([0-9][0-9,]*)").expect("valid regex");
    pattern
        .captures(body)
        .map(|caps| format!("₹{}", &caps[1]))
}
