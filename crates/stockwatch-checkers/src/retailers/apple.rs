//! Apple India store fulfillment API.

use async_trait::async_trait;

use stockwatch_core::{Listing, Pincode, Product, RetailerTag};

use crate::error::CheckerError;
use crate::http::{parse_json, read_text, send_checked};
use crate::Checker;

const DEFAULT_BASE_URL: &str = "https://www.apple.com";

/// Queries the storefront fulfillment-messages endpoint for one part number
/// at one pincode and reads the buyability flag out of the delivery message.
pub struct AppleChecker {
    client: reqwest::Client,
    base_url: String,
}

impl AppleChecker {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Point the checker at a different host. Intended for tests.
    #[must_use]
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Checker for AppleChecker {
    fn retailer(&self) -> RetailerTag {
        RetailerTag::Apple
    }

    async fn check(
        &self,
        product: &Product,
        pincode: Option<&Pincode>,
    ) -> Result<Option<Listing>, CheckerError> {
        let pincode = pincode.ok_or_else(|| CheckerError::InvalidProduct {
            retailer: RetailerTag::Apple,
            source_product_id: product.source_product_id.clone(),
            reason: "apple checks require a pincode".to_string(),
        })?;

        let url = format!("{}/in/shop/fulfillment-messages", self.base_url);
        let request = self.client.get(&url).query(&[
            ("parts.0", product.source_product_id.as_str()),
            ("location", pincode.as_str()),
            ("mts.0", "regular"),
        ]);

        let response = send_checked(request, &url).await?;
        let body = read_text(response, &url).await?;
        let data: serde_json::Value = parse_json(
            &format!(
                "apple fulfillment for part {}",
                product.source_product_id
            ),
            &body,
        )?;

        Ok(parse_fulfillment(&data, product, pincode))
    }
}

fn parse_fulfillment(
    data: &serde_json::Value,
    product: &Product,
    pincode: &Pincode,
) -> Option<Listing> {
    let buyable = data
        .get("body")
        .and_then(|v| v.get("content"))
        .and_then(|v| v.get("deliveryMessage"))
        .and_then(|v| v.get(&product.source_product_id))
        .and_then(|v| v.get("buyability"))
        .and_then(|v| v.get("isBuyable"))
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);

    buyable.then(|| Listing {
        title: product.name.clone(),
        price: None,
        pincode: Some(pincode.clone()),
        link: product.alert_link().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product() -> Product {
        Product {
            name: "iPhone 16 Pro 256GB".to_string(),
            url: "https://www.apple.com/in/shop/buy-iphone/iphone-16-pro".to_string(),
            source_product_id: "MYWX3HN/A".to_string(),
            retailer: RetailerTag::Apple,
            affiliate_url: None,
        }
    }

    #[test]
    fn parse_fulfillment_buyable_part_is_found() {
        let data: serde_json::Value = serde_json::from_str(
            r#"{
                "body": {
                    "content": {
                        "deliveryMessage": {
                            "MYWX3HN/A": {
                                "buyability": {"isBuyable": true, "reason": "ATS"}
                            },
                            "geoLocated": false
                        }
                    }
                }
            }"#,
        )
        .expect("fixture parses");

        let listing = parse_fulfillment(&data, &make_product(), &Pincode::new("110001"))
            .expect("expected a listing");
        assert_eq!(listing.title, "iPhone 16 Pro 256GB");
        assert_eq!(listing.pincode, Some(Pincode::new("110001")));
    }

    #[test]
    fn parse_fulfillment_unbuyable_part_is_not_available() {
        let data: serde_json::Value = serde_json::from_str(
            r#"{
                "body": {
                    "content": {
                        "deliveryMessage": {
                            "MYWX3HN/A": {"buyability": {"isBuyable": false}}
                        }
                    }
                }
            }"#,
        )
        .expect("fixture parses");

        assert!(parse_fulfillment(&data, &make_product(), &Pincode::new("110001")).is_none());
    }

    #[test]
    fn parse_fulfillment_missing_part_is_not_available() {
        let data: serde_json::Value =
            serde_json::from_str(r#"{"body": {"content": {"deliveryMessage": {}}}}"#)
                .expect("fixture parses");

        assert!(parse_fulfillment(&data, &make_product(), &Pincode::new("110001")).is_none());
    }
}
