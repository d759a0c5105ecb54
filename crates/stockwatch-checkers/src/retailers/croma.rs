//! Croma inventory promise API.

use async_trait::async_trait;
use serde_json::json;

use stockwatch_core::{Listing, Pincode, Product, RetailerTag};

use crate::error::CheckerError;
use crate::http::{parse_json, read_text, send_checked};
use crate::Checker;

const DEFAULT_BASE_URL: &str = "https://api.croma.com";
const STOREFRONT_ORIGIN: &str = "https://www.croma.com";
// Publishable key the storefront PWA sends with every promise call.
const OMS_SUBSCRIPTION_KEY: &str = "1131858141634e2abe2efb2b3a2a2a5d";

/// Asks the order-management promise endpoint whether home delivery can be
/// promised for one item at one pincode.
pub struct CromaChecker {
    client: reqwest::Client,
    base_url: String,
}

impl CromaChecker {
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
impl Checker for CromaChecker {
    fn retailer(&self) -> RetailerTag {
        RetailerTag::Croma
    }

    async fn check(
        &self,
        product: &Product,
        pincode: Option<&Pincode>,
    ) -> Result<Option<Listing>, CheckerError> {
        let pincode = pincode.ok_or_else(|| CheckerError::InvalidProduct {
            retailer: RetailerTag::Croma,
            source_product_id: product.source_product_id.clone(),
            reason: "croma checks require a pincode".to_string(),
        })?;

        let url = format!("{}/inventory/oms/v2/tms/details-pwa/", self.base_url);

        let payload = json!({
            "promise": {
                "allocationRuleID": "SYSTEM",
                "checkInventory": "Y",
                "organizationCode": "CROMA",
                "sourcingClassification": "EC",
                "promiseLines": {
                    "promiseLine": [{
                        "fulfillmentType": "HDEL",
                        "itemID": product.source_product_id,
                        "lineId": "1",
                        "requiredQty": "1",
                        "shipToAddress": { "zipCode": pincode.as_str() },
                        "extn": { "widerStoreFlag": "N" }
                    }]
                }
            }
        });

        let request = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("oms-apim-subscription-key", OMS_SUBSCRIPTION_KEY)
            .header(reqwest::header::ORIGIN, STOREFRONT_ORIGIN)
            .header(reqwest::header::REFERER, format!("{STOREFRONT_ORIGIN}/"))
            .json(&payload);

        let response = send_checked(request, &url).await?;
        let body = read_text(response, &url).await?;
        let data: serde_json::Value = parse_json(
            &format!("croma promise for item {}", product.source_product_id),
            &body,
        )?;

        Ok(parse_promise(&data, product, pincode))
    }
}

/// A fulfilable promise line means the item can actually ship to the
/// pincode; an empty or absent `promiseLine` means it cannot.
fn parse_promise(data: &serde_json::Value, product: &Product, pincode: &Pincode) -> Option<Listing> {
    let promised = data
        .get("promise")
        .and_then(|v| v.get("suggestedOption"))
        .and_then(|v| v.get("option"))
        .and_then(|v| v.get("promiseLines"))
        .and_then(|v| v.get("promiseLine"))
        .and_then(serde_json::Value::as_array)
        .is_some_and(|lines| !lines.is_empty());

    promised.then(|| Listing {
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
            name: "Croma 55 inch QLED TV".to_string(),
            url: "https://www.croma.com/croma-55-inch-qled/p/272418".to_string(),
            source_product_id: "272418".to_string(),
            retailer: RetailerTag::Croma,
            affiliate_url: None,
        }
    }

    #[test]
    fn parse_promise_with_fulfilable_line_is_found() {
        let data: serde_json::Value = serde_json::from_str(
            r#"{
                "promise": {
                    "suggestedOption": {
                        "option": {
                            "promiseLines": {
                                "promiseLine": [{"itemID": "272418", "lineId": "1"}]
                            }
                        }
                    }
                }
            }"#,
        )
        .expect("fixture parses");

        let listing = parse_promise(&data, &make_product(), &Pincode::new("110001"))
            .expect("expected a listing");
        assert_eq!(listing.pincode, Some(Pincode::new("110001")));
        assert_eq!(
            listing.link,
            "https://www.croma.com/croma-55-inch-qled/p/272418"
        );
    }

    #[test]
    fn parse_promise_with_empty_lines_is_not_available() {
        let data: serde_json::Value = serde_json::from_str(
            r#"{"promise": {"suggestedOption": {"option": {"promiseLines": {"promiseLine": []}}}}}"#,
        )
        .expect("fixture parses");

        assert!(parse_promise(&data, &make_product(), &Pincode::new("110001")).is_none());
    }

    #[test]
    fn parse_promise_without_suggested_option_is_not_available() {
        let data: serde_json::Value =
            serde_json::from_str(r#"{"promise": {}}"#).expect("fixture parses");

        assert!(parse_promise(&data, &make_product(), &Pincode::new("110001")).is_none());
    }
}
