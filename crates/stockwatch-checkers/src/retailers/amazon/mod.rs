//! Amazon Product Advertising API v5.
//!
//! Availability comes from the offer listing's availability message, the
//! only signal the API exposes without a cart session. Credentials are
//! optional at construction; a check without them fails with
//! [`CheckerError::MissingCredentials`] instead of being skipped silently.

mod sign;

use async_trait::async_trait;
use serde_json::{json, Value};

use stockwatch_core::{Listing, Pincode, Product, RetailerTag};

use crate::error::CheckerError;
use crate::http::{parse_json, read_text, send_checked};
use crate::Checker;

const DEFAULT_BASE_URL: &str = "https://webservices.amazon.in";
const DEFAULT_REGION: &str = "eu-west-1";
const MARKETPLACE: &str = "www.amazon.in";

#[derive(Debug, Clone)]
pub struct AmazonCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub partner_tag: String,
}

pub struct AmazonChecker {
    client: reqwest::Client,
    credentials: Option<AmazonCredentials>,
    base_url: String,
    host: String,
    region: String,
}

impl AmazonChecker {
    #[must_use]
    pub fn new(client: reqwest::Client, credentials: Option<AmazonCredentials>) -> Self {
        Self::with_base_url(client, credentials, DEFAULT_BASE_URL)
    }

    /// Point the checker at a different host. Intended for tests.
    #[must_use]
    pub fn with_base_url(
        client: reqwest::Client,
        credentials: Option<AmazonCredentials>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        // The signed host must match the authority reqwest sends the
        // request to, port included.
        let host = reqwest::Url::parse(&base_url)
            .ok()
            .and_then(|u| {
                u.host_str().map(|h| match u.port() {
                    Some(port) => format!("{h}:{port}"),
                    None => h.to_string(),
                })
            })
            .unwrap_or_default();

        Self {
            client,
            credentials,
            base_url,
            host,
            region: DEFAULT_REGION.to_string(),
        }
    }
}

#[async_trait]
impl Checker for AmazonChecker {
    fn retailer(&self) -> RetailerTag {
        RetailerTag::Amazon
    }

    async fn check(
        &self,
        product: &Product,
        _pincode: Option<&Pincode>,
    ) -> Result<Option<Listing>, CheckerError> {
        let credentials =
            self.credentials
                .as_ref()
                .ok_or(CheckerError::MissingCredentials {
                    retailer: RetailerTag::Amazon,
                })?;

        let payload = json!({
            "ItemIds": [product.source_product_id],
            "Resources": ["Offers.Listings.Availability.Message"],
            "PartnerTag": credentials.partner_tag,
            "PartnerType": "Associates",
            "Marketplace": MARKETPLACE,
        })
        .to_string();

        let url = format!("{}{}", self.base_url, sign::PATH);
        let mut request = self.client.post(&url).body(payload.clone());
        for (name, value) in sign::sign_get_items(
            &self.host,
            &self.region,
            &credentials.access_key_id,
            &credentials.secret_access_key,
            &payload,
            chrono::Utc::now(),
        ) {
            request = request.header(name, value);
        }

        let response = send_checked(request, &url).await?;
        let body = read_text(response, &url).await?;
        let data: Value = parse_json(
            &format!("amazon get-items for {}", product.source_product_id),
            &body,
        )?;

        parse_get_items(&data, product)
    }
}

fn parse_get_items(data: &Value, product: &Product) -> Result<Option<Listing>, CheckerError> {
    if let Some(errors) = data.get("Errors").and_then(Value::as_array) {
        if let Some(first) = errors.first() {
            let code = first.get("Code").and_then(Value::as_str).unwrap_or("Unknown");
            let message = first
                .get("Message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            return Err(CheckerError::Upstream {
                retailer: RetailerTag::Amazon,
                message: format!("{code}: {message}"),
            });
        }
    }

    let message = data
        .get("ItemsResult")
        .and_then(|v| v.get("Items"))
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(|item| item.get("Offers"))
        .and_then(|v| v.get("Listings"))
        .and_then(Value::as_array)
        .and_then(|listings| listings.first())
        .and_then(|listing| listing.get("Availability"))
        .and_then(|v| v.get("Message"))
        .and_then(Value::as_str);

    let available = message.is_some_and(|m| m.to_lowercase().contains("in stock"));

    Ok(available.then(|| Listing {
        title: product.name.clone(),
        price: None,
        pincode: None,
        link: product.alert_link().to_string(),
    }))
}
