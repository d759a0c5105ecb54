//! OPPO India mall gateway.
//!
//! One `detail/fetch` call returns every variant of a product code.
//! Tracked ids take the form `productCode:skuCode`; an id without a sku
//! part matches any purchasable variant.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use stockwatch_core::{Listing, Pincode, Product, RetailerTag};

use crate::error::CheckerError;
use crate::http::{parse_json, read_text, send_checked};
use crate::Checker;

const DEFAULT_BASE_URL: &str = "https://opsg-gateway-in.oppo.com";
const ON_SALE_STATUS: &str = "ON_SALE";

#[derive(Debug, Deserialize)]
struct DetailResponse {
    code: i64,
    msg: Option<String>,
    data: Option<DetailData>,
}

#[derive(Debug, Deserialize)]
struct DetailData {
    products: Option<Vec<OppoSku>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OppoSku {
    sku_code: Option<String>,
    name: Option<String>,
    sale_price: Option<String>,
    sell_status: Option<String>,
}

impl OppoSku {
    fn on_sale(&self) -> bool {
        self.sell_status.as_deref() == Some(ON_SALE_STATUS)
    }
}

/// One variant of an OPPO product code, as listed by the mall
/// gateway. Used for sku discovery when registering products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OppoVariant {
    pub sku_code: String,
    pub name: String,
}

pub struct OppoChecker {
    client: reqwest::Client,
    base_url: String,
}

impl OppoChecker {
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

    /// Lists the variants of a product code, for picking which
    /// sku to track.
    pub async fn variants(&self, product_code: &str) -> Result<Vec<OppoVariant>, CheckerError> {
        let skus = self.fetch_detail(product_code).await?;
        Ok(skus
            .into_iter()
            .filter_map(|sku| {
                Some(OppoVariant {
                    sku_code: sku.sku_code?,
                    name: sku.name?,
                })
            })
            .collect())
    }

    async fn fetch_detail(&self, product_code: &str) -> Result<Vec<OppoSku>, CheckerError> {
        let url = format!("{}/v2/api/rest/mall/product/detail/fetch", self.base_url);
        let payload = json!({
            "productCode": product_code,
            "userGroupName": "",
            "storeViewCode": "in",
            "configModule": 3,
            "settleChannel": 3,
        });

        let request = self
            .client
            .post(&url)
            .header("client-version", "13.0.0.0")
            .header("platform", "web")
            .header("language", "en-IN")
            .json(&payload);

        let response = send_checked(request, &url).await?;
        let body = read_text(response, &url).await?;
        let detail: DetailResponse =
            parse_json(&format!("oppo detail for {product_code}"), &body)?;

        if detail.code != 200 {
            return Err(CheckerError::Upstream {
                retailer: RetailerTag::Oppo,
                message: detail
                    .msg
                    .unwrap_or_else(|| format!("detail endpoint returned code {}", detail.code)),
            });
        }

        Ok(detail.data.and_then(|d| d.products).unwrap_or_default())
    }
}

#[async_trait]
impl Checker for OppoChecker {
    fn retailer(&self) -> RetailerTag {
        RetailerTag::Oppo
    }

    async fn check(
        &self,
        product: &Product,
        _pincode: Option<&Pincode>,
    ) -> Result<Option<Listing>, CheckerError> {
        let (product_code, sku_code) = split_tracked_id(&product.source_product_id);
        let skus = self.fetch_detail(product_code).await?;
        Ok(match_sku(&skus, sku_code, product))
    }
}

/// `P402GF01:402GF01AA01` tracks one variant; a bare `P402GF01` tracks
/// the whole product code.
fn split_tracked_id(source_product_id: &str) -> (&str, Option<&str>) {
    match source_product_id.split_once(':') {
        Some((code, sku)) if !sku.is_empty() => (code, Some(sku)),
        _ => (source_product_id, None),
    }
}

fn match_sku(skus: &[OppoSku], wanted: Option<&str>, product: &Product) -> Option<Listing> {
    let hit = skus.iter().find(|sku| {
        sku.on_sale()
            && wanted.is_none_or(|code| sku.sku_code.as_deref() == Some(code))
    })?;

    Some(Listing {
        title: hit
            .name
            .clone()
            .unwrap_or_else(|| product.name.clone()),
        price: hit
            .sale_price
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("₹{p}")),
        pincode: None,
        link: product.alert_link().to_string(),
    })
}
