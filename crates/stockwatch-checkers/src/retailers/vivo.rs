//! vivo and iQOO shop stock API.
//!
//! Both storefronts run the same shop platform, so one checker serves
//! either brand with a different host and retailer tag.

use async_trait::async_trait;
use serde::Deserialize;

use stockwatch_core::{Listing, Pincode, Product, RetailerTag};

use crate::error::CheckerError;
use crate::http::{parse_json, read_text, send_checked};
use crate::Checker;

const VIVO_BASE_URL: &str = "https://shop.vivo.com";
const IQOO_BASE_URL: &str = "https://www.iqoo.com";

const IN_STOCK_STATE: &str = "IN_STOCK";

#[derive(Debug, Deserialize)]
struct StockResponse {
    code: i64,
    msg: Option<String>,
    data: Option<StockData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StockData {
    stock_state: Option<String>,
    sale_price: Option<String>,
}

pub struct VivoShopChecker {
    client: reqwest::Client,
    retailer: RetailerTag,
    base_url: String,
}

impl VivoShopChecker {
    #[must_use]
    pub fn vivo(client: reqwest::Client) -> Self {
        Self::with_base_url(client, RetailerTag::Vivo, VIVO_BASE_URL)
    }

    #[must_use]
    pub fn iqoo(client: reqwest::Client) -> Self {
        Self::with_base_url(client, RetailerTag::Iqoo, IQOO_BASE_URL)
    }

    /// Point the checker at a different host. Intended for tests.
    #[must_use]
    pub fn with_base_url(
        client: reqwest::Client,
        retailer: RetailerTag,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            retailer,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Checker for VivoShopChecker {
    fn retailer(&self) -> RetailerTag {
        self.retailer
    }

    async fn check(
        &self,
        product: &Product,
        _pincode: Option<&Pincode>,
    ) -> Result<Option<Listing>, CheckerError> {
        let url = format!("{}/in/api/v2/product/stock", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("skuId", product.source_product_id.as_str())]);

        let response = send_checked(request, &url).await?;
        let body = read_text(response, &url).await?;
        let stock: StockResponse = parse_json(
            &format!("{} stock for sku {}", self.retailer, product.source_product_id),
            &body,
        )?;

        if stock.code != 200 {
            return Err(CheckerError::Upstream {
                retailer: self.retailer,
                message: stock
                    .msg
                    .unwrap_or_else(|| format!("stock endpoint returned code {}", stock.code)),
            });
        }

        Ok(parse_stock(stock.data.as_ref(), product))
    }
}

fn parse_stock(data: Option<&StockData>, product: &Product) -> Option<Listing> {
    let data = data?;
    let in_stock = data
        .stock_state
        .as_deref()
        .is_some_and(|state| state == IN_STOCK_STATE);

    in_stock.then(|| Listing {
        title: product.name.clone(),
        price: data
            .sale_price
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("₹{p}")),
        pincode: None,
        link: product.alert_link().to_string(),
    })
}
