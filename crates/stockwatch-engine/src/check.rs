//! Per-product check execution and alert line formatting.

use std::sync::Arc;

use stockwatch_checkers::{outcome, CheckOutcome, Checker};
use stockwatch_core::{Listing, Pincode, Product, RetailerResult, RetailerTag};

/// Checks one product, walking the configured pincodes for location-aware
/// retailers.
///
/// Pincodes are tried in order and the walk stops at the first listing; a
/// product unavailable at the first pincode still gets its chance at the
/// rest. When every pincode either failed or answered "not available" and
/// at least one failed, the product counts as failed, not as out of stock.
pub async fn check_with_fallback(
    checker: &dyn Checker,
    product: &Product,
    location_aware: bool,
    pincodes: &[Pincode],
) -> CheckOutcome {
    if !location_aware {
        return outcome(checker, product, None).await;
    }

    if pincodes.is_empty() {
        tracing::warn!(
            retailer = %checker.retailer(),
            product = %product.name,
            "no pincodes configured for a location-aware retailer"
        );
        return CheckOutcome::NotAvailable;
    }

    let mut last_failure = None;
    for pincode in pincodes {
        match outcome(checker, product, Some(pincode)).await {
            CheckOutcome::Found(listing) => return CheckOutcome::Found(listing),
            CheckOutcome::NotAvailable => {}
            CheckOutcome::Failed(e) => {
                tracing::warn!(
                    retailer = %checker.retailer(),
                    product = %product.name,
                    pincode = %pincode,
                    error = %e,
                    "check failed at one pincode, trying the next"
                );
                last_failure = Some(e);
            }
        }
    }

    match last_failure {
        Some(e) => CheckOutcome::Failed(e),
        None => CheckOutcome::NotAvailable,
    }
}

/// Runs one retailer's product list sequentially and tallies the results.
/// This is the unit of work the engine fans out per retailer.
pub(crate) async fn run_retailer(
    checker: Arc<dyn Checker>,
    tag: RetailerTag,
    location_aware: bool,
    products: Vec<Product>,
    pincodes: Vec<Pincode>,
) -> RetailerResult {
    let total = u32::try_from(products.len()).unwrap_or(u32::MAX);
    let mut found = 0;
    let mut lines = Vec::new();

    for product in &products {
        match check_with_fallback(checker.as_ref(), product, location_aware, &pincodes).await {
            CheckOutcome::Found(listing) => {
                tracing::info!(
                    retailer = %tag,
                    product = %product.name,
                    pincode = listing.pincode.as_ref().map(Pincode::as_str),
                    "product in stock"
                );
                found += 1;
                lines.push(format_alert_line(tag, &listing));
            }
            CheckOutcome::NotAvailable => {
                tracing::debug!(retailer = %tag, product = %product.name, "not available");
            }
            CheckOutcome::Failed(e) => {
                tracing::warn!(
                    retailer = %tag,
                    product = %product.name,
                    error = %e,
                    "availability check failed"
                );
            }
        }
    }

    RetailerResult {
        retailer: tag,
        total,
        found,
        lines,
    }
}

/// One alert line:
/// `✅ *In Stock at Croma (110001)*` followed by the linked title, with the
/// price appended when the retailer reported one.
pub(crate) fn format_alert_line(tag: RetailerTag, listing: &Listing) -> String {
    let location = listing
        .pincode
        .as_ref()
        .map(|p| format!(" ({p})"))
        .unwrap_or_default();

    let mut line = format!(
        "✅ *In Stock at {}{location}*\n[{}]({})",
        tag.display_name(),
        listing.title,
        listing.link
    );
    if let Some(price) = &listing.price {
        line.push_str(&format!(" at {price}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(pincode: Option<&str>, price: Option<&str>) -> Listing {
        Listing {
            title: "Pixel Buds Pro 2".to_string(),
            price: price.map(str::to_string),
            pincode: pincode.map(Pincode::new),
            link: "https://example.com/p/1".to_string(),
        }
    }

    #[test]
    fn alert_line_carries_the_answering_pincode() {
        let line = format_alert_line(RetailerTag::Croma, &listing(Some("110001"), None));
        assert_eq!(
            line,
            "✅ *In Stock at Croma (110001)*\n[Pixel Buds Pro 2](https://example.com/p/1)"
        );
    }

    #[test]
    fn alert_line_without_location_or_price_is_bare() {
        let line = format_alert_line(RetailerTag::Oppo, &listing(None, None));
        assert_eq!(
            line,
            "✅ *In Stock at OPPO*\n[Pixel Buds Pro 2](https://example.com/p/1)"
        );
    }

    #[test]
    fn alert_line_appends_the_price() {
        let line = format_alert_line(RetailerTag::Flipkart, &listing(Some("560001"), Some("₹19,999")));
        assert_eq!(
            line,
            "✅ *In Stock at Flipkart (560001)*\n[Pixel Buds Pro 2](https://example.com/p/1) at ₹19,999"
        );
    }
}
