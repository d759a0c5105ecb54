//! Turns a storefront product URL into a trackable identity.
//!
//! Most storefronts encode the identifier in the URL itself; sku-based
//! shops (Apple, vivo, iQOO, OPPO) additionally need an explicit part or
//! sku code from the caller. Reliance Digital is the one asynchronous
//! case: its article id only appears in the rendered page.

use regex::Regex;
use reqwest::Url;
use thiserror::Error;

use stockwatch_core::RetailerTag;

use crate::error::CheckerError;
use crate::http::{read_text, send_checked};

/// Identity extracted for a product URL, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifiedProduct {
    pub name: String,
    pub source_product_id: String,
    pub retailer: RetailerTag,
}

#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("no supported storefront matches host {host}")]
    UnsupportedStore { host: String },

    #[error("url does not parse: {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{retailer} products need an explicit part or sku code")]
    MissingPartNumber { retailer: RetailerTag },

    #[error("cannot derive a product identifier from {url}: {reason}")]
    MissingIdentifier { url: String, reason: String },

    #[error("no article id found on {url}")]
    ArticleIdNotFound { url: String },

    #[error(transparent)]
    Fetch(#[from] CheckerError),
}

/// Identifies a product from its URL, fetching the page when the
/// storefront hides the identifier there.
pub async fn identify_product(
    client: &reqwest::Client,
    url: &str,
    part_number: Option<&str>,
) -> Result<IdentifiedProduct, IdentifyError> {
    match identify_from_url(url, part_number)? {
        Parsed::Complete(identified) => Ok(identified),
        Parsed::RelianceDigital { name } => {
            let article_id = resolve_reliance_article_id(client, url).await?;
            Ok(IdentifiedProduct {
                name,
                source_product_id: article_id,
                retailer: RetailerTag::RelianceDigital,
            })
        }
    }
}

#[derive(Debug)]
enum Parsed {
    Complete(IdentifiedProduct),
    /// Name is known from the slug; the article id needs a page fetch.
    RelianceDigital { name: String },
}

fn identify_from_url(raw: &str, part_number: Option<&str>) -> Result<Parsed, IdentifyError> {
    let url = Url::parse(raw).map_err(|e| IdentifyError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    let host = url.host_str().ok_or_else(|| IdentifyError::InvalidUrl {
        url: raw.to_string(),
        reason: "missing host".to_string(),
    })?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    if host_is(host, "reliancedigital.in") {
        let name = slug_name(&segments).unwrap_or_else(|| "product".to_string());
        return Ok(Parsed::RelianceDigital {
            name: format!("(R. Digital) {name}"),
        });
    }

    if host_is(host, "iqoo.com") {
        let sku = required_part(part_number, RetailerTag::Iqoo)?;
        let name = slug_name(&segments).unwrap_or_else(|| "iqoo product".to_string());
        return Ok(complete(format!("(iQOO) {name}"), sku, RetailerTag::Iqoo));
    }

    if host_is(host, "vivo.com") {
        let sku = required_part(part_number, RetailerTag::Vivo)?;
        let name = slug_name(&segments).unwrap_or_else(|| "vivo product".to_string());
        return Ok(complete(format!("(Vivo) {name}"), sku, RetailerTag::Vivo));
    }

    if host_is(host, "flipkart.com") {
        let pid = flipkart_pid(&url, &segments).ok_or_else(|| IdentifyError::MissingIdentifier {
            url: raw.to_string(),
            reason: "no pid parameter or itm segment".to_string(),
        })?;
        let name = segments
            .first()
            .map_or_else(|| "product".to_string(), |seg| words(seg));
        return Ok(complete(
            format!("(Flipkart) {name}"),
            pid,
            RetailerTag::Flipkart,
        ));
    }

    if host_is(host, "amazon.in") {
        let asin_pattern = Regex::new(r"/dp/([A-Z0-9]{10})(?:[/?]|$)").expect("valid regex");
        let asin = asin_pattern
            .captures(url.path())
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| IdentifyError::MissingIdentifier {
                url: raw.to_string(),
                reason: "no /dp/<ASIN> segment".to_string(),
            })?;
        let name = segments
            .iter()
            .position(|seg| *seg == "dp")
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| segments.get(i))
            .map_or_else(|| "amazon product".to_string(), |seg| words(seg));
        return Ok(complete(format!("(Amazon) {name}"), asin, RetailerTag::Amazon));
    }

    if host_is(host, "apple.com") {
        let part = required_part(part_number, RetailerTag::Apple)?;
        let name = segments
            .last()
            .map_or_else(|| "apple product".to_string(), |seg| words(seg));
        return Ok(complete(format!("(Apple) {name}"), part, RetailerTag::Apple));
    }

    if host_is(host, "croma.com") {
        let id = segments
            .last()
            .filter(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()))
            .map(ToString::to_string)
            .ok_or_else(|| IdentifyError::MissingIdentifier {
                url: raw.to_string(),
                reason: "last path segment is not a numeric product id".to_string(),
            })?;
        let name = segments
            .first()
            .map_or_else(|| "product".to_string(), |seg| words(seg));
        return Ok(complete(format!("(Croma) {name}"), id, RetailerTag::Croma));
    }

    if host_is(host, "oppo.com") {
        let code_pattern = Regex::new(r"(?i)\.P\.(P\d+)").expect("valid regex");
        let code = code_pattern
            .captures(raw)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| IdentifyError::MissingIdentifier {
                url: raw.to_string(),
                reason: "no .P.<product code> marker in url".to_string(),
            })?;
        let sku = required_part(part_number, RetailerTag::Oppo)?;
        let name = segments
            .last()
            .map(|seg| oppo_slug(seg))
            .unwrap_or_else(|| "oppo product".to_string());
        return Ok(complete(
            format!("(OPPO) {name}"),
            format!("{code}:{sku}"),
            RetailerTag::Oppo,
        ));
    }

    Err(IdentifyError::UnsupportedStore {
        host: host.to_string(),
    })
}

fn complete(name: String, source_product_id: String, retailer: RetailerTag) -> Parsed {
    Parsed::Complete(IdentifiedProduct {
        name,
        source_product_id,
        retailer,
    })
}

fn required_part(
    part_number: Option<&str>,
    retailer: RetailerTag,
) -> Result<String, IdentifyError> {
    part_number
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
        .ok_or(IdentifyError::MissingPartNumber { retailer })
}

fn host_is(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

fn words(segment: &str) -> String {
    segment.replace('-', " ")
}

/// Last path segment that reads as a product slug rather than a numeric
/// id or a routing word.
fn slug_name(segments: &[&str]) -> Option<String> {
    const NOISE: &[&str] = &["p", "dp", "in", "product", "products", "shop", "buy"];

    segments
        .iter()
        .rev()
        .find(|seg| {
            seg.chars().any(|c| c.is_ascii_alphabetic())
                && !NOISE.contains(&seg.to_lowercase().as_str())
        })
        .map(|seg| words(seg))
}

/// `find-x8.P.P402GF01.html` reads as `find x8`.
fn oppo_slug(segment: &str) -> String {
    let base = segment
        .split(".P.")
        .next()
        .unwrap_or(segment)
        .trim_end_matches(".html");
    words(base)
}

fn flipkart_pid(url: &Url, segments: &[&str]) -> Option<String> {
    if let Some((_, pid)) = url.query_pairs().find(|(key, _)| key == "pid") {
        if !pid.is_empty() {
            return Some(pid.into_owned());
        }
    }
    segments
        .iter()
        .rev()
        .find(|seg| seg.len() > 3 && seg.starts_with("itm"))
        .map(ToString::to_string)
}

/// Fetches a Reliance Digital product page and pulls its article id out of
/// the media paths.
pub async fn resolve_reliance_article_id(
    client: &reqwest::Client,
    url: &str,
) -> Result<String, IdentifyError> {
    let request = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml");
    let response = send_checked(request, url).await.map_err(IdentifyError::Fetch)?;
    let body = read_text(response, url).await.map_err(IdentifyError::Fetch)?;

    extract_article_id(&body).ok_or_else(|| IdentifyError::ArticleIdNotFound {
        url: url.to_string(),
    })
}

/// Nine-digit article ids ride in the media CDN paths, with the og:image
/// tag as the most stable carrier.
fn extract_article_id(body: &str) -> Option<String> {
    let og_image = Regex::new(
        r#"(?i)<meta[^>]+property=["']og:image["'][^>]+content=["']([^"']+)["']"#,
    )
    .expect("valid regex");
    let media_id = Regex::new(r"-(\d{9})-i-1").expect("valid regex");

    if let Some(caps) = og_image.captures(body) {
        if let Some(id) = media_id.captures(&caps[1]) {
            return Some(id[1].to_string());
        }
    }
    media_id.captures(body).map(|caps| caps[1].to_string())
}
