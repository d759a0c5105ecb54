//! AWS Signature Version 4 for Product Advertising API requests.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub(super) const SERVICE: &str = "ProductAdvertisingAPI";
pub(super) const TARGET: &str = "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.GetItems";
pub(super) const PATH: &str = "/paapi5/getitems";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-encoding;content-type;host;x-amz-date;x-amz-target";
const CONTENT_TYPE: &str = "application/json; charset=utf-8";
const CONTENT_ENCODING: &str = "amz-1.0";

/// Builds the signed header set for a `GetItems` POST.
///
/// The host header itself is derived by the HTTP client from the request
/// URL, so `host` here must be the same authority the request is sent to,
/// port included.
pub(super) fn sign_get_items(
    host: &str,
    region: &str,
    access_key_id: &str,
    secret_access_key: &str,
    payload: &str,
    now: DateTime<Utc>,
) -> Vec<(&'static str, String)> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    let canonical_headers = format!(
        "content-encoding:{CONTENT_ENCODING}\ncontent-type:{CONTENT_TYPE}\n\
         host:{host}\nx-amz-date:{amz_date}\nx-amz-target:{TARGET}\n"
    );
    let canonical_request = format!(
        "POST\n{PATH}\n\n{canonical_headers}\n{SIGNED_HEADERS}\n{}",
        sha256_hex(payload.as_bytes())
    );

    let credential_scope = format!("{date_stamp}/{region}/{SERVICE}/aws4_request");
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{credential_scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let mut key = hmac_sha256(
        format!("AWS4{secret_access_key}").as_bytes(),
        date_stamp.as_bytes(),
    );
    key = hmac_sha256(&key, region.as_bytes());
    key = hmac_sha256(&key, SERVICE.as_bytes());
    key = hmac_sha256(&key, b"aws4_request");
    let signature = hex(&hmac_sha256(&key, string_to_sign.as_bytes()));

    let authorization = format!(
        "{ALGORITHM} Credential={access_key_id}/{credential_scope}, \
         SignedHeaders={SIGNED_HEADERS}, Signature={signature}"
    );

    vec![
        ("content-encoding", CONTENT_ENCODING.to_string()),
        ("content-type", CONTENT_TYPE.to_string()),
        ("x-amz-date", amz_date),
        ("x-amz-target", TARGET.to_string()),
        ("authorization", authorization),
    ]
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex(&Sha256::digest(data))
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn hex_encodes_lowercase() {
        assert_eq!(hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn sha256_hex_matches_empty_input_digest() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hmac_sha256_matches_rfc_4231_case_one() {
        let key = [0x0b_u8; 20];
        let tag = hex(&hmac_sha256(&key, b"Hi There"));
        assert_eq!(
            tag,
            "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7"
        );
    }

    #[test]
    fn sign_get_items_is_deterministic_and_well_formed() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let headers = sign_get_items(
            "webservices.amazon.in",
            "eu-west-1",
            "AKIAEXAMPLE",
            "secret",
            r#"{"ItemIds":["B0EXAMPLE"]}"#,
            now,
        );

        let again = sign_get_items(
            "webservices.amazon.in",
            "eu-west-1",
            "AKIAEXAMPLE",
            "secret",
            r#"{"ItemIds":["B0EXAMPLE"]}"#,
            now,
        );
        assert_eq!(headers, again);

        let amz_date = headers
            .iter()
            .find(|(name, _)| *name == "x-amz-date")
            .map(|(_, value)| value.as_str())
            .expect("x-amz-date present");
        assert_eq!(amz_date, "20260314T092653Z");

        let authorization = headers
            .iter()
            .find(|(name, _)| *name == "authorization")
            .map(|(_, value)| value.as_str())
            .expect("authorization present");
        assert!(authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIAEXAMPLE/20260314/eu-west-1/ProductAdvertisingAPI/aws4_request"
        ));
        assert!(authorization.contains(
            "SignedHeaders=content-encoding;content-type;host;x-amz-date;x-amz-target"
        ));

        let signature = authorization
            .rsplit("Signature=")
            .next()
            .expect("signature suffix");
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_changes_with_the_payload() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let a = sign_get_items("h", "eu-west-1", "k", "s", "payload-a", now);
        let b = sign_get_items("h", "eu-west-1", "k", "s", "payload-b", now);
        assert_ne!(a, b);
    }
}
