//! Integration tests for the run orchestrator.
//!
//! Checkers are scripted in-process so no storefront traffic is made;
//! Telegram goes through `wiremock`. The scenarios pin the run semantics:
//! pincode fallback order, per-retailer batching, sum merging, and the
//! degraded paths (check failure, task panic, catalog failure).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockwatch_checkers::{
    CheckOutcome, Checker, CheckerError, CheckerRegistry, ProductSource, RetailerEntry,
};
use stockwatch_core::{
    CatalogError, CatalogSource, Listing, Pincode, Product, RetailerTag,
};
use stockwatch_engine::{check_with_fallback, AlertDispatcher, Engine};
use stockwatch_notify::TelegramNotifier;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Script {
    Found { price: Option<&'static str> },
    NotAvailable,
    Fail,
    Panic,
}

/// A checker whose answers are keyed by (product id, pincode). Unknown
/// combinations answer "not available". Every call is recorded.
struct ScriptedChecker {
    retailer: RetailerTag,
    responses: HashMap<(String, Option<String>), Script>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedChecker {
    fn new(
        retailer: RetailerTag,
        responses: &[(&str, Option<&str>, Script)],
    ) -> Arc<Self> {
        Arc::new(Self {
            retailer,
            responses: responses
                .iter()
                .map(|(id, pin, script)| {
                    (
                        ((*id).to_string(), pin.map(str::to_string)),
                        script.clone(),
                    )
                })
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl Checker for ScriptedChecker {
    fn retailer(&self) -> RetailerTag {
        self.retailer
    }

    async fn check(
        &self,
        product: &Product,
        pincode: Option<&Pincode>,
    ) -> Result<Option<Listing>, CheckerError> {
        let key = (
            product.source_product_id.clone(),
            pincode.map(|p| p.as_str().to_string()),
        );
        self.calls.lock().expect("calls lock").push(key.clone());

        match self.responses.get(&key) {
            Some(Script::Found { price }) => Ok(Some(Listing {
                title: product.name.clone(),
                price: price.map(str::to_string),
                pincode: pincode.cloned(),
                link: product.alert_link().to_string(),
            })),
            Some(Script::Fail) => Err(CheckerError::Timeout {
                url: "http://scripted.test".to_string(),
            }),
            Some(Script::Panic) => panic!("scripted checker panic"),
            Some(Script::NotAvailable) | None => Ok(None),
        }
    }
}

struct FixedCatalog(Vec<Product>);

#[async_trait]
impl CatalogSource for FixedCatalog {
    async fn tracked_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.0.clone())
    }
}

struct FailingCatalog;

#[async_trait]
impl CatalogSource for FailingCatalog {
    async fn tracked_products(&self) -> Result<Vec<Product>, CatalogError> {
        Err(CatalogError("database is unreachable".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_product(retailer: RetailerTag, id: &str, name: &str) -> Product {
    Product {
        name: name.to_string(),
        url: format!("https://store.example/{id}"),
        source_product_id: id.to_string(),
        retailer,
        affiliate_url: None,
    }
}

fn pincodes(codes: &[&str]) -> Vec<Pincode> {
    codes.iter().map(|c| Pincode::new(*c)).collect()
}

fn registry_of(entries: Vec<RetailerEntry>) -> CheckerRegistry {
    let mut registry = CheckerRegistry::new();
    for entry in entries {
        registry.insert(entry);
    }
    registry
}

fn silent_dispatcher() -> AlertDispatcher {
    AlertDispatcher::new(None, HashMap::new(), HashMap::new())
}

fn telegram_dispatcher(server: &MockServer, threads: HashMap<RetailerTag, i64>) -> AlertDispatcher {
    AlertDispatcher::new(
        Some(TelegramNotifier::with_base_url(
            reqwest::Client::new(),
            "123:token",
            "-100777",
            server.uri(),
        )),
        threads,
        HashMap::new(),
    )
}

// ---------------------------------------------------------------------------
// Pincode fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fallback_walks_pincodes_in_order_and_stops_at_the_first_hit() {
    let checker = ScriptedChecker::new(
        RetailerTag::Croma,
        &[
            ("272418", Some("110001"), Script::NotAvailable),
            ("272418", Some("560001"), Script::Found { price: None }),
            ("272418", Some("400001"), Script::Found { price: None }),
        ],
    );
    let product = make_product(RetailerTag::Croma, "272418", "QLED TV");

    let outcome = check_with_fallback(
        checker.as_ref(),
        &product,
        true,
        &pincodes(&["110001", "560001", "400001"]),
    )
    .await;

    match outcome {
        CheckOutcome::Found(listing) => {
            assert_eq!(listing.pincode, Some(Pincode::new("560001")));
        }
        other => panic!("expected Found, got: {other:?}"),
    }
    assert_eq!(
        checker.calls(),
        vec![
            ("272418".to_string(), Some("110001".to_string())),
            ("272418".to_string(), Some("560001".to_string())),
        ],
        "the third pincode must not be probed after a hit"
    );
}

#[tokio::test]
async fn location_agnostic_checkers_get_exactly_one_call_without_a_pincode() {
    let checker = ScriptedChecker::new(
        RetailerTag::Vivo,
        &[("10086001", None, Script::Found { price: Some("₹94999") })],
    );
    let product = make_product(RetailerTag::Vivo, "10086001", "X200 Pro");

    let outcome = check_with_fallback(
        checker.as_ref(),
        &product,
        false,
        &pincodes(&["110001", "560001"]),
    )
    .await;

    assert!(outcome.is_found(), "expected Found, got: {outcome:?}");
    assert_eq!(checker.calls(), vec![("10086001".to_string(), None)]);
}

#[tokio::test]
async fn location_aware_without_pincodes_is_not_available_and_never_calls() {
    let checker = ScriptedChecker::new(RetailerTag::Apple, &[]);
    let product = make_product(RetailerTag::Apple, "MYWX3HN/A", "iPhone 16 Pro");

    let outcome = check_with_fallback(checker.as_ref(), &product, true, &[]).await;

    assert!(
        matches!(outcome, CheckOutcome::NotAvailable),
        "expected NotAvailable, got: {outcome:?}"
    );
    assert!(checker.calls().is_empty());
}

#[tokio::test]
async fn a_failed_pincode_does_not_stop_the_walk_but_marks_the_product_failed() {
    let checker = ScriptedChecker::new(
        RetailerTag::Croma,
        &[
            ("272418", Some("110001"), Script::Fail),
            ("272418", Some("560001"), Script::NotAvailable),
        ],
    );
    let product = make_product(RetailerTag::Croma, "272418", "QLED TV");

    let outcome = check_with_fallback(
        checker.as_ref(),
        &product,
        true,
        &pincodes(&["110001", "560001"]),
    )
    .await;

    assert!(
        matches!(outcome, CheckOutcome::Failed(CheckerError::Timeout { .. })),
        "expected Failed, got: {outcome:?}"
    );
    assert_eq!(checker.calls().len(), 2, "both pincodes must be probed");
}

#[tokio::test]
async fn a_failure_then_a_hit_still_counts_as_found() {
    let checker = ScriptedChecker::new(
        RetailerTag::Croma,
        &[
            ("272418", Some("110001"), Script::Fail),
            ("272418", Some("560001"), Script::Found { price: None }),
        ],
    );
    let product = make_product(RetailerTag::Croma, "272418", "QLED TV");

    let outcome = check_with_fallback(
        checker.as_ref(),
        &product,
        true,
        &pincodes(&["110001", "560001"]),
    )
    .await;

    assert!(outcome.is_found(), "expected Found, got: {outcome:?}");
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_sums_tracked_and_found_across_retailers() {
    let croma = ScriptedChecker::new(
        RetailerTag::Croma,
        &[
            ("1", Some("110001"), Script::Found { price: None }),
            ("2", Some("110001"), Script::Found { price: None }),
            // Product 3 stays out of stock everywhere.
        ],
    );
    let vivo = ScriptedChecker::new(RetailerTag::Vivo, &[]);

    let registry = registry_of(vec![
        RetailerEntry {
            checker: croma.clone(),
            location_aware: true,
            source: ProductSource::Catalog,
        },
        RetailerEntry {
            checker: vivo.clone(),
            location_aware: false,
            source: ProductSource::Catalog,
        },
    ]);

    let catalog = FixedCatalog(vec![
        make_product(RetailerTag::Croma, "1", "TV One"),
        make_product(RetailerTag::Croma, "2", "TV Two"),
        make_product(RetailerTag::Croma, "3", "TV Three"),
        make_product(RetailerTag::Vivo, "10", "Phone One"),
        make_product(RetailerTag::Vivo, "11", "Phone Two"),
    ]);

    let engine = Engine::new(registry, silent_dispatcher(), pincodes(&["110001"]), 10);
    let outcome = engine.run(&catalog).await;

    assert_eq!(outcome.summary.total_tracked, 5);
    assert_eq!(outcome.summary.total_found, 2);
    assert!(outcome.catalog_error.is_none());
    assert_eq!(vivo.calls().len(), 2, "both vivo products get checked");
}

#[tokio::test]
async fn alerts_batch_per_retailer_and_silent_retailers_send_nothing() {
    let server = MockServer::start().await;

    // Exactly one message, for Croma, carrying both product lines.
    Mock::given(method("POST"))
        .and(path("/bot123:token/sendMessage"))
        .and(body_string_contains("Croma Stock Alert"))
        .and(body_string_contains("TV One"))
        .and(body_string_contains("TV Two"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/bot123:token/sendMessage"))
        .and(body_string_contains("vivo Stock Alert"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})),
        )
        .expect(0)
        .mount(&server)
        .await;

    let croma = ScriptedChecker::new(
        RetailerTag::Croma,
        &[
            ("1", Some("110001"), Script::Found { price: None }),
            ("2", Some("110001"), Script::Found { price: Some("₹49,999") }),
        ],
    );
    let vivo = ScriptedChecker::new(RetailerTag::Vivo, &[]);

    let registry = registry_of(vec![
        RetailerEntry {
            checker: croma,
            location_aware: true,
            source: ProductSource::Catalog,
        },
        RetailerEntry {
            checker: vivo,
            location_aware: false,
            source: ProductSource::Catalog,
        },
    ]);

    let catalog = FixedCatalog(vec![
        make_product(RetailerTag::Croma, "1", "TV One"),
        make_product(RetailerTag::Croma, "2", "TV Two"),
        make_product(RetailerTag::Vivo, "10", "Phone One"),
    ]);

    let engine = Engine::new(
        registry,
        telegram_dispatcher(&server, HashMap::new()),
        pincodes(&["110001"]),
        10,
    );
    let outcome = engine.run(&catalog).await;

    assert_eq!(outcome.summary.total_found, 2);
}

#[tokio::test]
async fn alerts_route_into_the_configured_thread() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:token/sendMessage"))
        .and(body_partial_json(json!({"message_thread_id": 99})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let croma = ScriptedChecker::new(
        RetailerTag::Croma,
        &[("1", Some("110001"), Script::Found { price: None })],
    );
    let registry = registry_of(vec![RetailerEntry {
        checker: croma,
        location_aware: true,
        source: ProductSource::Catalog,
    }]);
    let catalog = FixedCatalog(vec![make_product(RetailerTag::Croma, "1", "TV One")]);

    let mut threads = HashMap::new();
    threads.insert(RetailerTag::Croma, 99);

    let engine = Engine::new(
        registry,
        telegram_dispatcher(&server, threads),
        pincodes(&["110001"]),
        10,
    );
    engine.run(&catalog).await;
}

#[tokio::test]
async fn static_source_products_are_checked_without_the_catalog() {
    let oppo = ScriptedChecker::new(
        RetailerTag::Oppo,
        &[("P402GF01:402GF01AA01", None, Script::Found { price: None })],
    );
    let registry = registry_of(vec![RetailerEntry {
        checker: oppo.clone(),
        location_aware: false,
        source: ProductSource::Static(vec![make_product(
            RetailerTag::Oppo,
            "P402GF01:402GF01AA01",
            "Find X8",
        )]),
    }]);

    // The catalog has nothing for OPPO; the static set drives the task.
    let catalog = FixedCatalog(Vec::new());

    let engine = Engine::new(registry, silent_dispatcher(), pincodes(&["110001"]), 10);
    let outcome = engine.run(&catalog).await;

    assert_eq!(outcome.summary.total_tracked, 1);
    assert_eq!(outcome.summary.total_found, 1);
    assert_eq!(oppo.calls().len(), 1);
}

#[tokio::test]
async fn a_panicking_retailer_task_still_counts_its_products() {
    let croma = ScriptedChecker::new(
        RetailerTag::Croma,
        &[("1", Some("110001"), Script::Panic)],
    );
    let vivo = ScriptedChecker::new(
        RetailerTag::Vivo,
        &[("10", None, Script::Found { price: None })],
    );

    let registry = registry_of(vec![
        RetailerEntry {
            checker: croma,
            location_aware: true,
            source: ProductSource::Catalog,
        },
        RetailerEntry {
            checker: vivo,
            location_aware: false,
            source: ProductSource::Catalog,
        },
    ]);
    let catalog = FixedCatalog(vec![
        make_product(RetailerTag::Croma, "1", "TV One"),
        make_product(RetailerTag::Vivo, "10", "Phone One"),
    ]);

    let engine = Engine::new(registry, silent_dispatcher(), pincodes(&["110001"]), 10);
    let outcome = engine.run(&catalog).await;

    assert_eq!(
        outcome.summary.total_tracked, 2,
        "panicked task products still count as tracked"
    );
    assert_eq!(outcome.summary.total_found, 1);
}

#[tokio::test]
async fn catalog_failure_degrades_to_a_marked_zero_run() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:token/sendMessage"))
        .and(body_string_contains("❌ Stock check failed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let croma = ScriptedChecker::new(RetailerTag::Croma, &[]);
    let registry = registry_of(vec![RetailerEntry {
        checker: croma.clone(),
        location_aware: true,
        source: ProductSource::Catalog,
    }]);

    let engine = Engine::new(
        registry,
        telegram_dispatcher(&server, HashMap::new()),
        pincodes(&["110001"]),
        10,
    );
    let outcome = engine.run(&FailingCatalog).await;

    assert_eq!(outcome.summary.total_tracked, 0);
    assert_eq!(outcome.summary.total_found, 0);
    assert!(
        outcome
            .catalog_error
            .as_deref()
            .is_some_and(|e| e.contains("database is unreachable")),
        "expected catalog error marker, got: {:?}",
        outcome.catalog_error
    );
    assert!(croma.calls().is_empty(), "no checks run without a catalog");
}

#[tokio::test]
async fn concurrency_of_one_still_completes_every_retailer() {
    let croma = ScriptedChecker::new(
        RetailerTag::Croma,
        &[("1", Some("110001"), Script::Found { price: None })],
    );
    let vivo = ScriptedChecker::new(
        RetailerTag::Vivo,
        &[("10", None, Script::Found { price: None })],
    );
    let oppo = ScriptedChecker::new(RetailerTag::Oppo, &[]);

    let registry = registry_of(vec![
        RetailerEntry {
            checker: croma,
            location_aware: true,
            source: ProductSource::Catalog,
        },
        RetailerEntry {
            checker: vivo,
            location_aware: false,
            source: ProductSource::Catalog,
        },
        RetailerEntry {
            checker: oppo,
            location_aware: false,
            source: ProductSource::Catalog,
        },
    ]);
    let catalog = FixedCatalog(vec![
        make_product(RetailerTag::Croma, "1", "TV One"),
        make_product(RetailerTag::Vivo, "10", "Phone One"),
        make_product(RetailerTag::Oppo, "P1:S1", "Find X8"),
    ]);

    let engine = Engine::new(registry, silent_dispatcher(), pincodes(&["110001"]), 1);
    let outcome = engine.run(&catalog).await;

    assert_eq!(outcome.summary.total_tracked, 3);
    assert_eq!(outcome.summary.total_found, 2);
}
