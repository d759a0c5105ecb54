//! Run orchestration: fan out over retailers, check every tracked product,
//! batch alerts, and roll the tallies into one summary.
//!
//! A run never aborts halfway. Individual check failures degrade to
//! "nothing found" for that product, a panicking retailer task degrades to
//! zero findings for that retailer, and a catalog failure degrades the
//! whole run to zero totals with a marker on the outcome.

mod check;
mod dispatch;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};

use stockwatch_checkers::{Checker, CheckerRegistry, ProductSource};
use stockwatch_core::{
    CatalogSource, Pincode, Product, RetailerResult, RetailerTag, RunOutcome, RunSummary,
};

pub use check::check_with_fallback;
pub use dispatch::AlertDispatcher;

/// One availability sweep, configured once and run on demand or on a
/// schedule.
pub struct Engine {
    registry: CheckerRegistry,
    dispatcher: AlertDispatcher,
    pincodes: Vec<Pincode>,
    max_concurrent: usize,
}

struct Job {
    tag: RetailerTag,
    checker: Arc<dyn Checker>,
    location_aware: bool,
    products: Vec<Product>,
}

impl Engine {
    #[must_use]
    pub fn new(
        registry: CheckerRegistry,
        dispatcher: AlertDispatcher,
        pincodes: Vec<Pincode>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            pincodes,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Executes one full run: load the catalog, check every product with
    /// at most `max_concurrent` retailer tasks in flight, dispatch alerts,
    /// and return the summary.
    pub async fn run(&self, catalog: &dyn CatalogSource) -> RunOutcome {
        let started = Instant::now();

        let catalog_products = match catalog.tracked_products().await {
            Ok(products) => products,
            Err(e) => {
                tracing::error!(error = %e, "catalog load failed, skipping this run");
                self.dispatcher.notify_run_failure(&e.to_string()).await;
                return RunOutcome {
                    summary: finished_summary(0, 0, started),
                    catalog_error: Some(e.to_string()),
                };
            }
        };

        let jobs = self.plan_jobs(catalog_products);
        let results = self.execute(jobs).await;

        let total_tracked = results.values().map(|r| r.total).sum();
        let total_found = results.values().map(|r| r.found).sum();

        self.dispatcher.dispatch(&results).await;

        let summary = finished_summary(total_tracked, total_found, started);
        tracing::info!(
            total_tracked = summary.total_tracked,
            total_found = summary.total_found,
            duration_secs = summary.duration.as_secs_f64(),
            "run complete"
        );

        RunOutcome {
            summary,
            catalog_error: None,
        }
    }

    /// Pairs every registered retailer with its product list. Retailers
    /// with nothing to check get no task at all.
    fn plan_jobs(&self, catalog_products: Vec<Product>) -> Vec<Job> {
        let mut by_retailer: BTreeMap<RetailerTag, Vec<Product>> = BTreeMap::new();
        for product in catalog_products {
            by_retailer.entry(product.retailer).or_default().push(product);
        }

        let mut jobs = Vec::new();
        for (tag, entry) in self.registry.iter() {
            let products = match &entry.source {
                ProductSource::Catalog => by_retailer.remove(&tag).unwrap_or_default(),
                ProductSource::Static(products) => {
                    if let Some(ignored) = by_retailer.remove(&tag) {
                        if !ignored.is_empty() {
                            tracing::debug!(
                                retailer = %tag,
                                count = ignored.len(),
                                "catalog rows ignored for a static-source retailer"
                            );
                        }
                    }
                    products.clone()
                }
            };

            if products.is_empty() {
                continue;
            }
            jobs.push(Job {
                tag,
                checker: Arc::clone(&entry.checker),
                location_aware: entry.location_aware,
                products,
            });
        }

        for (tag, leftover) in by_retailer {
            tracing::warn!(
                retailer = %tag,
                count = leftover.len(),
                "no checker registered for catalog products"
            );
        }

        jobs
    }

    /// Runs the retailer tasks with bounded parallelism and merges their
    /// tallies. Completion order does not matter; results key by tag. A
    /// panicking task still counts its products as checked.
    async fn execute(&self, jobs: Vec<Job>) -> BTreeMap<RetailerTag, RetailerResult> {
        let mut tasks = stream::iter(jobs.into_iter().map(|job| {
            let pincodes = self.pincodes.clone();
            async move {
                let tag = job.tag;
                let total = u32::try_from(job.products.len()).unwrap_or(u32::MAX);
                let handle = tokio::spawn(check::run_retailer(
                    job.checker,
                    tag,
                    job.location_aware,
                    job.products,
                    pincodes,
                ));
                match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!(retailer = %tag, error = %e, "retailer task panicked");
                        RetailerResult::empty(tag, total)
                    }
                }
            }
        }))
        .buffer_unordered(self.max_concurrent);

        let mut results = BTreeMap::new();
        while let Some(result) = tasks.next().await {
            results.insert(result.retailer, result);
        }
        results
    }
}

fn finished_summary(total_tracked: u32, total_found: u32, started: Instant) -> RunSummary {
    RunSummary {
        total_tracked,
        total_found,
        duration: started.elapsed(),
        finished_at: chrono::Utc::now(),
    }
}
