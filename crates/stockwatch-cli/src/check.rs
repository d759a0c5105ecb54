//! One-off availability sweep from the command line.

use stockwatch_core::AppConfig;

/// Run one availability sweep over the tracked catalog, recorded as a
/// `check_runs` row with trigger source `"cli"`.
///
/// Alerts go out exactly as they do for scheduled runs; the summary is also
/// printed to stdout.
///
/// # Errors
///
/// Returns an error if configuration, the database connection, or run
/// bookkeeping fails, or when the catalog could not be loaded. Checker
/// failures inside the sweep are contained and only lower the found count.
pub(crate) async fn run_check(config: &AppConfig) -> anyhow::Result<()> {
    let pool_config = stockwatch_db::PoolConfig::from_app_config(config);
    let pool = stockwatch_db::connect_pool(&config.database_url, pool_config).await?;

    let static_products = if config.static_retailers.is_empty() {
        None
    } else {
        Some(stockwatch_core::load_static_products(
            &config.static_products_path,
        )?)
    };
    let registry = stockwatch_checkers::build_registry(config, static_products.as_ref())?;
    let http =
        stockwatch_checkers::build_http_client(config.check_timeout_secs, &config.http_user_agent)?;
    let dispatcher = stockwatch_engine::AlertDispatcher::from_config(config, http);
    let engine = stockwatch_engine::Engine::new(
        registry,
        dispatcher,
        config.pincodes.clone(),
        config.max_concurrent_retailers,
    );

    let run = stockwatch_db::create_check_run(&pool, "cli").await?;
    stockwatch_db::start_check_run(&pool, run.id).await?;

    let catalog = stockwatch_db::PgCatalog::new(pool.clone());
    let outcome = engine.run(&catalog).await;

    if let Some(reason) = &outcome.catalog_error {
        // The catalog failure is the error worth reporting; a bookkeeping
        // failure on top of it only gets logged.
        if let Err(e) = stockwatch_db::fail_check_run(&pool, run.id, reason).await {
            tracing::error!(run_id = run.id, error = %e, "failed to mark check run failed");
        }
        anyhow::bail!("catalog load failed: {reason}");
    }

    let total_tracked = i32::try_from(outcome.summary.total_tracked).unwrap_or(i32::MAX);
    let total_found = i32::try_from(outcome.summary.total_found).unwrap_or(i32::MAX);
    stockwatch_db::complete_check_run(&pool, run.id, total_tracked, total_found).await?;

    println!("{}", outcome.summary);
    Ok(())
}
