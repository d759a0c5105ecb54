mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(stockwatch_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = stockwatch_db::PoolConfig::from_app_config(&config);
    let pool = stockwatch_db::connect_pool(&config.database_url, pool_config).await?;
    stockwatch_db::run_migrations(&pool).await?;

    let static_products = if config.static_retailers.is_empty() {
        None
    } else {
        Some(stockwatch_core::load_static_products(
            &config.static_products_path,
        )?)
    };
    let registry = stockwatch_checkers::build_registry(&config, static_products.as_ref())?;

    let http =
        stockwatch_checkers::build_http_client(config.check_timeout_secs, &config.http_user_agent)?;
    let dispatcher = stockwatch_engine::AlertDispatcher::from_config(&config, http.clone());
    let engine = Arc::new(stockwatch_engine::Engine::new(
        registry,
        dispatcher,
        config.pincodes.clone(),
        config.max_concurrent_retailers,
    ));

    let _scheduler =
        scheduler::build_scheduler(pool.clone(), Arc::clone(&engine), Arc::clone(&config)).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        stockwatch_core::Environment::Development
    ))?;
    let app = build_app(AppState { pool, engine, http }, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
