//! Tracked-product management commands.

use clap::Subcommand;
use uuid::Uuid;

use stockwatch_core::AppConfig;

/// Sub-commands available under `products`.
#[derive(Debug, Subcommand)]
pub(crate) enum ProductsCommands {
    /// List tracked products
    List,
    /// Track a product from its storefront URL
    Add {
        /// Product page URL
        #[arg(long)]
        url: String,
        /// Part or SKU code for storefronts whose URLs do not carry one
        /// (Apple part numbers, vivo/iQOO SKU ids, OPPO variant codes)
        #[arg(long)]
        part_number: Option<String>,
        /// Display name override
        #[arg(long)]
        name: Option<String>,
        /// Affiliate link preferred over the page URL in alerts
        #[arg(long)]
        affiliate_url: Option<String>,
    },
    /// Stop tracking a product
    Remove {
        /// Product id as shown by `products list`
        product_id: Uuid,
    },
}

pub(crate) async fn run(config: &AppConfig, command: ProductsCommands) -> anyhow::Result<()> {
    let pool_config = stockwatch_db::PoolConfig::from_app_config(config);
    let pool = stockwatch_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        ProductsCommands::List => run_products_list(&pool).await,
        ProductsCommands::Add {
            url,
            part_number,
            name,
            affiliate_url,
        } => {
            run_products_add(
                &pool,
                config,
                &url,
                part_number.as_deref(),
                name.as_deref(),
                affiliate_url,
            )
            .await
        }
        ProductsCommands::Remove { product_id } => run_products_remove(&pool, product_id).await,
    }
}

/// Print a table of every active product in the catalog.
async fn run_products_list(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let rows = stockwatch_db::list_active_products(pool).await?;

    if rows.is_empty() {
        println!("no tracked products; run `products add` first");
        return Ok(());
    }

    let header = format!("{:<38}{:<18}{:<28}NAME", "ID", "RETAILER", "SOURCE ID");
    println!("{header}");
    for row in &rows {
        println!(
            "{:<38}{:<18}{:<28}{}",
            row.public_id, row.retailer, row.source_product_id, row.name
        );
    }

    Ok(())
}

/// Derive the retailer and listing identifier from the URL and upsert the
/// product. Re-adding a listing that is already tracked refreshes it.
async fn run_products_add(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    url: &str,
    part_number: Option<&str>,
    name: Option<&str>,
    affiliate_url: Option<String>,
) -> anyhow::Result<()> {
    let client =
        stockwatch_checkers::build_http_client(config.check_timeout_secs, &config.http_user_agent)?;
    let identified = stockwatch_checkers::identify_product(&client, url, part_number).await?;

    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or(identified.name, ToOwned::to_owned);

    let row = stockwatch_db::upsert_product(
        pool,
        &stockwatch_db::NewProduct {
            name,
            url: url.to_owned(),
            source_product_id: identified.source_product_id,
            retailer: identified.retailer,
            affiliate_url,
        },
    )
    .await?;

    println!(
        "tracking {} ({}) as {} [{}]",
        row.name, row.retailer, row.source_product_id, row.public_id
    );
    Ok(())
}

async fn run_products_remove(pool: &sqlx::PgPool, product_id: Uuid) -> anyhow::Result<()> {
    match stockwatch_db::deactivate_product(pool, product_id).await {
        Ok(()) => {
            println!("removed {product_id} from tracking");
            Ok(())
        }
        Err(stockwatch_db::DbError::NotFound) => {
            anyhow::bail!("no tracked product with id {product_id}; run `products list`")
        }
        Err(e) => Err(e.into()),
    }
}
