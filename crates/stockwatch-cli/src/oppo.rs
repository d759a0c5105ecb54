//! OPPO storefront helpers.
//!
//! OPPO product URLs only carry the product code; the sellable SKU has to be
//! picked from the mall detail API before the listing can be tracked.

use clap::Subcommand;

use stockwatch_checkers::retailers::OppoChecker;
use stockwatch_core::AppConfig;

/// Sub-commands available under `oppo`.
#[derive(Debug, Subcommand)]
pub(crate) enum OppoCommands {
    /// List the variant SKUs of a product code
    Variants {
        /// Product code from the page URL (e.g. P839242)
        #[arg(long)]
        product_code: String,
    },
}

pub(crate) async fn run(config: &AppConfig, command: OppoCommands) -> anyhow::Result<()> {
    match command {
        OppoCommands::Variants { product_code } => run_oppo_variants(config, &product_code).await,
    }
}

/// Query the mall detail API and print every variant of the product code,
/// ready to pick a sku for `products add --part-number`.
async fn run_oppo_variants(config: &AppConfig, product_code: &str) -> anyhow::Result<()> {
    let client =
        stockwatch_checkers::build_http_client(config.check_timeout_secs, &config.http_user_agent)?;
    let checker = OppoChecker::new(client);
    let variants = checker.variants(product_code).await?;

    if variants.is_empty() {
        println!("no variants listed for {product_code}");
        return Ok(());
    }

    let header = format!("{:<16}NAME", "SKU");
    println!("{header}");
    for variant in &variants {
        println!("{:<16}{}", variant.sku_code, variant.name);
    }
    println!();
    println!("track one with: products add --url <page-url> --part-number <sku>");

    Ok(())
}
