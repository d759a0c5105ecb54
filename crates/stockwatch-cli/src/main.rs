mod check;
mod oppo;
mod products;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "stockwatch-cli")]
#[command(about = "stockwatch command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one availability sweep over the tracked catalog
    Check,
    /// Manage tracked products
    Products {
        #[command(subcommand)]
        command: products::ProductsCommands,
    },
    /// OPPO storefront helpers
    Oppo {
        #[command(subcommand)]
        command: oppo::OppoCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = stockwatch_core::load_app_config()?;

    match cli.command {
        Commands::Check => check::run_check(&config).await,
        Commands::Products { command } => products::run(&config, command).await,
        Commands::Oppo { command } => oppo::run(&config, command).await,
    }
}
