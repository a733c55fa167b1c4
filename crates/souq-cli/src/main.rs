mod listings;
mod stats;

use clap::{Parser, Subcommand};
use souq_backend::BackendClient;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "souq-cli")]
#[command(about = "Souq marketplace command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show listing statistics for one seller
    Stats {
        /// Seller (owner) id
        #[arg(long)]
        owner: String,
    },
    /// Show marketplace-wide statistics
    Marketplace,
    /// List the newest listings
    Products {
        /// Category slug to filter by
        #[arg(long)]
        category: Option<String>,
        /// Case-insensitive substring of the listing name
        #[arg(long)]
        search: Option<String>,
        /// Maximum number of listings to show
        #[arg(long, default_value = "20")]
        limit: u32,
        /// Display locale (ar, en, fr); defaults to SOUQ_DEFAULT_LOCALE
        #[arg(long)]
        lang: Option<String>,
    },
    /// Print the WhatsApp order link for a listing
    Whatsapp {
        /// Listing id
        #[arg(long)]
        product: String,
        /// Message locale (ar, en, fr); defaults to SOUQ_DEFAULT_LOCALE
        #[arg(long)]
        lang: Option<String>,
    },
    /// Print the category catalogue
    Categories {
        /// Label locale (ar, en, fr); defaults to SOUQ_DEFAULT_LOCALE
        #[arg(long)]
        lang: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("souq-cli: run with --help to list commands");
        return Ok(());
    };

    let config = souq_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let categories = souq_core::load_categories(&config.categories_path)?;
    let client = BackendClient::from_app_config(&config)?;

    match command {
        Commands::Stats { owner } => {
            stats::run_seller_stats(&client, &config, &categories, &owner).await?;
        }
        Commands::Marketplace => {
            stats::run_marketplace_stats(&client, &config, &categories).await?;
        }
        Commands::Products {
            category,
            search,
            limit,
            lang,
        } => {
            let locale = listings::pick_locale(lang.as_deref(), config.default_locale)?;
            let query = souq_backend::ProductQuery::default()
                .with_category(category)
                .with_search(search)
                .with_limit(Some(limit));
            listings::run_products(&client, &config, &categories, &query, locale).await?;
        }
        Commands::Whatsapp { product, lang } => {
            let locale = listings::pick_locale(lang.as_deref(), config.default_locale)?;
            listings::run_whatsapp(&client, &config, &product, locale).await?;
        }
        Commands::Categories { lang } => {
            let locale = listings::pick_locale(lang.as_deref(), config.default_locale)?;
            print!("{}", listings::render_categories(&categories, locale));
        }
    }

    Ok(())
}
