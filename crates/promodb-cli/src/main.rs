mod codes;
mod export;
mod rank;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use promodb_scraper::DEFAULT_SCRAPE_LIMIT;
use tracing_subscriber::EnvFilter;

use crate::export::ExportFormat;

#[derive(Debug, Parser)]
#[command(name = "promodb-cli")]
#[command(about = "Promo code scraping, ranking, and telemetry tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Scrape candidate codes for a domain
    Codes {
        /// Retailer domain, e.g. example.com
        #[arg(long)]
        domain: String,

        /// Page to visit before the configured candidate paths
        #[arg(long)]
        url: Option<String>,

        /// Scrape a saved HTML file instead of fetching pages
        #[arg(long)]
        html_file: Option<PathBuf>,

        /// Maximum number of codes to print
        #[arg(long, default_value_t = DEFAULT_SCRAPE_LIMIT)]
        limit: usize,
    },
    /// Rank candidate codes against recorded telemetry
    Rank {
        /// Retailer domain, e.g. example.com
        #[arg(long)]
        domain: String,

        /// Candidate codes, in order
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Export recorded attempts as training rows
    Export {
        /// Restrict to one domain
        #[arg(long)]
        domain: Option<String>,

        /// Only rows from the last N days (0 exports everything)
        #[arg(long, default_value_t = 180)]
        days: u32,

        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = promodb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("promodb-cli: no command given (try --help)");
        return Ok(());
    };

    match command {
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    promodb_db::ping(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = promodb_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        Commands::Codes {
            domain,
            url,
            html_file,
            limit,
        } => {
            let adapters = promodb_core::load_adapters(&config.adapters_path)?;
            let args = codes::CodesArgs {
                domain,
                url,
                html_file,
                limit,
            };
            for code in codes::run_codes(&config, &adapters, &args).await? {
                println!("{code}");
            }
        }
        Commands::Rank { domain, codes } => {
            let pool = connect(&config).await?;
            rank::run_rank(&pool, &config, &domain, &codes).await?;
        }
        Commands::Export {
            domain,
            days,
            format,
        } => {
            let pool = connect(&config).await?;
            export::run_export(&pool, domain.as_deref(), days, format).await?;
        }
    }

    Ok(())
}

async fn connect(config: &promodb_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = promodb_db::PoolConfig::from_app_config(config);
    let pool = promodb_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}
