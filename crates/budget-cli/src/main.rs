use anyhow::{Context, Result};
use budget_acquire::{CrawlConfig, Crawler, HttpFetcher};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "budget")]
#[command(about = "Municipal budget scraping and CSV export tool")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long, global = true)]
    utc: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Options shared by every command that talks to the finance site.
#[derive(clap::Args)]
struct SiteArgs {
    /// User-Agent sent with every request
    #[arg(long, default_value = "OpenGovTn (http://opengovtn.org/)")]
    user_agent: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch budget pages and write one JSON record per municipality and type
    Crawl {
        #[command(flatten)]
        site: SiteArgs,

        /// Directory for the JSON records
        #[arg(short = 'O', long, default_value = "json")]
        output_dir: PathBuf,

        /// Stop after this many region/municipality pairs (keeps load on the site low)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        max_pairs: u64,

        /// Also keep the repaired HTML of each budget page under <output-dir>/raw
        #[arg(long)]
        cache_html: bool,
    },

    /// List regions, or the municipalities of one region
    Discover {
        #[command(flatten)]
        site: SiteArgs,

        /// Region id whose municipalities should be listed
        #[arg(short, long)]
        region: Option<u32>,
    },

    /// Flatten JSON records into recette.csv and depense.csv
    Flatten {
        /// Directory containing the JSON records
        #[arg(short, long, default_value = "json")]
        input: PathBuf,

        /// Directory for the CSV files
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

impl SiteArgs {
    fn config(&self) -> CrawlConfig {
        CrawlConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout),
            ..CrawlConfig::default()
        }
    }
}

fn crawler(config: CrawlConfig) -> Result<Crawler<HttpFetcher>> {
    let fetcher = HttpFetcher::new(&config.user_agent, &config.accept_language, config.timeout)
        .context("Failed to build HTTP client")?;
    Ok(Crawler::new(fetcher, config)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Map log level, suppressing noisy HTML-parsing crates at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn  => "warn",
        LogLevel::Info  => "info",
        LogLevel::Debug => "debug,selectors=warn,html5ever=warn",
        LogLevel::Trace => "trace,selectors=warn,html5ever=warn",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Timestamp format: 2026-02-14 19:44:09.123 -08:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z";

    if cli.utc {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::new(time_format.to_string()))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(time_format.to_string()))
            .init();
    }

    match cli.command {
        Commands::Crawl {
            site,
            output_dir,
            max_pairs,
            cache_html,
        } => {
            let config = CrawlConfig {
                output_dir,
                max_pairs: usize::try_from(max_pairs).context("--max-pairs is too large")?,
                cache_html,
                ..site.config()
            };
            tracing::info!(
                output_dir = %config.output_dir.display(),
                max_pairs = config.max_pairs,
                "Crawling budget data"
            );
            let summary = crawler(config)?.run().await.context("Crawl aborted")?;
            tracing::info!(
                pairs = summary.pairs,
                records = summary.records,
                halted_by_limit = summary.halted_by_limit,
                "Done"
            );
        }
        Commands::Discover { site, region } => {
            let crawler = crawler(site.config())?;
            let regions = crawler.regions().await?;
            match region {
                None => {
                    for r in &regions {
                        println!("{}\t{}", r.id, r.label);
                    }
                }
                Some(id) => {
                    let region = regions
                        .iter()
                        .find(|r| r.id == id)
                        .with_context(|| format!("Unknown region id {id}"))?;
                    for m in crawler.municipalities(region).await? {
                        println!("{}\t{}", m.id, m.label);
                    }
                }
            }
        }
        Commands::Flatten { input, output } => {
            tracing::info!(input = %input.display(), output = %output.display(), "Flattening records");
            for (path, rows) in budget_export::export_all(&input, &output)? {
                tracing::info!(path = %path.display(), rows, "Exported");
            }
        }
    }

    Ok(())
}
