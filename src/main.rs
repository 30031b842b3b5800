use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fairvalue::assumptions::providers::{FileAssumptionProvider, GeminiAssumptionProvider};
use fairvalue::assumptions::AssumptionProvider;
use fairvalue::config::{default_config_path, Config};
use fairvalue::format::render_result;
use fairvalue::models::FinancialSnapshot;
use fairvalue::valuation::ValuationEngine;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "fairvalue")]
#[command(about = "Per-share fair value estimates (DCF with P/E multiples fallback)")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Estimate the fair value of one security from a snapshot file
    Estimate {
        /// Financial snapshot (JSON)
        snapshot: PathBuf,

        /// Read assumptions from a JSON file instead of calling Gemini
        #[arg(long)]
        assumptions: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show current configuration
    Config,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
}

fn load_snapshot(path: &Path) -> Result<FinancialSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    FinancialSnapshot::from_json(&content)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
}

fn build_provider(config: &Config, assumptions: Option<&Path>) -> Result<Arc<dyn AssumptionProvider>> {
    if let Some(path) = assumptions {
        return Ok(Arc::new(FileAssumptionProvider::load(path)?));
    }

    let settings = &config.provider;
    let mut provider =
        GeminiAssumptionProvider::new(settings.api_key()?).with_model(settings.model.clone());
    if let Some(base_url) = &settings.base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    Ok(Arc::new(provider))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = Config::load_or_default(&config_path)?;

    match cli.command {
        Command::Config => {
            println!("Config file: {}", config_path.display());
            println!();
            print!("{}", toml::to_string(&config).context("Failed to render config")?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Estimate {
            snapshot,
            assumptions,
            json,
        } => {
            let snapshot = load_snapshot(&snapshot)?;
            let provider = build_provider(&config, assumptions.as_deref())?;
            info!(ticker = %snapshot.ticker, provider = provider.name(), "starting valuation");

            let engine = ValuationEngine::new(provider, config.engine_config())
                .context("Failed to build valuation engine")?;
            match engine.estimate(&snapshot).await {
                Ok(result) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&result)?);
                    } else {
                        print!("{}", render_result(&result));
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    eprintln!("valuation unavailable for {}", snapshot.ticker);
                    for reason in err.reason_chain() {
                        eprintln!("  - {reason}");
                    }
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
