//! calcmatrix entry point
//!
//! Runs the calculator case matrix against every enabled build.
//! Run with: cargo run --package calcmatrix-e2e -- --build Prototype

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use calcmatrix_common::NumberFormat;
use calcmatrix_e2e::playwright::{Browser, PlaywrightFactory};
use calcmatrix_e2e::preflight::check_reachable;
use calcmatrix_e2e::{E2eResult, HarnessConfig, TestRunner};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "calcmatrix")]
#[command(about = "Data-driven test matrix for calculator build variants")]
#[command(version)]
struct Args {
    /// Path to the harness configuration
    #[arg(short, long, default_value = "calcmatrix.toml", env = "CALCMATRIX_CONFIG")]
    config: PathBuf,

    /// URL of the calculator page
    #[arg(long, env = "CALCMATRIX_BASE_URL")]
    base_url: Option<String>,

    /// Run only this build (repeatable)
    #[arg(short, long = "build", value_name = "ID")]
    builds: Vec<String>,

    /// Run every configured build, including disabled ones
    #[arg(long, conflicts_with = "builds")]
    all_builds: bool,

    /// Directory of YAML case tables overriding the built-in ones
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Cases of one build executed at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Output directory for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Digit rule for expected answers (shortest, significant15)
    #[arg(long)]
    number_format: Option<NumberFormat>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long)]
    browser: Option<Browser>,

    /// Do not check that the page is reachable before running
    #[arg(long)]
    skip_preflight: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

fn main() {
    let args = Args::parse();
    init_logging(args.log_format);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn apply_overrides(config: &mut HarnessConfig, args: &Args) {
    if let Some(url) = &args.base_url {
        config.playwright.base_url = url.clone();
    }
    if !args.builds.is_empty() {
        config.enable_only(&args.builds);
    }
    if args.all_builds {
        config.enable_all();
    }
    if let Some(dir) = &args.tables {
        config.tables_dir = Some(dir.clone());
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(dir) = &args.output {
        config.output_dir = dir.clone();
    }
    if let Some(format) = args.number_format {
        config.number_format = format;
    }
    if let Some(browser) = args.browser {
        config.playwright.browser = browser;
    }
    if args.skip_preflight {
        config.preflight.enabled = false;
    }
}

async fn async_main(args: Args) -> E2eResult<i32> {
    let mut config = HarnessConfig::load(&args.config)?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    info!(
        "calcmatrix {} against {} ({} format)",
        calcmatrix_common::VERSION,
        config.playwright.base_url,
        config.number_format
    );

    if config.preflight.enabled {
        check_reachable(&config.playwright.base_url, &config.preflight).await?;
    }

    let factory = Arc::new(PlaywrightFactory::new(config.playwright.clone())?);
    let runner = TestRunner::with_config(&config, factory)?;

    let results = runner.run_all().await;
    runner.write_results(&results)?;

    Ok(results.exit_code())
}
