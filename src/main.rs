use clap::Parser;

use tavily_conformance::Config;
use tavily_conformance::driver::RequestDriver;
use tavily_conformance::scenarios::{self, Scenario};

/// Runs the search API conformance scenarios one after another.
#[derive(Debug, Parser)]
#[command(name = "tavily-conformance", version)]
struct Args {
    /// Print scenario ids and names, then exit
    #[arg(long)]
    list: bool,

    /// Only run scenarios whose id or name contains this
    #[arg(long)]
    filter: Option<String>,

    /// Search endpoint to target instead of the configured one
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (log records are bridged by default)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let args = Args::parse();

    let selected: Vec<Scenario> = scenarios::catalog()
        .into_iter()
        .filter(|s| args.filter.as_deref().is_none_or(|f| s.matches(f)))
        .collect();

    if args.list {
        for scenario in &selected {
            println!("{} {}", scenario.id, scenario.name);
        }
        return Ok(());
    }

    let mut config = Config::from_env()?;
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint)?;
    }
    let driver = RequestDriver::new(&config)?;
    tracing::info!(endpoint = %driver.endpoint(), scenarios = selected.len(), "starting run");

    let summary = scenarios::run_all(&driver, &selected).await;
    for report in summary.reports.iter().filter(|r| !r.passed()) {
        println!("FAILED {} {}: {}", report.id, report.name, report.failures.join("; "));
    }
    for err in &summary.errors {
        println!("ERROR {} {}: {:#}", err.id, err.name, err.error);
    }

    println!(
        "{} passed, {} failed, {} errors",
        summary.passed(),
        summary.failed(),
        summary.errored()
    );
    if !summary.all_passed() {
        anyhow::bail!(
            "{} of {} scenarios did not pass",
            summary.failed() + summary.errored(),
            summary.attempted()
        );
    }
    Ok(())
}
