mod analytics_drift;
mod site_validate;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "xtask")]
#[command(about = "Project automation tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare the baked analytics schema (`config/analytics.json`) with the live schema.
    AnalyticsDrift(analytics_drift::Args),
    /// Check built HTML pages against the baked analytics schema, offline.
    SiteValidate(site_validate::Args),
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let code = match cli.command {
        Command::AnalyticsDrift(args) => analytics_drift::run(args),
        Command::SiteValidate(args) => site_validate::run(args),
    };
    std::process::exit(code);
}
