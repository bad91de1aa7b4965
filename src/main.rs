use clap::Parser;
use isa_ledger::interfaces::cli::{self, Cli};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("isa_ledger=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli::run(cli).await.into_diagnostic()?;

    Ok(())
}
