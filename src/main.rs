use anyhow::Result;
use clap::Parser;
use wallet_ledger::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    wallet_ledger::observability::init(cli.verbose);
    cli.run().await
}
