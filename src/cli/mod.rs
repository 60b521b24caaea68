use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::LedgerEngine;
use crate::domain::{Direction, WalletId, parse_amount, parse_history_date};
use crate::io::write_history_csv;
use crate::storage::{
    DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DATABASE_URL, DEFAULT_MAX_CONNECTIONS, StoreConfig,
};

/// Wallet Ledger - create wallets, top them up, send value and report history
#[derive(Parser)]
#[command(name = "wallet-ledger")]
#[command(about = "A minimal wallet ledger with atomic transfers and an append-only transaction log")]
#[command(version)]
pub struct Cli {
    /// Database connection string
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Maximum number of pooled database connections
    #[arg(long, env = "LEDGER_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// How long to wait on a locked database before giving up, in milliseconds
    #[arg(long, env = "LEDGER_BUSY_TIMEOUT_MS", default_value_t = DEFAULT_BUSY_TIMEOUT_MS)]
    pub busy_timeout_ms: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Wallet management commands
    #[command(subcommand)]
    Wallet(WalletCommands),

    /// Add external value to a wallet
    Topup {
        /// Recipient wallet id
        recipient: String,

        /// Amount in the smallest currency unit
        amount: String,
    },

    /// Send value from one wallet to another
    Send {
        /// Amount in the smallest currency unit
        amount: String,

        /// Sender wallet id
        #[arg(long)]
        from: String,

        /// Recipient wallet id
        #[arg(long)]
        to: String,
    },

    /// Print a wallet's transactions for one day as CSV
    History {
        /// Wallet id
        wallet: String,

        /// Day to report (dd-mm-yyyy)
        #[arg(long)]
        date: String,

        /// deposit (received) or withdraw (sent)
        #[arg(long)]
        direction: String,

        /// Emit a header row
        #[arg(long)]
        header: bool,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Verify that every balance matches its transaction history
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Create a new, empty wallet
    Create {
        firstname: String,
        lastname: String,
    },

    /// Show a wallet and its balance
    Show {
        /// Wallet id
        id: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all wallets
    List,
}

impl Cli {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.database_url)
            .with_max_connections(self.max_connections)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }

    pub async fn run(self) -> Result<()> {
        let config = self.store_config();

        match self.command {
            Commands::Init => {
                let engine = LedgerEngine::init(&config).await?;
                engine.store().close().await;
                println!("Database initialized: {}", config.database_url);
            }

            Commands::Wallet(wallet_cmd) => {
                let engine = LedgerEngine::connect(&config).await?;
                run_wallet_command(&engine, wallet_cmd).await?;
            }

            Commands::Topup { recipient, amount } => {
                let recipient = parse_wallet_id(&recipient)?;
                let amount = parse_amount(&amount)?;

                let engine = LedgerEngine::connect(&config).await?;
                let tx_id = engine.top_up(&recipient, amount).await?;
                println!("Topped up {} with {} (transaction {})", recipient, amount, tx_id);
            }

            Commands::Send { amount, from, to } => {
                let sender = parse_wallet_id(&from)?;
                let recipient = parse_wallet_id(&to)?;
                let amount = parse_amount(&amount)?;

                let engine = LedgerEngine::connect(&config).await?;
                let tx_id = engine.send(&sender, &recipient, amount).await?;
                println!(
                    "Sent {} {} -> {} (transaction {})",
                    amount, sender, recipient, tx_id
                );
            }

            Commands::History {
                wallet,
                date,
                direction,
                header,
                output,
            } => {
                let wallet_id = parse_wallet_id(&wallet)?;
                let day = parse_history_date(&date)?;
                let direction: Direction = direction.parse()?;

                let engine = LedgerEngine::connect(&config).await?;
                let transactions = engine.history(direction, &wallet_id, day).await?;

                match output {
                    Some(path) => {
                        let file = std::fs::File::create(&path)
                            .with_context(|| format!("Failed to create output file: {}", path))?;
                        let count = write_history_csv(file, &transactions, header)?;
                        eprintln!("Exported {} transactions to {}", count, path);
                    }
                    None => {
                        write_history_csv(std::io::stdout().lock(), &transactions, header)?;
                    }
                }
            }

            Commands::Check { json } => {
                let engine = LedgerEngine::connect(&config).await?;
                run_check_command(&engine, json).await?;
            }
        }

        Ok(())
    }
}

fn parse_wallet_id(input: &str) -> Result<WalletId> {
    WalletId::parse(input).with_context(|| format!("Invalid wallet id '{}'", input))
}

async fn run_wallet_command(engine: &LedgerEngine, cmd: WalletCommands) -> Result<()> {
    match cmd {
        WalletCommands::Create {
            firstname,
            lastname,
        } => {
            let wallet = engine.create_wallet(&firstname, &lastname).await?;
            println!("Created wallet: {} ({})", wallet.display_name(), wallet.id);
        }

        WalletCommands::Show { id, json } => {
            let wallet = engine.wallet(&parse_wallet_id(&id)?).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&wallet)?);
            } else {
                println!("Wallet: {}", wallet.display_name());
                println!("  ID:       {}", wallet.id);
                println!("  Balance:  {}", wallet.balance);
                println!(
                    "  Created:  {}",
                    wallet.created_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }

        WalletCommands::List => {
            let wallets = engine.wallets().await?;
            if wallets.is_empty() {
                println!("No wallets found.");
            } else {
                println!("{:<32}  {:<30} {:>12}", "ID", "OWNER", "BALANCE");
                println!("{}", "-".repeat(76));
                for wallet in wallets {
                    println!(
                        "{:<32}  {:<30} {:>12}",
                        wallet.id,
                        wallet.display_name(),
                        wallet.balance
                    );
                }
            }
        }
    }

    Ok(())
}

async fn run_check_command(engine: &LedgerEngine, json: bool) -> Result<()> {
    let report = engine.reconcile().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Checking ledger integrity...\n");
        println!("Wallets:      {}", report.wallet_count);
        println!("Transactions: {}", report.transaction_count);
        println!("Total balance:   {:>12}", report.total_balance);
        println!("Total topped up: {:>12}", report.total_topped_up);
        println!();
    }

    if report.is_consistent() {
        if !json {
            println!("Ledger is consistent.");
        }
    } else {
        if !json {
            println!("Issues found:");
            for discrepancy in &report.discrepancies {
                println!("  - {}", discrepancy);
            }
            for wallet_id in &report.negative_wallets {
                println!("  - wallet {} has a negative balance", wallet_id);
            }
            if report.total_balance != report.total_topped_up {
                println!("  - total balance does not match total top-ups");
            }
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}
