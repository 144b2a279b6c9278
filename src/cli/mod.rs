use std::fs::File;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::LedgerService;
use crate::domain::{TIMESTAMP_FORMAT, format_cents, parse_cents};
use crate::io::Exporter;

/// Saldo - Personal Balance Tracker
#[derive(Parser)]
#[command(name = "saldo")]
#[command(about = "A local-first balance tracker backed by an append-only transaction ledger")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "saldo.db")]
    pub database: String,

    /// Ledger owner key
    #[arg(short, long, default_value = "default")]
    pub owner: String,

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

    /// Record income
    Credit {
        /// Amount to add (e.g., "50.00" or "50")
        amount: String,
    },

    /// Record an expense
    Debit {
        /// Amount to subtract (e.g., "12.50")
        amount: String,

        /// Category label (e.g., "Food", "Bills")
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show the current balance
    Balance,

    /// List recorded transactions, most recent first
    History {
        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show income/expense totals and net savings
    Summary,

    /// Delete a transaction by id and recompute the balance
    Delete {
        /// Transaction id
        id: i64,
    },

    /// Verify that the stored balance matches the transaction history
    Check,

    /// Export the ledger to CSV or JSON
    Export {
        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short = 'O', long)]
        output: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Credit { amount } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let result = service.credit(&self.owner, amount_cents).await?;

                println!(
                    "Recorded income of {} (id {}). Balance: {}",
                    format_cents(result.transaction.amount_cents),
                    result.transaction.id,
                    format_cents(result.balance)
                );
            }

            Commands::Debit { amount, category } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let result = service.debit(&self.owner, amount_cents, category).await?;

                println!(
                    "Recorded expense of {} (id {}). Balance: {}",
                    format_cents(result.transaction.amount_cents),
                    result.transaction.id,
                    format_cents(result.balance)
                );
            }

            Commands::Balance => {
                let service = LedgerService::connect(&self.database).await?;
                let balance = service.balance(&self.owner).await?;
                println!("Current balance: {}", format_cents(balance));
            }

            Commands::History { limit } => {
                let service = LedgerService::connect(&self.database).await?;
                let history = service.history(&self.owner).await?;

                if history.is_empty() {
                    println!("No transactions recorded.");
                } else {
                    for entry in history.iter().take(limit.unwrap_or(usize::MAX)) {
                        println!(
                            "{:>6}  {}  {:<7}  {:>12}  {}",
                            entry.id,
                            entry.created_at.format(TIMESTAMP_FORMAT),
                            entry.kind,
                            format_cents(entry.amount_cents),
                            entry.category.as_deref().unwrap_or("-")
                        );
                    }
                }
            }

            Commands::Summary => {
                let service = LedgerService::connect(&self.database).await?;
                let summary = service.summary(&self.owner).await?;

                println!("Total income:   {}", format_cents(summary.total_income));
                println!("Total expenses: {}", format_cents(summary.total_expense));
                println!("Net savings:    {}", format_cents(summary.net));
            }

            Commands::Delete { id } => {
                let service = LedgerService::connect(&self.database).await?;
                let balance = service.delete_transaction(&self.owner, id).await?;

                println!(
                    "Deleted transaction {}. Balance recomputed: {}",
                    id,
                    format_cents(balance)
                );
            }

            Commands::Check => {
                let service = LedgerService::connect(&self.database).await?;
                let report = service.verify(&self.owner).await?;

                if report.is_consistent() {
                    println!(
                        "OK: balance {} matches {} transaction(s)",
                        format_cents(report.stored_balance),
                        report.transaction_count
                    );
                } else {
                    anyhow::bail!(
                        "Ledger inconsistent: stored balance {} but history sums to {}",
                        format_cents(report.stored_balance),
                        format_cents(report.computed_balance)
                    );
                }
            }

            Commands::Export { format, output } => {
                let service = LedgerService::connect(&self.database).await?;
                let exporter = Exporter::new(&service);

                let writer: Box<dyn Write> = match &output {
                    Some(path) => Box::new(
                        File::create(path).with_context(|| format!("Failed to create {}", path))?,
                    ),
                    None => Box::new(io::stdout()),
                };

                match format.as_str() {
                    "csv" => {
                        let count = exporter.export_history_csv(&self.owner, writer).await?;
                        eprintln!("Exported {} transaction(s)", count);
                    }
                    "json" => {
                        exporter.export_full_json(&self.owner, writer).await?;
                    }
                    other => anyhow::bail!("Unknown export format '{}'. Use csv or json", other),
                }
            }
        }

        Ok(())
    }
}
