use crate::application::engine::InvestmentEngine;
use crate::application::isa::IsaService;
use crate::application::ledger::Ledger;
use crate::application::service::AccountService;
use crate::config::{DEFAULT_ANNUAL_LIMIT, IsaConfig};
use crate::domain::filter::TransactionFilter;
use crate::domain::ports::{SharedAccountRepository, SharedLedgerStore};
use crate::domain::tax_year::TaxYearStart;
use crate::error::{LedgerError, Result};
use crate::infrastructure::in_memory::{InMemoryAccountStore, InMemoryLedgerStore};
use crate::infrastructure::verification::LocalCustomerService;
use crate::interfaces::csv::customer_reader::CustomerReader;
use crate::interfaces::csv::instruction_reader::InstructionReader;
use crate::interfaces::csv::ledger_writer::LedgerWriter;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Open ISA accounts and invest within the annual allowance", long_about = None)]
pub struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Maximum customer deposits per tax year, in pence.
    #[arg(long, env = "ISA_ANNUAL_LIMIT", default_value_t = DEFAULT_ANNUAL_LIMIT, global = true)]
    pub annual_limit: u64,

    /// First day of the tax year as DD-MM.
    #[arg(long, env = "ISA_TAX_YEAR_START", default_value_t = TaxYearStart::UK, global = true)]
    pub tax_year_start: TaxYearStart,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open an ISA for a customer listed in a customers CSV file
    Open {
        /// CSV with columns id, ni_number, tax_residency, date_of_birth
        #[arg(long)]
        customers: PathBuf,
        #[arg(long)]
        customer_id: Uuid,
    },
    /// Invest a batch of instructions read from a CSV file, all or nothing
    Invest {
        #[arg(long)]
        account_id: Uuid,
        /// CSV with columns fund_id, account_fund_id, trade_id, transaction_type, amount
        input: PathBuf,
    },
    /// List an account's transactions inside a window of at most one year
    Transactions {
        #[arg(long)]
        account_id: Uuid,
        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(long, value_parser = parse_timestamp)]
        from: DateTime<Utc>,
        /// RFC 3339 timestamp or YYYY-MM-DD (end of day)
        #[arg(long, value_parser = parse_end_timestamp)]
        to: DateTime<Utc>,
    },
    /// List an account's fund holdings
    Holdings {
        #[arg(long)]
        account_id: Uuid,
    },
    /// Show how much can still be deposited this tax year
    Allowance {
        #[arg(long)]
        account_id: Uuid,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Open { .. } => "open",
            Command::Invest { .. } => "invest",
            Command::Transactions { .. } => "transactions",
            Command::Holdings { .. } => "holdings",
            Command::Allowance { .. } => "allowance",
        }
    }

    /// Argument checks that need no storage.
    fn validate(&self) -> Result<()> {
        if let Command::Transactions { from, to, .. } = self {
            TransactionFilter::new(*from, *to)
                .validate()
                .into_result()
                .map_err(LedgerError::InvalidFilter)?;
        }
        Ok(())
    }
}

/// Accepts an RFC 3339 timestamp or a bare date. A bare date is the first
/// instant of that day, or the last one when `end_of_day` is set.
fn parse_date_or_timestamp(value: &str, end_of_day: bool) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected RFC 3339 timestamp or YYYY-MM-DD: {e}"))?;
    let time = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| format!("invalid date '{value}'"))
}

fn parse_timestamp(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_date_or_timestamp(value, false)
}

fn parse_end_timestamp(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_date_or_timestamp(value, true)
}

impl Cli {
    fn config(&self) -> IsaConfig {
        IsaConfig::default()
            .with_annual_limit(self.annual_limit)
            .with_tax_year_start(self.tax_year_start)
    }

    /// Opens the database at `--db-path`. Only `open` may run without one,
    /// and the account it creates is then discarded.
    fn stores(&self) -> Result<(SharedAccountRepository, SharedLedgerStore)> {
        match &self.db_path {
            #[cfg(feature = "storage-rocksdb")]
            Some(path) => {
                let store = crate::infrastructure::rocksdb::RocksDBStore::open(path)?;
                Ok((Arc::new(store.clone()), Arc::new(store)))
            }
            #[cfg(not(feature = "storage-rocksdb"))]
            Some(_) => Err(LedgerError::InternalError(
                "--db-path requires the storage-rocksdb feature".into(),
            )),
            None if matches!(self.command, Command::Open { .. }) => {
                warn!("no --db-path given; the account will not be kept");
                Ok((
                    Arc::new(InMemoryAccountStore::new()),
                    Arc::new(InMemoryLedgerStore::new()),
                ))
            }
            None => Err(LedgerError::DatabaseRequired(self.command.name())),
        }
    }

    /// Checks the arguments, opens storage and executes the subcommand.
    pub async fn run(self, out: &mut impl Write) -> Result<()> {
        self.command.validate()?;
        let (accounts, ledger) = self.stores()?;
        self.execute(accounts, ledger, out).await
    }

    /// Executes the subcommand against the given stores, writing its result
    /// to `out`.
    pub async fn execute(
        self,
        accounts: SharedAccountRepository,
        ledger: SharedLedgerStore,
        out: &mut impl Write,
    ) -> Result<()> {
        let verification = match &self.command {
            Command::Open { customers, .. } => {
                LocalCustomerService::new(CustomerReader::new(File::open(customers)?).customers()?)
            }
            _ => LocalCustomerService::default(),
        };
        let service = IsaService::new(
            accounts,
            InvestmentEngine::new(Ledger::new(ledger)),
            Arc::new(verification),
            self.config(),
        );

        match &self.command {
            Command::Open { customer_id, .. } => {
                let account = service.open_account_for(*customer_id).await?;
                info!(account_id = %account.id, "account opened");
                serde_json::to_writer_pretty(&mut *out, &account)?;
                writeln!(out)?;
            }
            Command::Invest { account_id, input } => {
                let batch = InstructionReader::new(File::open(input)?).batch()?;
                service.invest(*account_id, &batch).await?;
                info!(%account_id, instructions = batch.len(), "batch invested");
                writeln!(out, "invested {} instruction(s)", batch.len())?;
            }
            Command::Transactions {
                account_id,
                from,
                to,
            } => {
                let transactions = service
                    .account_transactions(*account_id, TransactionFilter::new(*from, *to))
                    .await?;
                LedgerWriter::new(out).write_transactions(&transactions)?;
            }
            Command::Holdings { account_id } => {
                let holdings = service.holdings(*account_id).await?;
                LedgerWriter::new(out).write_holdings(&holdings)?;
            }
            Command::Allowance { account_id } => {
                let remaining = service.remaining_allowance(*account_id).await?;
                let renews = self.tax_year_start.next_period_start(Utc::now());
                writeln!(
                    out,
                    "remaining={} limit={} renews={}",
                    remaining,
                    self.annual_limit,
                    renews.date_naive()
                )?;
            }
        }
        Ok(())
    }
}

/// Runs the parsed command against standard output.
pub async fn run(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli.run(&mut out).await
}
