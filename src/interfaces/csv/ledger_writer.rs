use crate::domain::ledger::{AccountFund, Transaction};
use crate::error::Result;
use std::io::Write;

/// Writes postings and holdings as CSV with a header row.
pub struct LedgerWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LedgerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        if transactions.is_empty() {
            self.writer.write_record([
                "id",
                "account_fund_id",
                "fund_id",
                "trade_id",
                "transaction_type",
                "amount",
                "created_at",
            ])?;
        }
        for transaction in transactions {
            self.writer.serialize(transaction)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_holdings(&mut self, holdings: &[AccountFund]) -> Result<()> {
        if holdings.is_empty() {
            self.writer
                .write_record(["id", "account_id", "fund_id", "balance"])?;
        }
        for holding in holdings {
            self.writer.serialize(holding)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
