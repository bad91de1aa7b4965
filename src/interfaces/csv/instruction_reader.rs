use crate::domain::ledger::{Amount, InvestmentInstruction, TransactionKind};
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

/// One row of an instruction file. Only `fund_id` and `amount` are required.
#[derive(Debug, Deserialize)]
struct InstructionRecord {
    fund_id: Uuid,
    account_fund_id: Option<Uuid>,
    trade_id: Option<Uuid>,
    transaction_type: Option<TransactionKind>,
    amount: i64,
}

impl TryFrom<InstructionRecord> for InvestmentInstruction {
    type Error = LedgerError;

    fn try_from(record: InstructionRecord) -> Result<Self> {
        Ok(Self {
            fund_id: record.fund_id,
            account_fund_id: record.account_fund_id,
            trade_id: record.trade_id.unwrap_or_else(Uuid::now_v7),
            transaction_type: record
                .transaction_type
                .unwrap_or(TransactionKind::CustomerDeposit),
            amount: Amount::new(record.amount)?,
        })
    }
}

/// Reads a batch of investment instructions from a CSV source.
///
/// Columns: `fund_id, account_fund_id, trade_id, transaction_type, amount`.
/// A missing trade id is generated and a missing type means a customer
/// deposit.
pub struct InstructionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> InstructionReader<R> {
    /// Creates a new `InstructionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and converts the instructions.
    pub fn instructions(self) -> impl Iterator<Item = Result<InvestmentInstruction>> {
        self.reader
            .into_deserialize::<InstructionRecord>()
            .map(|result| InvestmentInstruction::try_from(result?))
    }

    /// Reads the whole file as one batch; any bad row rejects the batch.
    pub fn batch(self) -> Result<Vec<InvestmentInstruction>> {
        self.instructions().collect()
    }
}
