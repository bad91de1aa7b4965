use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A non-zero signed amount in the smallest currency unit.
///
/// Positive amounts are purchases or deposits, negative amounts are sales or
/// withdrawals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self, LedgerError> {
        if value != 0 {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidAmount)
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_deposit(&self) -> bool {
        self.0 > 0
    }
}

impl TryFrom<i64> for Amount {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Running balance of a holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub i64);

impl Balance {
    pub const ZERO: Self = Self(0);
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl Balance {
    /// `None` when the result leaves the `i64` range.
    pub fn checked_add(self, amount: Amount) -> Option<Self> {
        self.0.checked_add(amount.0).map(Self)
    }

    pub fn checked_add_delta(self, delta: i64) -> Option<Self> {
        self.0.checked_add(delta).map(Self)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
pub enum TransactionKind {
    /// Money deposited (or withdrawn) by the account owner.
    #[serde(rename = "cust")]
    CustomerDeposit,
    /// Dividends from an accumulation fund reinvested internally.
    #[serde(rename = "acc")]
    Accumulation,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::CustomerDeposit => "cust",
            TransactionKind::Accumulation => "acc",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cust" => Ok(TransactionKind::CustomerDeposit),
            "acc" => Ok(TransactionKind::Accumulation),
            other => Err(LedgerError::UnknownTransactionType(other.to_string())),
        }
    }
}

/// An account's running balance in one fund.
///
/// There is at most one holding per `(account_id, fund_id)` and its balance
/// always equals the sum of the postings made against it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AccountFund {
    pub id: Uuid,
    pub account_id: Uuid,
    pub fund_id: Uuid,
    pub balance: Balance,
}

/// One immutable ledger entry against a holding.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub account_fund_id: Uuid,
    pub fund_id: Uuid,
    pub trade_id: Uuid,
    pub transaction_type: TransactionKind,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Whether the posting counts towards the annual contribution limit.
    pub fn is_customer_deposit(&self) -> bool {
        self.transaction_type == TransactionKind::CustomerDeposit && self.amount.is_deposit()
    }
}

/// A single fund investment within a batch.
///
/// `account_fund_id` is `None` when the account does not hold the fund yet.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct InvestmentInstruction {
    pub fund_id: Uuid,
    pub account_fund_id: Option<Uuid>,
    pub trade_id: Uuid,
    pub transaction_type: TransactionKind,
    pub amount: Amount,
}

impl InvestmentInstruction {
    pub fn deposit(fund_id: Uuid, amount: Amount) -> Self {
        Self {
            fund_id,
            account_fund_id: None,
            trade_id: Uuid::now_v7(),
            transaction_type: TransactionKind::CustomerDeposit,
            amount,
        }
    }

    pub fn in_holding(mut self, account_fund_id: Uuid) -> Self {
        self.account_fund_id = Some(account_fund_id);
        self
    }
}

/// Sum of all amounts in a batch, regardless of sign or kind.
pub fn batch_total(batch: &[InvestmentInstruction]) -> Result<i64, LedgerError> {
    batch.iter().try_fold(0i64, |total, instruction| {
        total
            .checked_add(instruction.amount.value())
            .ok_or(LedgerError::AmountOverflow)
    })
}
