use crate::domain::validation::FieldErrors;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// The write step of a posting batch that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingStep {
    CreateHolding,
    InsertPosting,
    UpdateBalance,
    Commit,
}

impl fmt::Display for PostingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            PostingStep::CreateHolding => "unable to create an account fund",
            PostingStep::InsertPosting => "unable to create an account transaction",
            PostingStep::UpdateBalance => "unable to update fund balance",
            PostingStep::Commit => "unable to commit transaction",
        };
        f.write_str(step)
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Account invalid: {0}")]
    Validation(FieldErrors),
    #[error("Filter values are not valid: {0}")]
    InvalidFilter(FieldErrors),
    #[error("Unable to create account: {0}")]
    PolicyViolation(String),
    #[error(
        "ISA limit will be exceeded by transaction: {invested} invested + {proposed} proposed > {limit}"
    )]
    LimitExceeded {
        limit: i64,
        invested: i64,
        proposed: i64,
    },
    #[error("Investment batch is empty")]
    EmptyBatch,
    #[error("Amount must be non-zero")]
    InvalidAmount,
    #[error("Amounts in the batch add up to more than can be represented")]
    AmountOverflow,
    #[error("Invalid start of tax year: day {day}, month {month}")]
    InvalidTaxYearStart { day: u32, month: u32 },
    #[error("The {0} command needs --db-path: nothing is kept between runs without it")]
    DatabaseRequired(&'static str),
    #[error("Account {0} not found")]
    AccountNotFound(Uuid),
    #[error("Account fund {0} not found")]
    HoldingNotFound(Uuid),
    #[error("Transaction type '{0}' is not recognised")]
    UnknownTransactionType(String),
    #[error("Account type '{0}' is not supported")]
    UnsupportedAccountType(String),
    #[error("Unable to complete investment: {step}: {source}")]
    Storage {
        step: PostingStep,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Customer verification failed: {0}")]
    Verification(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Internal error: {0}")]
    InternalError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    pub fn storage(step: PostingStep, message: impl Into<String>) -> Self {
        LedgerError::Storage {
            step,
            source: message.into().into(),
        }
    }

    /// Eligibility failures and limit breaches.
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            LedgerError::PolicyViolation(_) | LedgerError::LimitExceeded { .. }
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::Validation(_) | LedgerError::InvalidFilter(_)
        )
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            LedgerError::Validation(errors) | LedgerError::InvalidFilter(errors) => Some(errors),
            _ => None,
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(e: rocksdb::Error) -> Self {
        LedgerError::InternalError(Box::new(e))
    }
}
