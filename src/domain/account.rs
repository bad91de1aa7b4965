use super::validation::{FieldErrors, Validation};
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Isa,
}

impl AccountType {
    pub const ALL: [AccountType; 1] = [AccountType::Isa];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Isa => "isa",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LedgerError::UnsupportedAccountType(s.to_string()))
    }
}

/// Unvalidated request to open an account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAccount {
    pub customer_id: Uuid,
    pub account_type: String,
}

impl NewAccount {
    pub fn new(customer_id: Uuid, account_type: AccountType) -> Self {
        Self {
            customer_id,
            account_type: account_type.as_str().to_string(),
        }
    }

    /// Checks the structural invariants of the request.
    ///
    /// Error keys are the serialized field names: `customer_id` and
    /// `account_type`.
    pub fn validate(&self) -> Validation {
        let mut errors = FieldErrors::default();

        if self.customer_id.is_nil() {
            errors.insert("customer_id", "Customer ID missing");
        }

        if self.account_type.parse::<AccountType>().is_err() {
            errors.insert("account_type", "Account type invalid or missing");
        }

        errors.into()
    }

    /// Validates and assigns identity and creation time.
    pub fn into_account(self, created_at: DateTime<Utc>) -> Result<Account, LedgerError> {
        self.validate()
            .into_result()
            .map_err(LedgerError::Validation)?;
        let account_type = self.account_type.parse()?;

        Ok(Account {
            id: Uuid::now_v7(),
            customer_id: self.customer_id,
            account_type,
            created_at,
        })
    }
}

/// A customer's account. The type is fixed at creation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Account {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub account_type: AccountType,
    pub created_at: DateTime<Utc>,
}
