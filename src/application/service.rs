use crate::domain::account::{Account, AccountType};
use crate::domain::customer::Customer;
use crate::domain::filter::TransactionFilter;
use crate::domain::ledger::{AccountFund, InvestmentInstruction, Transaction};
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// The operations every account type offers.
///
/// Each account type (ISA today) implements this with its own rules for who
/// may open one and how much may be paid in.
#[async_trait]
pub trait AccountService: Send + Sync {
    fn account_type(&self) -> AccountType;

    /// Opens an account for the customer.
    ///
    /// Fails with `PolicyViolation` when the customer is not eligible and
    /// with `Validation` when the resulting account is malformed.
    async fn create_account(&self, customer: Customer) -> Result<Account>;

    /// Makes one or more fund investments. If any of them fails, none are
    /// applied.
    async fn invest(&self, account_id: Uuid, batch: &[InvestmentInstruction]) -> Result<()>;

    /// Transactions of the account inside the filter window (at most a year).
    async fn account_transactions(
        &self,
        account_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>>;

    async fn holdings(&self, account_id: Uuid) -> Result<Vec<AccountFund>>;

    /// How much may still be deposited in the current contribution period.
    async fn remaining_allowance(&self, account_id: Uuid) -> Result<u64>;
}
