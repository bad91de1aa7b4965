use super::account::Account;
use super::customer::Customer;
use super::filter::TransactionFilter;
use super::ledger::{AccountFund, Transaction};
use super::unit_of_work::UnitOfWork;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Persists accounts. Inputs are assumed to be valid.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create(&self, account: Account) -> Result<()>;
    async fn get(&self, account_id: Uuid) -> Result<Option<Account>>;
}

/// Durable holdings and postings.
///
/// All mutation goes through a [`UnitOfWork`]: `begin` waits for the
/// account's lock, the caller stages writes, and `commit` applies them in
/// one atomic step or not at all. Dropping the unit of work instead discards
/// everything staged.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self, account_id: Uuid) -> Result<UnitOfWork>;
    async fn commit(&self, uow: UnitOfWork) -> Result<()>;

    async fn holding(&self, account_fund_id: Uuid) -> Result<Option<AccountFund>>;
    async fn holding_for_fund(&self, account_id: Uuid, fund_id: Uuid)
    -> Result<Option<AccountFund>>;
    async fn holdings(&self, account_id: Uuid) -> Result<Vec<AccountFund>>;

    /// Postings of the account created inside the filter window, oldest first.
    async fn query_transactions(
        &self,
        account_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>>;

    /// Sum of positive customer deposits created at or after `since`.
    ///
    /// Accumulation postings and withdrawals are ignored.
    async fn sum_deposits(&self, account_id: Uuid, since: DateTime<Utc>) -> Result<i64>;
}

/// Calls out to the retail customer service.
#[async_trait]
pub trait CustomerVerification: Send + Sync {
    async fn validate_ni_number(&self, ni_number: &str) -> Result<()>;
    async fn get_customer(&self, customer_id: Uuid) -> Result<Customer>;
}

pub type AccountRepositoryBox = Box<dyn AccountRepository>;
pub type LedgerStoreBox = Box<dyn LedgerStore>;
pub type SharedAccountRepository = Arc<dyn AccountRepository>;
pub type SharedLedgerStore = Arc<dyn LedgerStore>;
pub type SharedCustomerVerification = Arc<dyn CustomerVerification>;
