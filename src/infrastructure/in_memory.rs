use super::locks::AccountLocks;
use crate::domain::account::Account;
use crate::domain::filter::TransactionFilter;
use crate::domain::ledger::{AccountFund, Balance, Transaction};
use crate::domain::ports::{AccountRepository, LedgerStore};
use crate::domain::unit_of_work::UnitOfWork;
use crate::error::{LedgerError, PostingStep, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// A thread-safe in-memory store for accounts.
///
/// Ideal for testing or single-run usage where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
}

impl InMemoryAccountStore {
    /// Creates a new, empty in-memory account store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountStore {
    async fn create(&self, account: Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.id) {
            return Err(LedgerError::InternalError(
                format!("account {} already exists", account.id).into(),
            ));
        }
        accounts.insert(account.id, account);
        Ok(())
    }

    async fn get(&self, account_id: Uuid) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&account_id).cloned())
    }
}

#[derive(Default)]
struct LedgerTables {
    holdings: HashMap<Uuid, AccountFund>,
    /// `(account_id, fund_id)` -> holding id; the uniqueness constraint.
    holding_index: HashMap<(Uuid, Uuid), Uuid>,
    /// Postings per account in insertion order.
    postings: HashMap<Uuid, Vec<Transaction>>,
    posting_ids: HashSet<Uuid>,
}

/// A thread-safe in-memory ledger of holdings and postings.
///
/// All tables sit behind a single `RwLock` so a commit validates and applies
/// a whole batch while readers see either none or all of it.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    tables: Arc<RwLock<LedgerTables>>,
    locks: AccountLocks,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerTables {
    /// Checks every constraint the staged writes touch and returns the new
    /// balances of the existing holdings. Nothing is mutated.
    fn check(&self, uow: &UnitOfWork) -> Result<Vec<(Uuid, Balance)>> {
        let staged = uow.staged();

        for holding in &staged.new_holdings {
            if self
                .holding_index
                .contains_key(&(holding.account_id, holding.fund_id))
            {
                return Err(LedgerError::storage(
                    PostingStep::CreateHolding,
                    format!(
                        "account {} already holds fund {}",
                        holding.account_id, holding.fund_id
                    ),
                ));
            }
        }

        let mut balances = Vec::with_capacity(staged.balance_deltas.len());
        for (id, delta) in &staged.balance_deltas {
            let balance = match self.holdings.get(id) {
                Some(holding) if holding.account_id == uow.account_id() => holding.balance,
                _ => {
                    return Err(LedgerError::storage(
                        PostingStep::UpdateBalance,
                        format!("account fund {id} does not exist"),
                    ));
                }
            };
            let balance = balance.checked_add_delta(*delta).ok_or_else(|| {
                LedgerError::storage(
                    PostingStep::UpdateBalance,
                    format!("balance of account fund {id} overflows"),
                )
            })?;
            balances.push((*id, balance));
        }

        for posting in &staged.postings {
            if self.posting_ids.contains(&posting.id) {
                return Err(LedgerError::storage(
                    PostingStep::InsertPosting,
                    format!("duplicate transaction id {}", posting.id),
                ));
            }
        }

        Ok(balances)
    }

    fn apply(&mut self, uow: &UnitOfWork, balances: Vec<(Uuid, Balance)>) {
        let staged = uow.staged();

        for holding in &staged.new_holdings {
            self.holding_index
                .insert((holding.account_id, holding.fund_id), holding.id);
            self.holdings.insert(holding.id, holding.clone());
        }

        for (id, balance) in balances {
            if let Some(holding) = self.holdings.get_mut(&id) {
                holding.balance = balance;
            }
        }

        let postings = self.postings.entry(uow.account_id()).or_default();
        for posting in &staged.postings {
            self.posting_ids.insert(posting.id);
            postings.push(posting.clone());
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self, account_id: Uuid) -> Result<UnitOfWork> {
        let guard = self.locks.acquire(account_id).await;
        Ok(UnitOfWork::new(account_id, guard))
    }

    async fn commit(&self, uow: UnitOfWork) -> Result<()> {
        let mut tables = self.tables.write().await;
        let balances = tables.check(&uow)?;
        tables.apply(&uow, balances);
        debug!(
            account_id = %uow.account_id(),
            postings = uow.staged().postings.len(),
            "committed unit of work"
        );
        Ok(())
    }

    async fn holding(&self, account_fund_id: Uuid) -> Result<Option<AccountFund>> {
        let tables = self.tables.read().await;
        Ok(tables.holdings.get(&account_fund_id).cloned())
    }

    async fn holding_for_fund(
        &self,
        account_id: Uuid,
        fund_id: Uuid,
    ) -> Result<Option<AccountFund>> {
        let tables = self.tables.read().await;
        Ok(tables
            .holding_index
            .get(&(account_id, fund_id))
            .and_then(|id| tables.holdings.get(id))
            .cloned())
    }

    async fn holdings(&self, account_id: Uuid) -> Result<Vec<AccountFund>> {
        let tables = self.tables.read().await;
        let mut holdings: Vec<AccountFund> = tables
            .holdings
            .values()
            .filter(|h| h.account_id == account_id)
            .cloned()
            .collect();
        holdings.sort_by_key(|h| h.id);
        Ok(holdings)
    }

    async fn query_transactions(
        &self,
        account_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let tables = self.tables.read().await;
        let mut postings: Vec<Transaction> = tables
            .postings
            .get(&account_id)
            .into_iter()
            .flatten()
            .filter(|t| filter.contains(t.created_at))
            .cloned()
            .collect();
        postings.sort_by_key(|t| (t.created_at, t.id));
        Ok(postings)
    }

    async fn sum_deposits(&self, account_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .postings
            .get(&account_id)
            .into_iter()
            .flatten()
            .filter(|t| t.created_at >= since && t.is_customer_deposit())
            .fold(0i64, |total, t| total.saturating_add(t.amount.value())))
    }
}
