use super::locks::AccountLocks;
use crate::domain::account::Account;
use crate::domain::filter::TransactionFilter;
use crate::domain::ledger::{AccountFund, Transaction};
use crate::domain::ports::{AccountRepository, LedgerStore};
use crate::domain::unit_of_work::UnitOfWork;
use crate::error::{LedgerError, PostingStep, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Column Family for storing accounts, keyed by account id.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for storing holdings, keyed by account fund id.
pub const CF_ACCOUNT_FUNDS: &str = "account_funds";
/// Column Family mapping `account_id ‖ fund_id` to the account fund id.
pub const CF_ACCOUNT_FUND_INDEX: &str = "account_fund_index";
/// Column Family for postings, keyed by `account_id ‖ created_at ‖ id`.
pub const CF_ACCOUNT_TRANSACTIONS: &str = "account_transactions";

/// A persistent store implementation using RocksDB.
///
/// Holds accounts, holdings and postings in separate Column Families. Ids are
/// stored as their 16 raw bytes. Postings are keyed so that one account's
/// postings are contiguous and ordered by creation time, which turns window
/// queries and deposit sums into a single range scan.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    locks: AccountLocks,
}

/// Big-endian encoding of the timestamp with the sign bit flipped, so byte
/// order matches time order.
fn timestamp_key(at: DateTime<Utc>) -> [u8; 8] {
    ((at.timestamp_micros() as u64) ^ (1 << 63)).to_be_bytes()
}

fn transaction_key(account_id: Uuid, created_at: DateTime<Utc>, id: Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(&timestamp_key(created_at));
    key.extend_from_slice(id.as_bytes());
    key
}

fn index_key(account_id: Uuid, fund_id: Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(fund_id.as_bytes());
    key
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        LedgerError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Serialization error: {}", e),
        )))
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        LedgerError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Deserialization error: {}", e),
        )))
    })
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that all required column families exist.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [
            CF_ACCOUNTS,
            CF_ACCOUNT_FUNDS,
            CF_ACCOUNT_FUND_INDEX,
            CF_ACCOUNT_TRANSACTIONS,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path.as_ref(), families)?;
        debug!(path = %path.as_ref().display(), "opened ledger database");

        Ok(Self {
            db: Arc::new(db),
            locks: AccountLocks::new(),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::InternalError(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    fn read_holding(&self, account_fund_id: Uuid) -> Result<Option<AccountFund>> {
        let cf = self.cf(CF_ACCOUNT_FUNDS)?;
        match self.db.get_cf(cf, account_fund_id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Visits the account's postings created at or after `from`, oldest first,
    /// until `visit` returns `false`.
    fn scan_transactions(
        &self,
        account_id: Uuid,
        from: DateTime<Utc>,
        mut visit: impl FnMut(Transaction) -> bool,
    ) -> Result<()> {
        let cf = self.cf(CF_ACCOUNT_TRANSACTIONS)?;
        let mut start = Vec::with_capacity(24);
        start.extend_from_slice(account_id.as_bytes());
        start.extend_from_slice(&timestamp_key(from));

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&start, Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(account_id.as_bytes()) {
                break;
            }
            if !visit(decode(&value)?) {
                break;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for RocksDBStore {
    async fn create(&self, account: Account) -> Result<()> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let key = account.id.as_bytes();
        if self.db.get_pinned_cf(cf, key)?.is_some() {
            return Err(LedgerError::InternalError(
                format!("account {} already exists", account.id).into(),
            ));
        }
        self.db.put_cf(cf, key, encode(&account)?)?;
        Ok(())
    }

    async fn get(&self, account_id: Uuid) -> Result<Option<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        match self.db.get_cf(cf, account_id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn begin(&self, account_id: Uuid) -> Result<UnitOfWork> {
        let guard = self.locks.acquire(account_id).await;
        Ok(UnitOfWork::new(account_id, guard))
    }

    /// Validates every staged write against the database, then applies them
    /// with one `WriteBatch`.
    async fn commit(&self, uow: UnitOfWork) -> Result<()> {
        let staged = uow.staged();
        let funds = self.cf(CF_ACCOUNT_FUNDS)?;
        let index = self.cf(CF_ACCOUNT_FUND_INDEX)?;
        let transactions = self.cf(CF_ACCOUNT_TRANSACTIONS)?;
        let mut batch = WriteBatch::default();

        for holding in &staged.new_holdings {
            let key = index_key(holding.account_id, holding.fund_id);
            if self.db.get_pinned_cf(index, &key)?.is_some() {
                return Err(LedgerError::storage(
                    PostingStep::CreateHolding,
                    format!(
                        "account {} already holds fund {}",
                        holding.account_id, holding.fund_id
                    ),
                ));
            }
            batch.put_cf(index, key, holding.id.as_bytes());
            batch.put_cf(funds, holding.id.as_bytes(), encode(holding)?);
        }

        let mut updated: HashMap<Uuid, AccountFund> = HashMap::new();
        for (id, delta) in &staged.balance_deltas {
            let mut holding = match self.read_holding(*id)? {
                Some(holding) if holding.account_id == uow.account_id() => holding,
                _ => {
                    return Err(LedgerError::storage(
                        PostingStep::UpdateBalance,
                        format!("account fund {id} does not exist"),
                    ));
                }
            };
            holding.balance = holding.balance.checked_add_delta(*delta).ok_or_else(|| {
                LedgerError::storage(
                    PostingStep::UpdateBalance,
                    format!("balance of account fund {id} overflows"),
                )
            })?;
            updated.insert(*id, holding);
        }
        for (id, holding) in &updated {
            batch.put_cf(funds, id.as_bytes(), encode(holding)?);
        }

        for posting in &staged.postings {
            let key = transaction_key(uow.account_id(), posting.created_at, posting.id);
            if self.db.get_pinned_cf(transactions, &key)?.is_some() {
                return Err(LedgerError::storage(
                    PostingStep::InsertPosting,
                    format!("duplicate transaction id {}", posting.id),
                ));
            }
            batch.put_cf(transactions, key, encode(posting)?);
        }

        self.db
            .write(batch)
            .map_err(|e| LedgerError::storage(PostingStep::Commit, e.to_string()))?;
        debug!(
            account_id = %uow.account_id(),
            postings = staged.postings.len(),
            "committed unit of work"
        );
        Ok(())
    }

    async fn holding(&self, account_fund_id: Uuid) -> Result<Option<AccountFund>> {
        self.read_holding(account_fund_id)
    }

    async fn holding_for_fund(
        &self,
        account_id: Uuid,
        fund_id: Uuid,
    ) -> Result<Option<AccountFund>> {
        let index = self.cf(CF_ACCOUNT_FUND_INDEX)?;
        match self.db.get_cf(index, index_key(account_id, fund_id))? {
            Some(bytes) => {
                let id = Uuid::from_slice(&bytes)
                    .map_err(|e| LedgerError::InternalError(Box::new(e)))?;
                self.read_holding(id)
            }
            None => Ok(None),
        }
    }

    async fn holdings(&self, account_id: Uuid) -> Result<Vec<AccountFund>> {
        let index = self.cf(CF_ACCOUNT_FUND_INDEX)?;
        let mut holdings = Vec::new();
        let iter = self.db.iterator_cf(
            index,
            IteratorMode::From(account_id.as_bytes(), Direction::Forward),
        );

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(account_id.as_bytes()) {
                break;
            }
            let id =
                Uuid::from_slice(&value).map_err(|e| LedgerError::InternalError(Box::new(e)))?;
            if let Some(holding) = self.read_holding(id)? {
                holdings.push(holding);
            }
        }

        holdings.sort_by_key(|h| h.id);
        Ok(holdings)
    }

    async fn query_transactions(
        &self,
        account_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let mut postings = Vec::new();
        self.scan_transactions(account_id, filter.start_date, |posting| {
            if posting.created_at > filter.end_date {
                return false;
            }
            postings.push(posting);
            true
        })?;
        Ok(postings)
    }

    async fn sum_deposits(&self, account_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        let mut total = 0i64;
        self.scan_transactions(account_id, since, |posting| {
            if posting.is_customer_deposit() {
                total = total.saturating_add(posting.amount.value());
            }
            true
        })?;
        Ok(total)
    }
}
