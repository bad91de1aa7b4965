use super::ledger::{AccountFund, Amount, Balance, InvestmentInstruction, Transaction};
use crate::error::{LedgerError, PostingStep, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;
use uuid::Uuid;

/// Writes staged by a unit of work, applied together on commit.
#[derive(Debug, Default)]
pub struct StagedWrites {
    pub new_holdings: Vec<AccountFund>,
    /// Increments to holdings that already exist in the store.
    pub balance_deltas: BTreeMap<Uuid, i64>,
    pub postings: Vec<Transaction>,
}

impl StagedWrites {
    pub fn is_empty(&self) -> bool {
        self.new_holdings.is_empty() && self.balance_deltas.is_empty() && self.postings.is_empty()
    }
}

/// Exclusive, scoped access to one account's ledger.
///
/// Holds the account lock for its whole lifetime. It ends in exactly one of
/// two ways, both of which consume it: `LedgerStore::commit` or
/// [`UnitOfWork::rollback`]. A unit of work that is simply dropped (for
/// example when the owning future is cancelled) behaves like a rollback.
#[derive(Debug)]
pub struct UnitOfWork {
    account_id: Uuid,
    staged: StagedWrites,
    _guard: OwnedMutexGuard<()>,
}

impl UnitOfWork {
    pub fn new(account_id: Uuid, guard: OwnedMutexGuard<()>) -> Self {
        Self {
            account_id,
            staged: StagedWrites::default(),
            _guard: guard,
        }
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    pub fn staged(&self) -> &StagedWrites {
        &self.staged
    }

    /// A holding created earlier in this unit of work.
    pub fn staged_holding(&self, account_fund_id: Uuid) -> Option<&AccountFund> {
        self.staged
            .new_holdings
            .iter()
            .find(|h| h.id == account_fund_id)
    }

    pub fn staged_holding_for_fund(&self, fund_id: Uuid) -> Option<&AccountFund> {
        self.staged
            .new_holdings
            .iter()
            .find(|h| h.fund_id == fund_id)
    }

    /// Stages a new holding seeded with the first amount invested in it.
    pub fn stage_new_holding(&mut self, fund_id: Uuid, amount: Amount) -> Uuid {
        let holding = AccountFund {
            id: Uuid::now_v7(),
            account_id: self.account_id,
            fund_id,
            balance: Balance::from(amount),
        };
        let id = holding.id;
        self.staged.new_holdings.push(holding);
        id
    }

    /// Adds to a holding's balance, folding into the seed if the holding is
    /// itself staged.
    ///
    /// Fails with an `UpdateBalance` storage error when the staged balance
    /// or delta would overflow.
    pub fn stage_increment(&mut self, account_fund_id: Uuid, amount: Amount) -> Result<()> {
        let overflow = || {
            LedgerError::storage(
                PostingStep::UpdateBalance,
                format!("balance of account fund {account_fund_id} overflows"),
            )
        };

        if let Some(holding) = self
            .staged
            .new_holdings
            .iter_mut()
            .find(|h| h.id == account_fund_id)
        {
            holding.balance = holding.balance.checked_add(amount).ok_or_else(overflow)?;
            return Ok(());
        }
        let delta = self
            .staged
            .balance_deltas
            .entry(account_fund_id)
            .or_default();
        *delta = delta.checked_add(amount.value()).ok_or_else(overflow)?;
        Ok(())
    }

    pub fn stage_posting(
        &mut self,
        account_fund_id: Uuid,
        instruction: &InvestmentInstruction,
        created_at: DateTime<Utc>,
    ) {
        self.staged.postings.push(Transaction {
            id: Uuid::now_v7(),
            account_fund_id,
            fund_id: instruction.fund_id,
            trade_id: instruction.trade_id,
            transaction_type: instruction.transaction_type,
            amount: instruction.amount,
            created_at,
        });
    }

    /// Discards everything staged and releases the account lock.
    pub fn rollback(self) {
        debug!(
            account_id = %self.account_id,
            postings = self.staged.postings.len(),
            "rolling back unit of work"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    async fn unit_of_work() -> UnitOfWork {
        let guard = Arc::new(Mutex::new(())).lock_owned().await;
        UnitOfWork::new(Uuid::new_v4(), guard)
    }

    #[tokio::test]
    async fn test_increment_of_staged_holding_updates_seed() {
        let mut uow = unit_of_work().await;
        let fund = Uuid::new_v4();
        let id = uow.stage_new_holding(fund, Amount::new(100).unwrap());
        uow.stage_increment(id, Amount::new(50).unwrap()).unwrap();

        assert_eq!(uow.staged().new_holdings.len(), 1);
        assert_eq!(uow.staged_holding(id).unwrap().balance, Balance(150));
        assert!(uow.staged().balance_deltas.is_empty());
    }

    #[tokio::test]
    async fn test_increments_of_existing_holding_accumulate() {
        let mut uow = unit_of_work().await;
        let existing = Uuid::new_v4();
        uow.stage_increment(existing, Amount::new(100).unwrap()).unwrap();
        uow.stage_increment(existing, Amount::new(-25).unwrap()).unwrap();

        assert_eq!(uow.staged().balance_deltas.get(&existing), Some(&75));
    }

    #[tokio::test]
    async fn test_increment_overflow_is_rejected() {
        let mut uow = unit_of_work().await;
        let seeded = uow.stage_new_holding(Uuid::new_v4(), Amount::new(i64::MAX).unwrap());
        let err = uow
            .stage_increment(seeded, Amount::new(1).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Storage {
                step: PostingStep::UpdateBalance,
                ..
            }
        ));
        assert_eq!(uow.staged_holding(seeded).unwrap().balance, Balance(i64::MAX));

        let existing = Uuid::new_v4();
        uow.stage_increment(existing, Amount::new(i64::MIN).unwrap()).unwrap();
        assert!(uow.stage_increment(existing, Amount::new(-1).unwrap()).is_err());
        assert_eq!(uow.staged().balance_deltas.get(&existing), Some(&i64::MIN));
    }

    #[tokio::test]
    async fn test_rollback_releases_lock() {
        let lock = Arc::new(Mutex::new(()));
        let uow = UnitOfWork::new(Uuid::new_v4(), lock.clone().lock_owned().await);
        assert!(lock.try_lock().is_err());

        uow.rollback();
        assert!(lock.try_lock().is_ok());
    }
}
