use crate::domain::filter::TransactionFilter;
use crate::domain::ledger::{AccountFund, InvestmentInstruction, Transaction};
use crate::domain::ports::SharedLedgerStore;
use crate::domain::unit_of_work::UnitOfWork;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Holdings and postings of every account, with their invariants.
///
/// The ledger turns investment instructions into staged writes on a
/// [`UnitOfWork`]; the store decides nothing beyond its own constraints.
#[derive(Clone)]
pub struct Ledger {
    store: SharedLedgerStore,
}

impl Ledger {
    pub fn new(store: SharedLedgerStore) -> Self {
        Self { store }
    }

    pub async fn begin(&self, account_id: Uuid) -> Result<UnitOfWork> {
        self.store.begin(account_id).await
    }

    pub async fn commit(&self, uow: UnitOfWork) -> Result<()> {
        self.store.commit(uow).await
    }

    /// Stages a holding update and a posting for every instruction.
    ///
    /// An instruction without an account fund id folds into the account's
    /// existing holding for that fund if there is one (committed or staged
    /// earlier in the batch), otherwise it seeds a new holding.
    pub async fn stage(
        &self,
        uow: &mut UnitOfWork,
        batch: &[InvestmentInstruction],
        at: DateTime<Utc>,
    ) -> Result<()> {
        for instruction in batch {
            let holding_id = match instruction.account_fund_id {
                Some(id) => {
                    self.check_holding(uow, id, instruction.fund_id).await?;
                    uow.stage_increment(id, instruction.amount)?;
                    id
                }
                None => match self.find_holding(uow, instruction.fund_id).await? {
                    Some(id) => {
                        uow.stage_increment(id, instruction.amount)?;
                        id
                    }
                    None => uow.stage_new_holding(instruction.fund_id, instruction.amount),
                },
            };
            uow.stage_posting(holding_id, instruction, at);
        }
        Ok(())
    }

    async fn check_holding(&self, uow: &UnitOfWork, id: Uuid, fund_id: Uuid) -> Result<()> {
        let fund = match uow.staged_holding(id) {
            Some(holding) => Some(holding.fund_id),
            None => self
                .store
                .holding(id)
                .await?
                .filter(|h| h.account_id == uow.account_id())
                .map(|h| h.fund_id),
        };
        match fund {
            Some(fund) if fund == fund_id => Ok(()),
            _ => Err(LedgerError::HoldingNotFound(id)),
        }
    }

    async fn find_holding(&self, uow: &UnitOfWork, fund_id: Uuid) -> Result<Option<Uuid>> {
        if let Some(holding) = uow.staged_holding_for_fund(fund_id) {
            return Ok(Some(holding.id));
        }
        Ok(self
            .store
            .holding_for_fund(uow.account_id(), fund_id)
            .await?
            .map(|h| h.id))
    }

    /// Applies the whole batch to the account, or nothing.
    pub async fn post(&self, account_id: Uuid, batch: &[InvestmentInstruction]) -> Result<()> {
        self.post_at(account_id, batch, Utc::now()).await
    }

    pub async fn post_at(
        &self,
        account_id: Uuid,
        batch: &[InvestmentInstruction],
        at: DateTime<Utc>,
    ) -> Result<()> {
        if batch.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }

        let mut uow = self.begin(account_id).await?;
        if let Err(e) = self.stage(&mut uow, batch, at).await {
            uow.rollback();
            return Err(e);
        }
        self.commit(uow).await
    }

    /// Postings of the account inside the window. The filter is validated
    /// before the store is queried.
    pub async fn query_transactions(
        &self,
        account_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        filter
            .validate()
            .into_result()
            .map_err(LedgerError::InvalidFilter)?;
        self.store.query_transactions(account_id, filter).await
    }

    pub async fn sum_deposits(&self, account_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        self.store.sum_deposits(account_id, since).await
    }

    pub async fn holdings(&self, account_id: Uuid) -> Result<Vec<AccountFund>> {
        self.store.holdings(account_id).await
    }
}
