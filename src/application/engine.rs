use super::ledger::Ledger;
use crate::domain::ledger::{InvestmentInstruction, batch_total};
use crate::domain::tax_year::TaxYearStart;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// Applies investment batches subject to an annual contribution limit.
///
/// The deposit total is read and the batch written inside one unit of work,
/// so concurrent investments into the same account cannot both pass the
/// check against the same stale total.
#[derive(Clone)]
pub struct InvestmentEngine {
    ledger: Ledger,
}

impl InvestmentEngine {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Invests the batch unless it would take the deposits made since the
    /// start of the current tax year over `annual_limit`.
    ///
    /// `annual_limit` is in the same unit as the amounts; `0` forbids any
    /// further deposit.
    pub async fn invest(
        &self,
        account_id: Uuid,
        annual_limit: u64,
        tax_year_start: TaxYearStart,
        batch: &[InvestmentInstruction],
    ) -> Result<()> {
        self.invest_at(account_id, annual_limit, tax_year_start, batch, Utc::now())
            .await
    }

    /// [`InvestmentEngine::invest`] as seen at `now`.
    pub async fn invest_at(
        &self,
        account_id: Uuid,
        annual_limit: u64,
        tax_year_start: TaxYearStart,
        batch: &[InvestmentInstruction],
        now: DateTime<Utc>,
    ) -> Result<()> {
        if batch.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }

        let limit = i64::try_from(annual_limit).unwrap_or(i64::MAX);
        let period_start = tax_year_start.period_start(now);
        let proposed = batch_total(batch)?;

        let mut uow = self.ledger.begin(account_id).await?;

        let invested = match self.ledger.sum_deposits(account_id, period_start).await {
            Ok(invested) => invested,
            Err(e) => {
                uow.rollback();
                return Err(e);
            }
        };

        if invested.saturating_add(proposed) > limit {
            uow.rollback();
            return Err(LedgerError::LimitExceeded {
                limit,
                invested,
                proposed,
            });
        }

        if let Err(e) = self.ledger.stage(&mut uow, batch, now).await {
            uow.rollback();
            return Err(e);
        }

        debug!(
            %account_id,
            invested,
            proposed,
            instructions = batch.len(),
            "investing within annual limit"
        );
        self.ledger.commit(uow).await
    }
}
