use super::engine::InvestmentEngine;
use super::service::AccountService;
use crate::config::IsaConfig;
use crate::domain::account::{Account, AccountType, NewAccount};
use crate::domain::customer::Customer;
use crate::domain::filter::TransactionFilter;
use crate::domain::ledger::{AccountFund, InvestmentInstruction, Transaction};
use crate::domain::ports::{SharedAccountRepository, SharedCustomerVerification};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// Service to manage ISA accounts.
///
/// ISAs must adhere to the following rules:
/// - Only available to UK tax residents over the age of 18.
/// - The account holder must have a valid NI number.
/// - Customer deposits per tax year are limited; withdrawals are not.
pub struct IsaService {
    accounts: SharedAccountRepository,
    engine: InvestmentEngine,
    verification: SharedCustomerVerification,
    config: IsaConfig,
}

impl IsaService {
    pub fn new(
        accounts: SharedAccountRepository,
        engine: InvestmentEngine,
        verification: SharedCustomerVerification,
        config: IsaConfig,
    ) -> Self {
        Self {
            accounts,
            engine,
            verification,
            config,
        }
    }

    pub fn config(&self) -> &IsaConfig {
        &self.config
    }

    /// Looks the customer up with the customer service, then opens an ISA.
    pub async fn open_account_for(&self, customer_id: Uuid) -> Result<Account> {
        let customer = self
            .verification
            .get_customer(customer_id)
            .await
            .map_err(|e| LedgerError::PolicyViolation(format!("Customer lookup failed: {e}")))?;
        self.create_account(customer).await
    }

    /// [`AccountService::create_account`] with eligibility judged at `now`.
    pub async fn create_account_at(&self, customer: Customer, now: DateTime<Utc>) -> Result<Account> {
        if !customer.is_tax_resident_in(&self.config.required_tax_residency) {
            return Err(LedgerError::PolicyViolation(format!(
                "Only {} tax residents can open an ISA",
                self.config.required_tax_residency.to_uppercase()
            )));
        }

        if !customer.has_reached_age(self.config.minimum_age, now.date_naive()) {
            return Err(LedgerError::PolicyViolation(format!(
                "Only customers who are over the age of {} can open an ISA",
                self.config.minimum_age
            )));
        }

        if let Err(e) = self.verification.validate_ni_number(&customer.ni_number).await {
            return Err(LedgerError::PolicyViolation(format!(
                "Customer NI number could not be verified: {e}"
            )));
        }

        let account = NewAccount::new(customer.id, AccountType::Isa).into_account(now)?;
        self.accounts.create(account.clone()).await?;
        debug!(account_id = %account.id, customer_id = %customer.id, "opened ISA");
        Ok(account)
    }

    async fn require_account(&self, account_id: Uuid) -> Result<Account> {
        match self.accounts.get(account_id).await? {
            Some(account) if account.account_type == AccountType::Isa => Ok(account),
            _ => Err(LedgerError::AccountNotFound(account_id)),
        }
    }
}

#[async_trait]
impl AccountService for IsaService {
    fn account_type(&self) -> AccountType {
        AccountType::Isa
    }

    async fn create_account(&self, customer: Customer) -> Result<Account> {
        self.create_account_at(customer, Utc::now()).await
    }

    async fn invest(&self, account_id: Uuid, batch: &[InvestmentInstruction]) -> Result<()> {
        self.require_account(account_id).await?;
        self.engine
            .invest(
                account_id,
                self.config.annual_limit,
                self.config.tax_year_start,
                batch,
            )
            .await
    }

    async fn account_transactions(
        &self,
        account_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        self.engine
            .ledger()
            .query_transactions(account_id, &filter)
            .await
    }

    async fn holdings(&self, account_id: Uuid) -> Result<Vec<AccountFund>> {
        self.engine.ledger().holdings(account_id).await
    }

    async fn remaining_allowance(&self, account_id: Uuid) -> Result<u64> {
        self.require_account(account_id).await?;
        let since = self.config.tax_year_start.period_start(Utc::now());
        let invested = self.engine.ledger().sum_deposits(account_id, since).await?;
        let invested = u64::try_from(invested).unwrap_or(0);
        Ok(self.config.annual_limit.saturating_sub(invested))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ledger::Ledger;
    use crate::domain::ledger::{Amount, Balance};
    use crate::domain::tax_year::TaxYearStart;
    use crate::infrastructure::in_memory::{InMemoryAccountStore, InMemoryLedgerStore};
    use crate::infrastructure::verification::LocalCustomerService;
    use chrono::{Duration, Months};
    use std::sync::Arc;

    fn customer(tax_residency: &str, age: u32, ni_number: &str) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            ni_number: ni_number.to_string(),
            tax_residency: tax_residency.to_string(),
            date_of_birth: Utc::now()
                .date_naive()
                .checked_sub_months(Months::new(age * 12))
                .unwrap(),
        }
    }

    fn service(annual_limit: u64, customers: Vec<Customer>) -> IsaService {
        let config = IsaConfig::default()
            .with_annual_limit(annual_limit)
            .with_tax_year_start(TaxYearStart::new(1, 1).unwrap());
        IsaService::new(
            Arc::new(InMemoryAccountStore::new()),
            InvestmentEngine::new(Ledger::new(Arc::new(InMemoryLedgerStore::new()))),
            Arc::new(LocalCustomerService::new(customers)),
            config,
        )
    }

    fn deposit(fund_id: Uuid, amount: i64) -> InvestmentInstruction {
        InvestmentInstruction::deposit(fund_id, Amount::new(amount).unwrap())
    }

    fn around_now() -> TransactionFilter {
        let now = Utc::now();
        TransactionFilter::new(now - Duration::days(1), now + Duration::days(1))
    }

    #[tokio::test]
    async fn test_ineligible_customers_are_refused() {
        let service = service(0, vec![]);
        let cases = [
            ("non-uk tax resident", customer("fr", 19, "AB123456C")),
            ("customer under 18", customer("uk", 17, "AB123456C")),
            ("NI number is invalid", customer("uk", 19, "INVALID")),
        ];

        for (name, customer) in cases {
            let err = service.create_account(customer).await.unwrap_err();
            assert!(
                matches!(err, LedgerError::PolicyViolation(_)),
                "{name}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_residency_message_follows_config() {
        let config = IsaConfig {
            required_tax_residency: "ie".to_string(),
            ..IsaConfig::default()
        };
        let service = IsaService::new(
            Arc::new(InMemoryAccountStore::new()),
            InvestmentEngine::new(Ledger::new(Arc::new(InMemoryLedgerStore::new()))),
            Arc::new(LocalCustomerService::default()),
            config,
        );

        let err = service
            .create_account(customer("uk", 30, "AB123456C"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to create account: Only IE tax residents can open an ISA"
        );
        assert!(
            service
                .create_account(customer("IE", 30, "AB123456C"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_eligible_customer_gets_isa() {
        let service = service(0, vec![]);
        let customer = customer("uk", 20, "AB123456C");

        let account = service.create_account(customer.clone()).await.unwrap();
        assert_eq!(account.account_type, AccountType::Isa);
        assert_eq!(account.account_type.as_str(), "isa");
        assert_eq!(account.customer_id, customer.id);
    }

    #[tokio::test]
    async fn test_nil_customer_id_is_a_validation_error() {
        let service = service(0, vec![]);
        let mut customer = customer("uk", 20, "AB123456C");
        customer.id = Uuid::nil();

        let err = service.create_account(customer).await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.field_errors().unwrap().contains("customer_id"));
    }

    #[tokio::test]
    async fn test_open_account_for_known_and_unknown_customers() {
        let known = customer("uk", 30, "AB123456C");
        let service = service(0, vec![known.clone()]);

        let account = service.open_account_for(known.id).await.unwrap();
        assert_eq!(account.customer_id, known.id);

        let err = service.open_account_for(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, LedgerError::PolicyViolation(_)));
    }

    #[tokio::test]
    async fn test_invest_in_fund_and_list_transactions() {
        let service = service(200, vec![]);
        let account = service
            .create_account(customer("uk", 20, "AB123456C"))
            .await
            .unwrap();

        service
            .invest(account.id, &[deposit(Uuid::new_v4(), 100)])
            .await
            .unwrap();

        let transactions = service
            .account_transactions(account.id, around_now())
            .await
            .unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(service.remaining_allowance(account.id).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_annual_limit_scenario() {
        let service = service(200, vec![]);
        let account = service
            .create_account(customer("uk", 20, "AB123456C"))
            .await
            .unwrap();
        let fund = Uuid::new_v4();

        service.invest(account.id, &[deposit(fund, 100)]).await.unwrap();
        service.invest(account.id, &[deposit(fund, 100)]).await.unwrap();
        let err = service.invest(account.id, &[deposit(fund, 1)]).await.unwrap_err();
        assert!(matches!(err, LedgerError::LimitExceeded { .. }));

        let holdings = service.holdings(account.id).await.unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].balance, Balance(200));
        assert_eq!(service.remaining_allowance(account.id).await.unwrap(), 0);
        assert_eq!(
            service
                .account_transactions(account.id, around_now())
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_cannot_invest_over_limit() {
        let service = service(50, vec![]);
        let account = service
            .create_account(customer("uk", 20, "AB123456C"))
            .await
            .unwrap();

        let err = service
            .invest(account.id, &[deposit(Uuid::new_v4(), 100)])
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::LimitExceeded { .. }));
    }

    #[tokio::test]
    async fn test_invest_into_unknown_account() {
        let service = service(200, vec![]);
        let missing = Uuid::new_v4();
        let err = service
            .invest(missing, &[deposit(Uuid::new_v4(), 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_invalid_filter_is_reported_by_field() {
        let service = service(200, vec![]);
        let now = Utc::now();
        let filter = TransactionFilter::new(now, now + Duration::days(800));
        let err = service
            .account_transactions(Uuid::new_v4(), filter)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidFilter(_)));
        assert!(err.field_errors().unwrap().contains("end_date"));
    }
}
