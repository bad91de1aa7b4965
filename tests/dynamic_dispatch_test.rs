use chrono::{NaiveDate, Utc};
use isa_ledger::application::engine::InvestmentEngine;
use isa_ledger::application::isa::IsaService;
use isa_ledger::application::ledger::Ledger;
use isa_ledger::application::registry::ServiceRegistry;
use isa_ledger::config::IsaConfig;
use isa_ledger::domain::account::{AccountType, NewAccount};
use isa_ledger::domain::customer::Customer;
use isa_ledger::domain::filter::TransactionFilter;
use isa_ledger::domain::ledger::{Amount, InvestmentInstruction};
use isa_ledger::domain::ports::{AccountRepositoryBox, LedgerStoreBox};
use isa_ledger::infrastructure::in_memory::{InMemoryAccountStore, InMemoryLedgerStore};
use isa_ledger::infrastructure::verification::LocalCustomerService;
use std::sync::Arc;
use uuid::Uuid;

fn customer() -> Customer {
    Customer {
        id: Uuid::new_v4(),
        ni_number: "AB123456C".to_string(),
        tax_residency: "UK".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 14).unwrap(),
    }
}

#[tokio::test]
async fn test_stores_as_trait_objects() {
    let accounts: AccountRepositoryBox = Box::new(InMemoryAccountStore::new());
    let ledger: LedgerStoreBox = Box::new(InMemoryLedgerStore::new());
    let account_id = Uuid::new_v4();

    // Verify Send + Sync by spawning tasks
    let ledger_handle = tokio::spawn(async move {
        let mut uow = ledger.begin(account_id).await.unwrap();
        let fund_id = Uuid::new_v4();
        let instruction = InvestmentInstruction::deposit(fund_id, Amount::new(500).unwrap());
        let holding = uow.stage_new_holding(fund_id, instruction.amount);
        uow.stage_posting(holding, &instruction, Utc::now());
        ledger.commit(uow).await.unwrap();
        ledger.holdings(account_id).await.unwrap()
    });

    let account_handle = tokio::spawn(async move {
        let account = NewAccount::new(Uuid::new_v4(), AccountType::Isa)
            .into_account(Utc::now())
            .unwrap();
        let id = account.id;
        accounts.create(account).await.unwrap();
        accounts.get(id).await.unwrap().unwrap()
    });

    let holdings = ledger_handle.await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].balance.0, 500);

    let account = account_handle.await.unwrap();
    assert_eq!(account.account_type, AccountType::Isa);
}

#[tokio::test]
async fn test_service_resolved_through_registry() {
    let service = IsaService::new(
        Arc::new(InMemoryAccountStore::new()),
        InvestmentEngine::new(Ledger::new(Arc::new(InMemoryLedgerStore::new()))),
        Arc::new(LocalCustomerService::default()),
        IsaConfig::default().with_annual_limit(1_000),
    );
    let registry = ServiceRegistry::default().register(Arc::new(service));

    let isa = registry.service_for("isa").unwrap();
    let account = isa.create_account(customer()).await.unwrap();

    let fund_id = Uuid::new_v4();
    isa.invest(
        account.id,
        &[InvestmentInstruction::deposit(fund_id, Amount::new(600).unwrap())],
    )
    .await
    .unwrap();
    assert_eq!(isa.remaining_allowance(account.id).await.unwrap(), 400);

    let now = Utc::now();
    let window = TransactionFilter::new(now - chrono::Duration::days(30), now + chrono::Duration::days(1));
    let transactions = isa.account_transactions(account.id, window).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].fund_id, fund_id);

    assert!(registry.service_for("sipp").is_err());
}
