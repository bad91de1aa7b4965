use super::service::AccountService;
use crate::domain::account::AccountType;
use crate::error::{LedgerError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps each account type to the service implementing its rules.
#[derive(Default, Clone)]
pub struct ServiceRegistry {
    services: HashMap<AccountType, Arc<dyn AccountService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the service under its own account type, replacing any
    /// previous registration.
    pub fn register(mut self, service: Arc<dyn AccountService>) -> Self {
        self.services.insert(service.account_type(), service);
        self
    }

    pub fn service(&self, account_type: AccountType) -> Result<Arc<dyn AccountService>> {
        self.services
            .get(&account_type)
            .cloned()
            .ok_or_else(|| LedgerError::UnsupportedAccountType(account_type.to_string()))
    }

    /// Looks a service up by the account type's text, e.g. `"isa"`.
    pub fn service_for(&self, account_type: &str) -> Result<Arc<dyn AccountService>> {
        self.service(account_type.parse()?)
    }
}
