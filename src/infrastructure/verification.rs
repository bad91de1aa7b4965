use crate::domain::customer::{Customer, is_valid_ni_number};
use crate::domain::ports::CustomerVerification;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// Customer verification backed by a local customer list.
///
/// NI numbers are checked against the published format only; no external
/// service is contacted.
#[derive(Default, Clone)]
pub struct LocalCustomerService {
    customers: HashMap<Uuid, Customer>,
}

impl LocalCustomerService {
    pub fn new(customers: impl IntoIterator<Item = Customer>) -> Self {
        Self {
            customers: customers.into_iter().map(|c| (c.id, c)).collect(),
        }
    }
}

#[async_trait]
impl CustomerVerification for LocalCustomerService {
    async fn validate_ni_number(&self, ni_number: &str) -> Result<()> {
        if is_valid_ni_number(ni_number) {
            Ok(())
        } else {
            Err(LedgerError::Verification(format!(
                "NI '{ni_number}' is invalid"
            )))
        }
    }

    async fn get_customer(&self, customer_id: Uuid) -> Result<Customer> {
        self.customers.get(&customer_id).cloned().ok_or_else(|| {
            LedgerError::Verification(format!("customer {customer_id} does not exist"))
        })
    }
}
