//! Domain types, invariants and the ports the application layer depends on.

pub mod account;
pub mod customer;
pub mod filter;
pub mod ledger;
pub mod ports;
pub mod tax_year;
pub mod unit_of_work;
pub mod validation;
