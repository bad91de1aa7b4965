//! Application layer containing the core business logic orchestration.
//!
//! [`isa::IsaService`] is the entry point for ISA accounts: it checks
//! eligibility, then hands investments to the [`engine::InvestmentEngine`],
//! which enforces the annual limit and applies batches through the
//! [`ledger::Ledger`] one unit of work at a time.

pub mod engine;
pub mod isa;
pub mod ledger;
pub mod registry;
pub mod service;
