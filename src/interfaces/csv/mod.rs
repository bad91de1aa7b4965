//! CSV adapters for the command line.

pub mod customer_reader;
pub mod instruction_reader;
pub mod ledger_writer;
