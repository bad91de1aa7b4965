use crate::domain::customer::Customer;
use crate::error::{LedgerError, Result};
use std::io::Read;

/// Reads customers from a CSV source with the columns
/// `id, ni_number, tax_residency, date_of_birth`.
pub struct CustomerReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CustomerReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    pub fn customers(self) -> Result<Vec<Customer>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
            .collect()
    }
}
