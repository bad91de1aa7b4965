#![allow(dead_code)]

use std::fs::File;
use std::io::Error;
use std::path::Path;
use uuid::Uuid;

pub const ADULT_CUSTOMER: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";
pub const MINOR_CUSTOMER: &str = "0193a8e2-7c3e-7d43-9a61-2b6f3f3f1a01";
pub const NON_RESIDENT_CUSTOMER: &str = "0193a8e2-7c3e-7d43-9a61-2b6f3f3f1a02";

pub fn write_customers(path: &Path) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["id", "ni_number", "tax_residency", "date_of_birth"])?;
    wtr.write_record([ADULT_CUSTOMER, "AB123456C", "uk", "1980-01-01"])?;
    wtr.write_record([MINOR_CUSTOMER, "AB123456C", "uk", "2020-01-01"])?;
    wtr.write_record([NON_RESIDENT_CUSTOMER, "AB123456C", "fr", "1980-01-01"])?;

    wtr.flush()?;
    Ok(())
}

/// Writes one customer deposit per amount, each into a fresh fund.
pub fn write_deposits(path: &Path, amounts: &[i64]) -> Result<Vec<Uuid>, Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(["fund_id", "account_fund_id", "trade_id", "transaction_type", "amount"])?;

    let mut funds = Vec::with_capacity(amounts.len());
    for amount in amounts {
        let fund_id = Uuid::new_v4();
        wtr.write_record([
            fund_id.to_string(),
            String::new(),
            Uuid::new_v4().to_string(),
            "cust".to_string(),
            amount.to_string(),
        ])?;
        funds.push(fund_id);
    }

    wtr.flush()?;
    Ok(funds)
}
