use crate::domain::tax_year::TaxYearStart;
use serde::Deserialize;

/// £20,000 in pence.
pub const DEFAULT_ANNUAL_LIMIT: u64 = 2_000_000;
pub const DEFAULT_MINIMUM_AGE: u32 = 18;
pub const DEFAULT_TAX_RESIDENCY: &str = "uk";

/// Rules parameterising the ISA service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IsaConfig {
    /// Maximum customer deposits per tax year, in pence.
    pub annual_limit: u64,
    pub tax_year_start: TaxYearStart,
    pub required_tax_residency: String,
    pub minimum_age: u32,
}

impl Default for IsaConfig {
    fn default() -> Self {
        Self {
            annual_limit: DEFAULT_ANNUAL_LIMIT,
            tax_year_start: TaxYearStart::UK,
            required_tax_residency: DEFAULT_TAX_RESIDENCY.to_string(),
            minimum_age: DEFAULT_MINIMUM_AGE,
        }
    }
}

impl IsaConfig {
    pub fn with_annual_limit(mut self, annual_limit: u64) -> Self {
        self.annual_limit = annual_limit;
        self
    }

    pub fn with_tax_year_start(mut self, tax_year_start: TaxYearStart) -> Self {
        self.tax_year_start = tax_year_start;
        self
    }
}
