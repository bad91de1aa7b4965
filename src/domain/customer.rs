use chrono::{Months, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

/// The fields of a retail customer needed to decide account eligibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub ni_number: String,
    pub tax_residency: String,
    pub date_of_birth: NaiveDate,
}

impl Customer {
    /// True once the customer has had their `years`-th birthday on or before `today`.
    ///
    /// A 29 February birthday is reached on 28 February in non-leap years.
    pub fn has_reached_age(&self, years: u32, today: NaiveDate) -> bool {
        match self.date_of_birth.checked_add_months(Months::new(years * 12)) {
            Some(birthday) => birthday <= today,
            None => false,
        }
    }

    pub fn is_tax_resident_in(&self, jurisdiction: &str) -> bool {
        self.tax_residency.trim().eq_ignore_ascii_case(jurisdiction)
    }
}

const INVALID_PREFIXES: [&str; 7] = ["BG", "GB", "NK", "KN", "TN", "NT", "ZZ"];

/// Prefix letters exclude D, F, I, Q, U and V; the second also excludes O.
static NI_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-CEGHJ-PR-TW-Z][A-CEGHJ-NPR-TW-Z][0-9]{6}[A-D]$")
        .expect("NI number pattern is valid")
});

/// Checks a National Insurance number against the HMRC format.
///
/// Spaces are ignored and letters may be lower case.
pub fn is_valid_ni_number(ni: &str) -> bool {
    let ni: String = ni
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    NI_FORMAT.is_match(&ni) && !INVALID_PREFIXES.iter().any(|prefix| ni.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer_born(date_of_birth: NaiveDate) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            ni_number: "AB123456C".to_string(),
            tax_residency: "uk".to_string(),
            date_of_birth,
        }
    }

    #[test]
    fn test_age_boundary() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

        let eighteen_today = customer_born(NaiveDate::from_ymd_opt(2008, 10, 18).unwrap());
        assert!(eighteen_today.has_reached_age(18, today));

        let eighteen_tomorrow = customer_born(NaiveDate::from_ymd_opt(2008, 10, 19).unwrap());
        assert!(!eighteen_tomorrow.has_reached_age(18, today));
    }

    #[test]
    fn test_leap_day_birthday() {
        let leapling = customer_born(NaiveDate::from_ymd_opt(2008, 2, 29).unwrap());
        let feb_28 = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let feb_27 = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        assert!(leapling.has_reached_age(18, feb_28));
        assert!(!leapling.has_reached_age(18, feb_27));
    }

    #[test]
    fn test_tax_residency_is_case_insensitive() {
        let mut customer = customer_born(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        customer.tax_residency = "UK".to_string();
        assert!(customer.is_tax_resident_in("uk"));
        customer.tax_residency = "fr".to_string();
        assert!(!customer.is_tax_resident_in("uk"));
    }

    #[test]
    fn test_ni_number_format() {
        assert!(is_valid_ni_number("AB123456C"));
        assert!(is_valid_ni_number("ab 12 34 56 c"));
        assert!(!is_valid_ni_number("INVALID"));
        assert!(!is_valid_ni_number("GB123456A"));
        assert!(!is_valid_ni_number("DA123456A"));
        assert!(!is_valid_ni_number("AO123456A"));
        assert!(!is_valid_ni_number("AB123456E"));
        assert!(!is_valid_ni_number("AB12345XA"));
        assert!(!is_valid_ni_number("ZZ123456A"));
        assert!(!is_valid_ni_number("NK123456B"));
        assert!(!is_valid_ni_number("AB1234567C"));
        assert!(!is_valid_ni_number(""));
    }
}
