use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Validation messages keyed by the name of the offending field.
///
/// Keys match the serialized field names so the map can be handed straight
/// back to a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Outcome of a structural check. Never mutates the checked value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub field_errors: FieldErrors,
}

impl From<FieldErrors> for Validation {
    fn from(field_errors: FieldErrors) -> Self {
        Self {
            valid: field_errors.is_empty(),
            field_errors,
        }
    }
}

impl Validation {
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.valid {
            Ok(())
        } else {
            Err(self.field_errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_fields_in_order() {
        let mut errors = FieldErrors::default();
        errors.insert("end_date", "too late");
        errors.insert("start_date", "too early");
        assert_eq!(errors.to_string(), "end_date: too late; start_date: too early");
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut errors = FieldErrors::default();
        errors.insert("customer_id", "Customer ID missing");
        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(json, r#"{"customer_id":"Customer ID missing"}"#);
    }
}
