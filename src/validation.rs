//! Field-level validation shared by the user and product forms.
//!
//! Validation never stops at the first failure: every field is checked and
//! every violation is collected into a [`FormErrors`] so the form can show all
//! problems at once. Forms first coerce their raw strings (trim, numeric
//! parse, enum lookup); the declarative `garde` rules on the coerced input
//! structs then report into the same error map.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::str::FromStr;

// Constant pattern, compiled once
#[allow(clippy::unwrap_used)]
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Key used for the form-level message in serialized error maps.
pub const FORM_KEY: &str = "_form";

/// Per-field error messages plus an optional form-level message.
///
/// Serializes as `{"name": ["..."], "_form": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    form: Option<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Error map carrying only a form-level message.
    pub fn form_level(message: impl Into<String>) -> Self {
        Self {
            fields: BTreeMap::new(),
            form: Some(message.into()),
        }
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.form.is_none()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// First message for a field.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn form_message(&self) -> Option<&str> {
        self.form.as_deref()
    }

    /// Records every violation of a `garde` report. Fields listed in
    /// `messages` get that wording; others keep the rule's own message.
    pub fn absorb(&mut self, result: Result<(), garde::Report>, messages: &[(&str, &str)]) {
        let Err(report) = result else {
            return;
        };

        for (path, error) in report.iter() {
            let field = path.to_string();
            let message = messages
                .iter()
                .find(|(name, _)| *name == field)
                .map(|(_, message)| message.to_string())
                .unwrap_or_else(|| error.message().to_string());
            if !self.messages(&field).contains(&message) {
                self.add(&field, message);
            }
        }
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected errors.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl Serialize for FormErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.fields.len() + usize::from(self.form.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        if let Some(form) = &self.form {
            map.serialize_entry(FORM_KEY, form)?;
        }
        map.end()
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        if let Some(form) = &self.form {
            parts.push(format!("{}: {}", FORM_KEY, form));
        }
        write!(f, "{}", parts.join("; "))
    }
}

/// Blank input becomes `None`.
pub fn optional_text(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 255 && EMAIL_PATTERN.is_match(email)
}

/// `garde` rule for email fields.
pub fn email_address(value: &str, _context: &()) -> garde::Result {
    if is_valid_email(value) {
        Ok(())
    } else {
        Err(garde::Error::new("Invalid email address"))
    }
}

/// Parses a decimal rounded to cents that is still strictly positive after
/// rounding.
pub fn positive_decimal(errors: &mut FormErrors, field: &str, raw: &str) -> Option<Decimal> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, "Price is required");
        return None;
    }

    match Decimal::from_str(value).map(|parsed| parsed.round_dp(2)) {
        Ok(price) if price > Decimal::ZERO => Some(price),
        Ok(_) => {
            errors.add(field, "Price must be greater than 0");
            None
        }
        Err(_) => {
            errors.add(field, "Price must be a number");
            None
        }
    }
}

pub fn non_negative_integer(errors: &mut FormErrors, field: &str, raw: &str) -> Option<i64> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, "Stock is required");
        return None;
    }

    match value.parse::<i64>() {
        Ok(parsed) if parsed >= 0 => Some(parsed),
        Ok(_) => {
            errors.add(field, "Stock cannot be negative");
            None
        }
        Err(_) => {
            errors.add(field, "Stock must be a whole number");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("ana@x.com"));
        assert!(is_valid_email("first.last+tag@example.co.uk"));
        assert!(!is_valid_email("ana@x"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("ana @x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_positive_decimal() {
        let mut errors = FormErrors::new();
        assert_eq!(
            positive_decimal(&mut errors, "price", " 19.999 "),
            Some(Decimal::new(2000, 2))
        );
        assert!(errors.is_empty());

        assert_eq!(positive_decimal(&mut errors, "price", "0"), None);
        assert_eq!(errors.first("price"), Some("Price must be greater than 0"));

        let mut errors = FormErrors::new();
        assert_eq!(positive_decimal(&mut errors, "price", "abc"), None);
        assert_eq!(errors.first("price"), Some("Price must be a number"));
    }

    #[test]
    fn test_price_that_rounds_to_zero_is_rejected() {
        let mut errors = FormErrors::new();
        assert_eq!(positive_decimal(&mut errors, "price", "0.004"), None);
        assert_eq!(errors.first("price"), Some("Price must be greater than 0"));

        let mut errors = FormErrors::new();
        assert_eq!(
            positive_decimal(&mut errors, "price", "0.006"),
            Some(Decimal::new(1, 2))
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_non_negative_integer() {
        let mut errors = FormErrors::new();
        assert_eq!(non_negative_integer(&mut errors, "stock", "0"), Some(0));
        assert_eq!(non_negative_integer(&mut errors, "stock", "12"), Some(12));
        assert!(errors.is_empty());

        assert_eq!(non_negative_integer(&mut errors, "stock", "-1"), None);
        assert_eq!(non_negative_integer(&mut errors, "stock", "1.5"), None);
        assert_eq!(errors.messages("stock").len(), 2);
    }

    #[derive(garde::Validate)]
    struct Signup {
        #[garde(length(chars, min = 2))]
        name: String,
        #[garde(custom(email_address))]
        email: String,
    }

    #[test]
    fn test_absorb_garde_report() {
        use garde::Validate;

        let mut errors = FormErrors::new();
        let valid = Signup {
            name: "Ñu".to_string(),
            email: "nu@x.com".to_string(),
        };
        errors.absorb(valid.validate(), &[]);
        assert!(errors.is_empty());

        let invalid = Signup {
            name: "A".to_string(),
            email: "nope".to_string(),
        };
        errors.absorb(invalid.validate(), &[("name", "too short")]);
        assert_eq!(errors.field_names(), vec!["email", "name"]);
        assert_eq!(errors.first("name"), Some("too short"));
        assert_eq!(errors.first("email"), Some("Invalid email address"));
    }

    #[test]
    fn test_form_errors_serialization() {
        let mut errors = FormErrors::new();
        errors.add("name", "too short");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "name": ["too short"] }));

        let json = serde_json::to_value(FormErrors::form_level("duplicate")).unwrap();
        assert_eq!(json, serde_json::json!({ "_form": "duplicate" }));
        assert_eq!(json[FORM_KEY], "duplicate");
    }
}
