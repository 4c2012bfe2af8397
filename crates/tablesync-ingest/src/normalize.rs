//! Null normalization of raw source values
//!
//! A value becomes [`FieldValue::Null`] when it is absent, empty, or the
//! literal `NULL` in any letter case. Everything else is kept verbatim,
//! surrounding whitespace included.

use crate::record::{NormalizedRecord, Record};
use tablesync_common::FieldValue;

/// Normalize a single raw value
pub fn normalize(raw: Option<&str>) -> FieldValue {
    match raw {
        None => FieldValue::Null,
        Some(value) if value.is_empty() || value.eq_ignore_ascii_case("NULL") => FieldValue::Null,
        Some(value) => FieldValue::Text(value.to_string()),
    }
}

/// Normalize every field of `record`, keeping header order
pub fn normalize_record(record: &Record) -> NormalizedRecord {
    let fields = record
        .fields()
        .map(|(name, raw)| (name.to_string(), normalize(raw)))
        .collect();
    NormalizedRecord::new(record.row(), fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_null_spellings() {
        for raw in ["", "NULL", "null", "Null", "nUlL"] {
            assert_eq!(normalize(Some(raw)), FieldValue::Null, "{raw:?}");
        }
        assert_eq!(normalize(None), FieldValue::Null);
    }

    #[test]
    fn test_values_pass_through_unchanged() {
        for raw in [" ", "NULL ", "nil", "0", "None", " padded "] {
            assert_eq!(normalize(Some(raw)), FieldValue::Text(raw.to_string()));
        }
    }

    #[test]
    fn test_normalize_record_is_per_field() {
        let header: Arc<[String]> = vec!["id".to_string(), "note".to_string(), "extra".to_string()].into();
        let record = Record::new(2, header, vec!["17".into(), "NULL".into()]);
        let normalized = normalize_record(&record);
        assert_eq!(normalized.row(), 2);
        assert_eq!(normalized.get("id"), Some(&FieldValue::Text("17".into())));
        assert_eq!(normalized.get("note"), Some(&FieldValue::Null));
        assert_eq!(normalized.get("extra"), Some(&FieldValue::Null));
    }

    proptest! {
        #[test]
        fn prop_null_iff_empty_or_null_literal(raw in ".*") {
            let is_null = raw.is_empty() || raw.to_uppercase() == "NULL";
            match normalize(Some(&raw)) {
                FieldValue::Null => prop_assert!(is_null),
                FieldValue::Text(s) => {
                    prop_assert!(!is_null);
                    prop_assert_eq!(s, raw);
                },
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }

        #[test]
        fn prop_normalize_is_idempotent(raw in "(null|NULL|Null)?|[a-zA-Z0-9 ]{0,8}") {
            let once = normalize(Some(&raw));
            let twice = match &once {
                FieldValue::Text(s) => normalize(Some(s)),
                other => other.clone(),
            };
            prop_assert_eq!(once, twice);
        }
    }
}
