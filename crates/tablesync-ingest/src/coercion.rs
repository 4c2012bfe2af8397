//! Configured value coercion
//!
//! Rules run after null normalization, in the order they were configured.
//! The first rule whose field predicate matches converts the value; fields
//! without a matching rule stay strings. Null values are never converted.
//! A value that fails to convert becomes null and a warning is logged.

use crate::config::CoercionRuleConfig;
use crate::record::NormalizedRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tablesync_common::{FieldValue, Result, SyncError};
use tracing::warn;

/// Target type of a coercion rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conversion {
    Integer,
    Float,
    Boolean,
    /// Keep the string; useful to exempt a field from a broader pattern rule
    Text,
}

impl Conversion {
    /// Convert a non-null raw string
    pub fn convert(self, raw: &str) -> std::result::Result<FieldValue, String> {
        let trimmed = raw.trim();
        match self {
            Conversion::Integer => trimmed
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| format!("'{}' is not an integer", raw)),
            Conversion::Float => match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(FieldValue::Float(v)),
                _ => Err(format!("'{}' is not a finite number", raw)),
            },
            Conversion::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "f" | "no" | "n" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err(format!("'{}' is not a boolean", raw)),
            },
            Conversion::Text => Ok(FieldValue::Text(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
enum FieldMatcher {
    Exact(String),
    Pattern(Regex),
}

impl FieldMatcher {
    fn matches(&self, field: &str) -> bool {
        match self {
            FieldMatcher::Exact(name) => name == field,
            FieldMatcher::Pattern(re) => re.is_match(field),
        }
    }
}

#[derive(Debug, Clone)]
struct CoercionRule {
    matcher: FieldMatcher,
    conversion: Conversion,
}

/// Ordered list of coercion rules
#[derive(Debug, Clone, Default)]
pub struct CoercionRules {
    rules: Vec<CoercionRule>,
}

impl CoercionRules {
    /// Build from `[[coercion]]` entries; each needs exactly one of `field` or `pattern`
    pub fn from_config(entries: &[CoercionRuleConfig]) -> Result<Self> {
        let rules = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let matcher = match (&entry.field, &entry.pattern) {
                    (Some(field), None) => FieldMatcher::Exact(field.clone()),
                    (None, Some(pattern)) => {
                        FieldMatcher::Pattern(Regex::new(pattern).map_err(|e| {
                            SyncError::config(format!("coercion rule {}: {}", idx + 1, e))
                        })?)
                    },
                    _ => {
                        return Err(SyncError::config(format!(
                            "coercion rule {} needs exactly one of 'field' or 'pattern'",
                            idx + 1
                        )))
                    },
                };
                Ok(CoercionRule {
                    matcher,
                    conversion: entry.to,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    fn conversion_for(&self, field: &str) -> Option<Conversion> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(field))
            .map(|rule| rule.conversion)
    }

    /// Convert the values of `record` in place
    pub fn apply(&self, record: &mut NormalizedRecord) {
        if self.rules.is_empty() {
            return;
        }
        let row = record.row();
        for (field, value) in record.fields_mut() {
            let FieldValue::Text(raw) = value else {
                continue;
            };
            let Some(conversion) = self.conversion_for(field) else {
                continue;
            };
            *value = match conversion.convert(raw) {
                Ok(converted) => converted,
                Err(reason) => {
                    warn!(row, field = %field, %reason, "Could not convert value, storing null");
                    FieldValue::Null
                },
            };
        }
    }
}
