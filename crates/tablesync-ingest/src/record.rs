//! Records as they move through the pipeline
//!
//! A [`Record`] holds the raw strings of one source row. Normalization turns it
//! into a [`NormalizedRecord`]; insert runs group those into [`Batch`]es.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tablesync_common::FieldValue;

/// One data row of the source, keyed by the header's field names
#[derive(Debug, Clone)]
pub struct Record {
    row: u64,
    header: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    /// `row` is the 1-based index of the data row (the header is not counted)
    pub fn new(row: u64, header: Arc<[String]>, values: Vec<String>) -> Self {
        Self {
            row,
            header,
            values,
        }
    }

    pub fn row(&self) -> u64 {
        self.row
    }

    /// Raw value of `field`, `None` when the field is unknown or the row was
    /// shorter than the header
    pub fn get(&self, field: &str) -> Option<&str> {
        let idx = self.header.iter().position(|name| name == field)?;
        self.values.get(idx).map(String::as_str)
    }

    /// Field names paired with their raw values, in header order
    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.header
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), self.values.get(idx).map(String::as_str)))
    }
}

/// A record whose values went through normalization (and coercion, if configured)
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    row: u64,
    fields: Vec<(String, FieldValue)>,
}

impl NormalizedRecord {
    pub fn new(row: u64, fields: Vec<(String, FieldValue)>) -> Self {
        Self { row, fields }
    }

    pub fn row(&self) -> u64 {
        self.row
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [(String, FieldValue)] {
        &mut self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Remove `field`, returning its value and the remaining record
    pub fn split_off(mut self, field: &str) -> (Option<FieldValue>, NormalizedRecord) {
        let value = self
            .fields
            .iter()
            .position(|(name, _)| name == field)
            .map(|idx| self.fields.remove(idx).1);
        (value, self)
    }
}

impl Serialize for NormalizedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A non-empty run of consecutive records submitted in one insert request
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    records: Vec<NormalizedRecord>,
}

impl Batch {
    /// Returns `None` for an empty record list
    pub fn new(records: Vec<NormalizedRecord>) -> Option<Self> {
        if records.is_empty() {
            None
        } else {
            Some(Self { records })
        }
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Row numbers of the first and last record
    pub fn row_range(&self) -> (u64, u64) {
        let first = self.records.first().map(|r| r.row()).unwrap_or_default();
        let last = self.records.last().map(|r| r.row()).unwrap_or_default();
        (first, last)
    }
}

impl Serialize for Batch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.records.len()))?;
        for record in &self.records {
            seq.serialize_element(record)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Arc<[String]> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_short_row_leaves_trailing_fields_absent() {
        let record = Record::new(1, header(&["id", "name", "score"]), vec!["7".into()]);
        let fields: Vec<_> = record.fields().collect();
        assert_eq!(
            fields,
            vec![("id", Some("7")), ("name", None), ("score", None)]
        );
        assert_eq!(record.get("id"), Some("7"));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_normalized_record_serializes_in_field_order() {
        let record = NormalizedRecord::new(
            3,
            vec![
                ("zeta".to_string(), FieldValue::Text("z".into())),
                ("alpha".to_string(), FieldValue::Null),
            ],
        );
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"zeta":"z","alpha":null}"#);
    }

    #[test]
    fn test_split_off_removes_key_field() {
        let record = NormalizedRecord::new(
            1,
            vec![
                ("id".to_string(), FieldValue::Text("q1".into())),
                ("title".to_string(), FieldValue::Text("Algebra".into())),
            ],
        );
        let (key, rest) = record.split_off("id");
        assert_eq!(key, Some(FieldValue::Text("q1".into())));
        assert_eq!(rest.len(), 1);
        assert!(rest.get("id").is_none());
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        assert!(Batch::new(Vec::new()).is_none());
        let batch = Batch::new(vec![
            NormalizedRecord::new(4, Vec::new()),
            NormalizedRecord::new(5, Vec::new()),
        ])
        .unwrap();
        assert_eq!(batch.row_range(), (4, 5));
        assert_eq!(serde_json::to_string(&batch).unwrap(), "[{},{}]");
    }
}
