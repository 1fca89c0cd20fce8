//! Catalog record
//!
//! A record is an ordered list of `(field, value)` pairs. Only the base
//! filename, reference and gloss fields are interpreted; every other field
//! passes through untouched and keeps its position.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sfa_common::config::FieldNames;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (field, value) in pairs {
            record.set(field, value);
        }
        record
    }

    /// Field value, `None` when the record has no such field
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Field value, empty when absent
    pub fn value(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    /// Replace a field value in place, or append the field
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Trimmed base filename
    pub fn base_filename(&self, names: &FieldNames) -> &str {
        self.value(&names.sound_file).trim()
    }

    pub fn reference(&self, names: &FieldNames) -> &str {
        self.value(&names.reference).trim()
    }

    pub fn gloss(&self, names: &FieldNames) -> &str {
        self.value(&names.gloss).trim()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of field names to string values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
        let mut record = Record::new();
        while let Some((field, value)) = access.next_entry::<String, Option<String>>()? {
            record.set(field, value.unwrap_or_default());
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_survives_json() {
        let json = r#"{"Reference":"0021","SoundFile":"0021_dog.wav","Gloss":"dog","Tone":null}"#;
        let record: Record = serde_json::from_str(json).unwrap();

        let names: Vec<&str> = record.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["Reference", "SoundFile", "Gloss", "Tone"]);
        assert_eq!(record.value("Tone"), "");

        let back = serde_json::to_string(&record).unwrap();
        assert_eq!(
            back,
            r#"{"Reference":"0021","SoundFile":"0021_dog.wav","Gloss":"dog","Tone":""}"#
        );
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut record = Record::from_pairs([("A", "1"), ("B", "2")]);
        record.set("A", "3");
        record.set("C", "4");
        let pairs: Vec<(&str, &str)> = record.fields().collect();
        assert_eq!(pairs, vec![("A", "3"), ("B", "2"), ("C", "4")]);
    }

    #[test]
    fn test_distinguished_fields_are_trimmed() {
        let names = FieldNames::default();
        let record = Record::from_pairs([("SoundFile", "  0021_dog.wav "), ("Reference", "0021")]);
        assert_eq!(record.base_filename(&names), "0021_dog.wav");
        assert_eq!(record.reference(&names), "0021");
        assert_eq!(record.gloss(&names), "");
    }
}
