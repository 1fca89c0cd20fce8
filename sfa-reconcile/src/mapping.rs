//! Suffix → field mapping
//!
//! Maps each recording suffix (the empty suffix is the base file itself) to
//! the catalog fields that recording represents. A field may appear under at
//! most one suffix; `insert`, `merge` and the importers enforce this, while
//! `from_entries` trusts the caller until `validate` is called.
//!
//! # Exchange format
//!
//! ```text
//! # field<TAB>suffix
//! SoundFile\t
//! Phonetic\t-phon
//! ```
//!
//! Blank lines and `#` comments are ignored.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Mapping and exchange-format errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("line {line}: missing tab between field name and suffix")]
    MissingTab { line: usize },

    #[error("line {line}: expected 2 tab-separated fields, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: empty field name")]
    EmptyField { line: usize },

    #[error("line {line}: field '{field}' is already mapped to suffix '{first}', cannot also map it to '{second}'")]
    DuplicateLine {
        line: usize,
        field: String,
        first: String,
        second: String,
    },

    #[error("field '{field}' is mapped to both suffix '{first}' and suffix '{second}'")]
    DuplicateField {
        field: String,
        first: String,
        second: String,
    },

    #[error("invalid mapping document: {0}")]
    Document(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuffixMapping {
    entries: Vec<(String, Vec<String>)>,
}

impl SuffixMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(suffix, fields)` pairs without checking for duplicates
    pub fn from_entries(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    /// One pseudo-field per suffix, named after the suffix
    ///
    /// Used when no mapping is supplied: every discovered suffix is expected
    /// for every record. The empty suffix maps to `base_field`.
    pub fn from_vocabulary<I, S>(suffixes: I, base_field: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = suffixes
            .into_iter()
            .map(Into::into)
            .map(|suffix: String| {
                let field = if suffix.is_empty() {
                    base_field.to_string()
                } else {
                    suffix.clone()
                };
                (suffix, vec![field])
            })
            .collect();
        Self { entries }
    }

    /// Map `field` to `suffix`
    ///
    /// Re-inserting an existing pair is a no-op; mapping a field to a second
    /// suffix is an error.
    pub fn insert(&mut self, field: &str, suffix: &str) -> Result<(), MappingError> {
        if let Some(existing) = self.suffix_for(field) {
            if existing == suffix {
                return Ok(());
            }
            return Err(MappingError::DuplicateField {
                field: field.to_string(),
                first: existing.to_string(),
                second: suffix.to_string(),
            });
        }

        match self.entries.iter_mut().find(|(s, _)| s == suffix) {
            Some((_, fields)) => fields.push(field.to_string()),
            None => self
                .entries
                .push((suffix.to_string(), vec![field.to_string()])),
        }
        Ok(())
    }

    /// Merge another mapping into this one, rejecting conflicting fields
    pub fn merge(&mut self, other: &SuffixMapping) -> Result<(), MappingError> {
        for (suffix, fields) in other.iter() {
            for field in fields {
                self.insert(field, suffix)?;
            }
        }
        Ok(())
    }

    /// Check that no field appears under two suffixes
    pub fn validate(&self) -> Result<(), MappingError> {
        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for (suffix, fields) in &self.entries {
            for field in fields {
                if let Some(first) = seen.insert(field.as_str(), suffix.as_str()) {
                    if first != suffix {
                        return Err(MappingError::DuplicateField {
                            field: field.clone(),
                            first: first.to_string(),
                            second: suffix.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn suffix_for(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, fields)| fields.iter().any(|f| f == field))
            .map(|(suffix, _)| suffix.as_str())
    }

    /// `(suffix, fields)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(suffix, fields)| (suffix.as_str(), fields.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the tab-separated exchange format
    pub fn parse_exchange(text: &str) -> Result<Self, MappingError> {
        let mut mapping = SuffixMapping::new();
        let mut first_line: BTreeMap<String, usize> = BTreeMap::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split('\t').collect();
            match parts.len() {
                1 => return Err(MappingError::MissingTab { line: line_no }),
                2 => {}
                found => return Err(MappingError::FieldCount { line: line_no, found }),
            }

            let field = parts[0].trim();
            let suffix = parts[1].trim();
            if field.is_empty() {
                return Err(MappingError::EmptyField { line: line_no });
            }

            if first_line.contains_key(field) {
                let first = mapping.suffix_for(field).unwrap_or_default().to_string();
                return Err(MappingError::DuplicateLine {
                    line: line_no,
                    field: field.to_string(),
                    first,
                    second: suffix.to_string(),
                });
            }
            first_line.insert(field.to_string(), line_no);
            mapping.insert(field, suffix)?;
        }

        tracing::debug!(suffixes = mapping.len(), "Parsed suffix mapping");
        Ok(mapping)
    }

    /// Render the exchange format, one `field<TAB>suffix` line per field
    pub fn to_exchange(&self) -> String {
        let mut out = String::new();
        for (suffix, fields) in &self.entries {
            for field in fields {
                out.push_str(field);
                out.push('\t');
                out.push_str(suffix);
                out.push('\n');
            }
        }
        out
    }

    /// Suffix → fields as a sorted map
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        self.entries.iter().cloned().collect()
    }

    /// JSON export document with version and timestamp
    pub fn to_export_json(&self) -> Result<String, MappingError> {
        let export = MappingExport {
            version: EXPORT_VERSION.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            mappings: self.to_map(),
        };
        serde_json::to_string_pretty(&export).map_err(|e| MappingError::Document(e.to_string()))
    }

    /// Import a JSON export document; the result is validated
    pub fn from_export_json(text: &str) -> Result<Self, MappingError> {
        let export: MappingExport =
            serde_json::from_str(text).map_err(|e| MappingError::Document(e.to_string()))?;
        let mapping = Self::from_entries(export.mappings.into_iter().collect());
        mapping.validate()?;
        Ok(mapping)
    }
}

const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Serialize, Deserialize)]
struct MappingExport {
    #[serde(default)]
    version: String,
    #[serde(default)]
    timestamp: String,
    mappings: BTreeMap<String, Vec<String>>,
}

impl Serialize for SuffixMapping {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exchange_groups_fields_by_suffix() {
        let text = "# field\tsuffix\nSoundFile\t\n\nPhonetic\t-phon\nPhonemic\t-phon\nXBig\t-xbig\n";
        let mapping = SuffixMapping::parse_exchange(text).unwrap();

        let entries: Vec<(&str, &[String])> = mapping.iter().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].0, "");
        assert_eq!(entries[1].0, "-phon");
        assert_eq!(entries[1].1, ["Phonetic".to_string(), "Phonemic".to_string()]);
        assert_eq!(mapping.suffix_for("XBig"), Some("-xbig"));
    }

    #[test]
    fn test_parse_exchange_missing_tab() {
        let err = SuffixMapping::parse_exchange("SoundFile\t\nPhonetic -phon\n").unwrap_err();
        assert_eq!(err, MappingError::MissingTab { line: 2 });
    }

    #[test]
    fn test_parse_exchange_too_many_fields() {
        let err = SuffixMapping::parse_exchange("Phonetic\t-phon\textra\n").unwrap_err();
        assert_eq!(err, MappingError::FieldCount { line: 1, found: 3 });
    }

    #[test]
    fn test_parse_exchange_duplicate_names_both_suffixes() {
        let err = SuffixMapping::parse_exchange("Phonetic\t-phon\n# note\nPhonetic\t-ph\n")
            .unwrap_err();
        assert_eq!(
            err,
            MappingError::DuplicateLine {
                line: 3,
                field: "Phonetic".to_string(),
                first: "-phon".to_string(),
                second: "-ph".to_string(),
            }
        );
        let message = err.to_string();
        assert!(message.contains("line 3"));
        assert!(message.contains("-phon") && message.contains("-ph"));
    }

    #[test]
    fn test_exchange_round_trip() {
        let text = "SoundFile\t\nPhonetic\t-phon\n";
        let mapping = SuffixMapping::parse_exchange(text).unwrap();
        assert_eq!(mapping.to_exchange(), text);
    }

    #[test]
    fn test_merge_rejects_conflicts() {
        let mut base = SuffixMapping::parse_exchange("Phonetic\t-phon\n").unwrap();
        let same = SuffixMapping::parse_exchange("Phonetic\t-phon\nTone\t-tone\n").unwrap();
        base.merge(&same).unwrap();
        assert_eq!(base.suffix_for("Tone"), Some("-tone"));

        let conflicting = SuffixMapping::parse_exchange("Tone\t-t\n").unwrap();
        assert!(matches!(
            base.merge(&conflicting),
            Err(MappingError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_validate_unchecked_entries() {
        let mapping = SuffixMapping::from_entries(vec![
            ("-a".to_string(), vec!["F".to_string()]),
            ("-b".to_string(), vec!["F".to_string()]),
        ]);
        assert!(mapping.validate().is_err());
    }

    #[test]
    fn test_json_export_import() {
        let mapping = SuffixMapping::parse_exchange("SoundFile\t\nPhonetic\t-phon\n").unwrap();
        let json = mapping.to_export_json().unwrap();
        assert!(json.contains("\"version\": \"1.0\""));

        let imported = SuffixMapping::from_export_json(&json).unwrap();
        assert_eq!(imported.to_map(), mapping.to_map());
    }

    #[test]
    fn test_json_import_requires_mappings_object() {
        assert!(SuffixMapping::from_export_json(r#"{"version": "1.0"}"#).is_err());
        assert!(SuffixMapping::from_export_json(r#"{"mappings": []}"#).is_err());
    }

    #[test]
    fn test_from_vocabulary() {
        let mapping = SuffixMapping::from_vocabulary(["", "-phon"], "SoundFile");
        assert_eq!(mapping.suffix_for("SoundFile"), Some(""));
        assert_eq!(mapping.suffix_for("-phon"), Some("-phon"));
    }
}
