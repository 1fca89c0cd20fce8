//! Record catalog contract
//!
//! The reconciler only needs an ordered list of records plus a way to change
//! one field and persist. The on-disk catalog format lives behind [`Catalog`];
//! [`JsonCatalog`] is the implementation the CLI uses.

pub mod json_catalog;
pub mod naming;

pub use json_catalog::JsonCatalog;

use crate::models::Record;
use sfa_common::config::FieldNames;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog not found: {0}")]
    NotFound(PathBuf),

    #[error("Cannot read catalog {0}: {1}")]
    Read(PathBuf, String),

    #[error("Invalid catalog {0}: {1}")]
    Parse(PathBuf, String),

    #[error("Cannot write catalog {0}: {1}")]
    Write(PathBuf, String),

    #[error("Record index {index} out of range ({len} records)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Ordered record store with field update and save
pub trait Catalog {
    /// Records in catalog order; indices are record identity
    fn records(&self) -> &[Record];

    /// Set one field of one record; a missing field is appended
    fn update_field(&mut self, index: usize, field: &str, value: &str) -> Result<(), CatalogError>;

    /// Persist pending changes
    fn save(&mut self) -> Result<(), CatalogError>;
}

/// References used by more than one record, with the record indices
pub fn duplicate_references(records: &[Record], fields: &FieldNames) -> BTreeMap<String, Vec<usize>> {
    let mut by_reference: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        let reference = record.reference(fields);
        if !reference.is_empty() {
            by_reference.entry(reference.to_string()).or_default().push(index);
        }
    }
    by_reference.retain(|_, indices| indices.len() > 1);
    by_reference
}

/// Indices of records with a blank base filename
pub fn empty_base_filenames(records: &[Record], fields: &FieldNames) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.base_filename(fields).is_empty())
        .map(|(index, _)| index)
        .collect()
}

/// Every field name used by any record, sorted, minus reference and base filename
pub fn field_names(records: &[Record], fields: &FieldNames) -> Vec<String> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        names.extend(record.fields().map(|(name, _)| name));
    }
    names.remove(fields.reference.as_str());
    names.remove(fields.sound_file.as_str());
    names.into_iter().map(str::to_string).collect()
}
