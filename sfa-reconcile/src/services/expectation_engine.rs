//! Expectation engine
//!
//! Derives the filenames that should exist from the catalog and the suffix
//! mapping. Emission order is record order, then mapping order, then field
//! order within a suffix.

use crate::mapping::SuffixMapping;
use crate::models::{ExpectedFile, Record};
use crate::utils::filename::{split_extension, DEFAULT_EXTENSION};
use sfa_common::config::FieldNames;

/// Decides whether a record should have a recording for a field
pub trait InclusionPolicy {
    fn includes(&self, record: &Record, field: &str) -> bool;
}

impl<F> InclusionPolicy for F
where
    F: Fn(&Record, &str) -> bool,
{
    fn includes(&self, record: &Record, field: &str) -> bool {
        self(record, field)
    }
}

/// Policy with no rules: every field is expected
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeAll;

impl InclusionPolicy for IncludeAll {
    fn includes(&self, _record: &Record, _field: &str) -> bool {
        true
    }
}

/// Expected filename for a base name and suffix
///
/// `0021_dog.wav` + `-phon` → `0021_dog-phon.wav`; a base without an
/// extension gets `.wav`.
pub fn expected_filename(base: &str, suffix: &str) -> String {
    let (stem, ext) = split_extension(base);
    format!("{}{}{}", stem, suffix, ext.unwrap_or(DEFAULT_EXTENSION))
}

/// Expand records into expected files
///
/// # Arguments
/// * `records` - Catalog records in catalog order
/// * `mapping` - Suffix → fields
/// * `fields` - Names of the base filename, reference and gloss fields
/// * `policy` - Per-field inclusion decision
pub fn expand<P: InclusionPolicy + ?Sized>(
    records: &[Record],
    mapping: &SuffixMapping,
    fields: &FieldNames,
    policy: &P,
) -> Vec<ExpectedFile> {
    let mut expected = Vec::new();

    for (record_index, record) in records.iter().enumerate() {
        let base = record.base_filename(fields);
        if base.is_empty() {
            continue;
        }

        for (suffix, field_names) in mapping.iter() {
            for field in field_names {
                if !policy.includes(record, field) {
                    tracing::debug!(
                        record = record_index,
                        field = %field,
                        "Field excluded by inclusion rule"
                    );
                    continue;
                }
                expected.push(ExpectedFile {
                    record_index,
                    field: field.clone(),
                    suffix: suffix.to_string(),
                    filename: expected_filename(base, suffix),
                    reference: record.reference(fields).to_string(),
                    gloss: record.gloss(fields).to_string(),
                });
            }
        }
    }

    tracing::debug!(
        records = records.len(),
        expected = expected.len(),
        "Expected files derived"
    );
    expected
}
