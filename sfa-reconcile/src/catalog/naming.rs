//! Base filename generation for records without one
//!
//! Templates name fields in braces, e.g. `{Reference}_{Gloss}.wav`. Each
//! substituted value is cleaned (spaces to `_`, characters illegal in
//! filenames dropped), then the whole result is reduced to alphanumerics and
//! `._-`.

use super::{empty_base_filenames, Catalog, CatalogError};
use crate::models::Record;
use serde::Serialize;
use sfa_common::config::FieldNames;

pub const DEFAULT_TEMPLATE: &str = "{Reference}_{Gloss}.wav";

const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Generated name for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamePreview {
    pub index: usize,
    pub reference: String,
    pub gloss: String,
    pub generated: String,
}

/// Substitute record fields into `template`
///
/// Placeholders naming fields the record lacks are left as written.
pub fn generate_base_filename(record: &Record, template: &str) -> String {
    let mut result = template.to_string();
    for (field, value) in record.fields() {
        let placeholder = format!("{{{}}}", field);
        if result.contains(&placeholder) {
            result = result.replace(&placeholder, &clean_for_filename(value));
        }
    }
    result
}

/// Spaces become `_`; `<>:"/\|?*` are removed
pub fn clean_for_filename(value: &str) -> String {
    value
        .replace(' ', "_")
        .chars()
        .filter(|c| !INVALID_CHARS.contains(c))
        .collect()
}

/// Keep only alphanumerics and `._-` (after turning spaces into `_`)
pub fn sanitize_filename(name: &str) -> String {
    name.replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// Names that would be generated for every record with a blank base filename
pub fn preview(records: &[Record], fields: &FieldNames, template: &str) -> Vec<NamePreview> {
    empty_base_filenames(records, fields)
        .into_iter()
        .map(|index| {
            let record = &records[index];
            NamePreview {
                index,
                reference: record.reference(fields).to_string(),
                gloss: record.gloss(fields).to_string(),
                generated: sanitize_filename(&generate_base_filename(record, template)),
            }
        })
        .collect()
}

/// Fill every blank base filename from `template` and save
///
/// # Returns
/// Number of records updated
pub fn apply_generated<C: Catalog + ?Sized>(
    catalog: &mut C,
    fields: &FieldNames,
    template: &str,
) -> Result<usize, CatalogError> {
    let previews = preview(catalog.records(), fields, template);
    let entries: Vec<(usize, String)> = previews
        .into_iter()
        .map(|p| (p.index, p.generated))
        .collect();
    apply_manual(catalog, fields, &entries)
}

/// Set base filenames from caller-supplied `(index, name)` pairs and save
///
/// Names are sanitized; blank names are skipped.
pub fn apply_manual<C: Catalog + ?Sized>(
    catalog: &mut C,
    fields: &FieldNames,
    entries: &[(usize, String)],
) -> Result<usize, CatalogError> {
    let mut count = 0;
    for (index, name) in entries {
        let name = sanitize_filename(name.trim());
        if name.is_empty() {
            continue;
        }
        catalog.update_field(*index, &fields.sound_file, &name)?;
        count += 1;
    }

    if count > 0 {
        catalog.save()?;
    }
    tracing::info!(updated = count, "Base filenames assigned");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::JsonCatalog;

    #[test]
    fn test_generate_from_template() {
        let record = Record::from_pairs([("Reference", "0021"), ("Gloss", "big dog?")]);
        assert_eq!(generate_base_filename(&record, DEFAULT_TEMPLATE), "0021_big_dog.wav");
        assert_eq!(generate_base_filename(&record, "{Reference}_{Tone}.wav"), "0021_{Tone}.wav");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_filename("0021_{Tone} (x).wav"), "0021_Tone_x.wav");
        assert_eq!(sanitize_filename("ŋgàm.wav"), "ŋgàm.wav");
    }

    #[test]
    fn test_preview_only_blank_records() {
        let records = vec![
            Record::from_pairs([("Reference", "0021"), ("SoundFile", "0021_dog.wav"), ("Gloss", "dog")]),
            Record::from_pairs([("Reference", "0022"), ("SoundFile", ""), ("Gloss", "cat")]),
        ];
        let previews = preview(&records, &FieldNames::default(), DEFAULT_TEMPLATE);
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].index, 1);
        assert_eq!(previews[0].generated, "0022_cat.wav");
    }

    #[test]
    fn test_apply_generated_updates_catalog() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let records = vec![
            Record::from_pairs([("Reference", "0022"), ("SoundFile", ""), ("Gloss", "black cat")]),
            Record::from_pairs([("Reference", "0023"), ("Gloss", "bird")]),
        ];
        let mut catalog = JsonCatalog::from_records(temp_dir.path().join("c.json"), records);

        let count = apply_generated(&mut catalog, &FieldNames::default(), DEFAULT_TEMPLATE).unwrap();
        assert_eq!(count, 2);
        assert_eq!(catalog.records()[0].value("SoundFile"), "0022_black_cat.wav");
        assert_eq!(catalog.records()[1].value("SoundFile"), "0023_bird.wav");
        assert!(temp_dir.path().join("c.json").exists());
    }
}
