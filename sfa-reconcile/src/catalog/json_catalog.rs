//! JSON catalog: an array of objects, one per record, field order preserved

use super::{Catalog, CatalogError};
use crate::models::Record;
use std::fs;
use std::path::{Path, PathBuf};

pub struct JsonCatalog {
    path: PathBuf,
    records: Vec<Record>,
    dirty: bool,
}

impl JsonCatalog {
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)
            .map_err(|e| CatalogError::Read(path.to_path_buf(), e.to_string()))?;
        let records: Vec<Record> = serde_json::from_str(&text)
            .map_err(|e| CatalogError::Parse(path.to_path_buf(), e.to_string()))?;

        tracing::debug!(path = %path.display(), records = records.len(), "Catalog loaded");
        Ok(Self {
            path: path.to_path_buf(),
            records,
            dirty: false,
        })
    }

    /// In-memory catalog that saves to `path`
    pub fn from_records(path: impl Into<PathBuf>, records: Vec<Record>) -> Self {
        Self {
            path: path.into(),
            records,
            dirty: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Catalog for JsonCatalog {
    fn records(&self) -> &[Record] {
        &self.records
    }

    fn update_field(&mut self, index: usize, field: &str, value: &str) -> Result<(), CatalogError> {
        let len = self.records.len();
        let record = self
            .records
            .get_mut(index)
            .ok_or(CatalogError::IndexOutOfRange { index, len })?;
        record.set(field, value);
        self.dirty = true;
        Ok(())
    }

    fn save(&mut self) -> Result<(), CatalogError> {
        if !self.dirty {
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&self.records)
            .map_err(|e| CatalogError::Write(self.path.clone(), e.to_string()))?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json)
            .map_err(|e| CatalogError::Write(temp_path.clone(), e.to_string()))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| CatalogError::Write(self.path.clone(), e.to_string()))?;

        self.dirty = false;
        tracing::info!(path = %self.path.display(), records = self.records.len(), "Catalog saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_update_and_save_preserves_unknown_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[{"Reference": "0021", "SoundFile": "", "Custom": "keep"}]"#,
        )
        .unwrap();

        let mut catalog = JsonCatalog::open(&path).unwrap();
        catalog.update_field(0, "SoundFile", "0021_dog.wav").unwrap();
        catalog.save().unwrap();

        let reloaded = JsonCatalog::open(&path).unwrap();
        let pairs: Vec<(&str, &str)> = reloaded.records()[0].fields().collect();
        assert_eq!(
            pairs,
            vec![("Reference", "0021"), ("SoundFile", "0021_dog.wav"), ("Custom", "keep")]
        );
    }

    #[test]
    fn test_update_out_of_range() {
        let mut catalog = JsonCatalog::from_records("/tmp/unused.json", vec![Record::new()]);
        assert!(matches!(
            catalog.update_field(3, "SoundFile", "x"),
            Err(CatalogError::IndexOutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_open_missing_and_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.json");
        assert!(matches!(JsonCatalog::open(&path), Err(CatalogError::NotFound(_))));

        fs::write(&path, r#"{"not": "an array"}"#).unwrap();
        assert!(matches!(JsonCatalog::open(&path), Err(CatalogError::Parse(_, _))));
    }
}
