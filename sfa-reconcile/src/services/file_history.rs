//! Identity-tracked file history
//!
//! Every physical file touched by an operation gets a UUID v4 the first time
//! it is seen. Later operations find the identity again by the basename of
//! its recorded current path, so a file keeps one trail through any number
//! of renames and moves.
//!
//! The document is read once when loaded and written once per batch. Keys
//! this module does not know about are carried through untouched.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// Document exists but could not be read
    #[error("Cannot read history {0}: {1}")]
    Read(PathBuf, String),

    /// Document is not valid JSON of the expected shape
    #[error("Corrupt history {0}: {1}")]
    Parse(PathBuf, String),

    #[error("Cannot write history {0}: {1}")]
    Write(PathBuf, String),
}

/// One logged operation, never rewritten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// RFC 3339 timestamp
    pub timestamp: String,
    pub operation: String,
    pub old_path: String,
    pub new_path: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryEntry {
    pub fn new(operation: &str, old_path: &Path, new_path: &Path, reason: &str) -> Self {
        Self {
            timestamp: sfa_common::time::now().to_rfc3339(),
            operation: operation.to_string(),
            old_path: old_path.display().to_string(),
            new_path: new_path.display().to_string(),
            reason: reason.to_string(),
            record_reference: None,
            field_name: None,
            extra: Map::new(),
        }
    }

    pub fn with_record(mut self, reference: &str, field: &str) -> Self {
        self.record_reference = Some(reference.to_string());
        self.field_name = Some(field.to_string());
        self
    }
}

/// Current location and trail of one file identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub current_path: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileRecord {
    /// Basename of the current path
    pub fn current_name(&self) -> &str {
        basename(&self.current_path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryDocument {
    #[serde(default)]
    /// Identity -> record, in document order
    pub files: IndexMap<String, FileRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Loaded history document plus its location
pub struct FileHistory {
    path: PathBuf,
    document: HistoryDocument,
    dirty: bool,
}

impl FileHistory {
    /// Load the document; a missing file starts an empty history
    ///
    /// A present but unreadable or corrupt document is an error, so a batch
    /// never overwrites an audit trail it could not parse.
    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        let document = if path.exists() {
            let text = fs::read_to_string(path)
                .map_err(|e| HistoryError::Read(path.to_path_buf(), e.to_string()))?;
            if text.trim().is_empty() {
                HistoryDocument::default()
            } else {
                serde_json::from_str(&text)
                    .map_err(|e| HistoryError::Parse(path.to_path_buf(), e.to_string()))?
            }
        } else {
            tracing::debug!(path = %path.display(), "No history document, starting empty");
            HistoryDocument::default()
        };

        tracing::debug!(
            path = %path.display(),
            identities = document.files.len(),
            "History loaded"
        );

        Ok(Self {
            path: path.to_path_buf(),
            document,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &HistoryDocument {
        &self.document
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.document.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.files.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FileRecord> {
        self.document.files.get(id)
    }

    /// Identities whose current basename equals `filename`, in document order
    pub fn find_by_name(&self, filename: &str) -> Vec<(&str, &FileRecord)> {
        self.document
            .files
            .iter()
            .filter(|(_, record)| record.current_name() == filename)
            .map(|(id, record)| (id.as_str(), record))
            .collect()
    }

    /// Every identity whose trail mentions `filename` as an old or new name
    pub fn trail(&self, filename: &str) -> Vec<(&str, &FileRecord)> {
        self.document
            .files
            .iter()
            .filter(|(_, record)| {
                record.current_name() == filename
                    || record.history.iter().any(|entry| {
                        basename(&entry.old_path) == filename
                            || basename(&entry.new_path) == filename
                    })
            })
            .map(|(id, record)| (id.as_str(), record))
            .collect()
    }

    /// Identity for the file currently named `filename`, created if unknown
    ///
    /// **Algorithm:**
    /// 1. Collect identities whose current basename equals `filename`
    /// 2. None: create a new identity at `source_path`
    /// 3. Several: prefer the one whose current path equals `source_path`,
    ///    else the first in document order, and warn
    pub fn resolve_or_create(&mut self, filename: &str, source_path: &Path) -> String {
        let source = source_path.display().to_string();
        let candidates: Vec<String> = self
            .find_by_name(filename)
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();

        match candidates.len() {
            0 => {
                let id = sfa_common::uuid_utils::generate_string();
                tracing::debug!(file = %filename, id = %id, "New file identity");
                self.document.files.insert(
                    id.clone(),
                    FileRecord {
                        current_path: source,
                        history: Vec::new(),
                        extra: Map::new(),
                    },
                );
                self.dirty = true;
                id
            }
            1 => candidates[0].clone(),
            _ => {
                let chosen = candidates
                    .iter()
                    .find(|id| {
                        self.document
                            .files
                            .get(id.as_str())
                            .is_some_and(|r| r.current_path == source)
                    })
                    .unwrap_or(&candidates[0])
                    .clone();
                tracing::warn!(
                    file = %filename,
                    candidates = ?candidates,
                    chosen = %chosen,
                    "Several file identities share this name"
                );
                chosen
            }
        }
    }

    /// Append an entry and move the identity to `entry.new_path`
    pub fn record(&mut self, id: &str, entry: HistoryEntry) {
        if let Some(file) = self.document.files.get_mut(id) {
            file.current_path = entry.new_path.clone();
            file.history.push(entry);
            self.dirty = true;
        } else {
            tracing::warn!(id = %id, "History entry for unknown identity dropped");
        }
    }

    /// Write the document atomically (temp file + rename)
    pub fn save(&mut self) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(&self.document)
            .map_err(|e| HistoryError::Write(self.path.clone(), e.to_string()))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json)
            .map_err(|e| HistoryError::Write(temp_path.clone(), e.to_string()))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| HistoryError::Write(self.path.clone(), e.to_string()))?;

        self.dirty = false;
        tracing::debug!(
            path = %self.path.display(),
            identities = self.document.files.len(),
            "History saved"
        );
        Ok(())
    }

    /// Copy the saved document into `dir`
    pub fn copy_to(&self, dir: &Path) -> Result<PathBuf, HistoryError> {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "history.json".into());
        let dest = dir.join(name);
        fs::copy(&self.path, &dest).map_err(|e| HistoryError::Write(dest.clone(), e.to_string()))?;
        Ok(dest)
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
