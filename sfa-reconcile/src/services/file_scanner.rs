//! Audio folder scanner
//!
//! Lists the recordings directly inside the audio folder. Subdirectories
//! (including the holding folder) are not descended into, so a file moved to
//! holding drops out of the next scan.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Audio folder scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Directory listing failed
    #[error("I/O error reading {0}: {1}")]
    Io(PathBuf, String),
}

/// Scan result with statistics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ScanResult {
    /// Audio filenames, sorted
    pub files: Vec<String>,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Count of files by lowercase extension
    pub by_format: BTreeMap<String, usize>,
    /// Entries that could not be read
    pub errors: Vec<String>,
}

/// Audio folder scanner
pub struct AudioFolderScanner {
    ignore_patterns: Vec<String>,
    extensions: Vec<String>,
}

impl AudioFolderScanner {
    /// Scanner for the given extensions (without dots, any case)
    ///
    /// Ignores system files like .DS_Store, Thumbs.db and AppleDouble `._` files.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ignore_patterns: vec![".DS_Store".to_string(), "Thumbs.db".to_string()],
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Filenames of audio files at the top level of `root_path`, sorted
    pub fn scan(&self, root_path: &Path) -> Result<Vec<String>, ScanError> {
        Ok(self.scan_entries(root_path)?.0)
    }

    /// Scan with statistics
    pub fn scan_with_stats(&self, root_path: &Path) -> Result<ScanResult, ScanError> {
        let (files, mut errors) = self.scan_entries(root_path)?;

        let mut total_size = 0u64;
        let mut by_format = BTreeMap::new();

        for name in &files {
            match std::fs::metadata(root_path.join(name)) {
                Ok(meta) => total_size += meta.len(),
                Err(e) => errors.push(format!("{}: {}", name, e)),
            }

            if let Some(ext) = Path::new(name).extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                *by_format.entry(ext).or_insert(0) += 1;
            }
        }

        Ok(ScanResult {
            files,
            total_size,
            by_format,
            errors,
        })
    }

    fn scan_entries(&self, root_path: &Path) -> Result<(Vec<String>, Vec<String>), ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        // Surface an unreadable root as an error instead of an empty listing
        std::fs::read_dir(root_path)
            .map_err(|e| ScanError::Io(root_path.to_path_buf(), e.to_string()))?;

        let mut files = Vec::new();
        let mut errors = Vec::new();

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    // Symlinks count when they point at a regular file
                    if !entry.path().is_file() {
                        continue;
                    }
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if self.is_audio_file(&name) {
                        files.push(name);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Error accessing entry");
                    errors.push(e.to_string());
                }
            }
        }

        files.sort();
        tracing::debug!(
            folder = %root_path.display(),
            count = files.len(),
            "Audio folder scanned"
        );

        Ok((files, errors))
    }

    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        let file_name = entry.file_name().to_string_lossy();

        if file_name.starts_with("._") {
            return false;
        }

        !self.ignore_patterns.iter().any(|p| file_name == p.as_str())
    }

    fn is_audio_file(&self, name: &str) -> bool {
        match Path::new(name).extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy().to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            }
            None => false,
        }
    }
}

impl Default for AudioFolderScanner {
    fn default() -> Self {
        Self::new(["wav"])
    }
}
