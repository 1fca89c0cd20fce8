//! Audio folder backup
//!
//! Copies the whole audio folder (holding directory and logs included) to a
//! timestamped sibling under a caller-chosen parent. Taken before a batch,
//! this is the only way to undo one wholesale.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Audio folder does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("Backup destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Backup destination {0} is inside the audio folder")]
    DestinationInsideSource(PathBuf),

    #[error("Backup I/O error at {0}: {1}")]
    Io(PathBuf, String),
}

/// `<folder name>_backup_<YYYYmmdd_HHMMSS>`
pub fn backup_name(audio_folder: &Path, stamp: &str) -> String {
    let name = audio_folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    format!("{}_backup_{}", name, stamp)
}

/// Copy `audio_folder` into a new timestamped directory under `parent`
///
/// # Returns
/// Path of the created backup directory
pub fn create_backup(audio_folder: &Path, parent: &Path) -> Result<PathBuf, BackupError> {
    let stamp = sfa_common::time::folder_stamp(Local::now());
    let dest = parent.join(backup_name(audio_folder, &stamp));
    copy_tree(audio_folder, &dest)?;
    Ok(dest)
}

/// Recursive copy into a directory that must not exist yet
pub fn copy_tree(source: &Path, dest: &Path) -> Result<(), BackupError> {
    if !source.is_dir() {
        return Err(BackupError::SourceMissing(source.to_path_buf()));
    }
    if dest.exists() {
        return Err(BackupError::DestinationExists(dest.to_path_buf()));
    }

    let canonical_source = source
        .canonicalize()
        .map_err(|e| BackupError::Io(source.to_path_buf(), e.to_string()))?;
    let canonical_parent = dest
        .parent()
        .map(|p| p.canonicalize().unwrap_or_else(|_| p.to_path_buf()))
        .unwrap_or_default();
    if canonical_parent.starts_with(&canonical_source) {
        return Err(BackupError::DestinationInsideSource(dest.to_path_buf()));
    }

    let mut copied = 0usize;
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| BackupError::Io(source.to_path_buf(), e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| BackupError::Io(entry.path().to_path_buf(), e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| BackupError::Io(target.clone(), e.to_string()))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|e| BackupError::Io(target.clone(), e.to_string()))?;
            copied += 1;
        }
    }

    tracing::info!(
        source = %source.display(),
        dest = %dest.display(),
        files = copied,
        "Backup created"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_name() {
        assert_eq!(
            backup_name(Path::new("/data/audio"), "20240301_100000"),
            "audio_backup_20240301_100000"
        );
    }

    #[test]
    fn test_backup_copies_tree() {
        let temp_dir = TempDir::new().unwrap();
        let audio = temp_dir.path().join("audio");
        fs::create_dir_all(audio.join("orphans")).unwrap();
        fs::write(audio.join("a.wav"), b"a").unwrap();
        fs::write(audio.join("orphans").join("b.wav"), b"b").unwrap();

        let backups = temp_dir.path().join("backups");
        fs::create_dir(&backups).unwrap();
        let dest = create_backup(&audio, &backups).unwrap();

        assert!(dest.file_name().unwrap().to_string_lossy().starts_with("audio_backup_"));
        assert_eq!(fs::read(dest.join("a.wav")).unwrap(), b"a");
        assert_eq!(fs::read(dest.join("orphans").join("b.wav")).unwrap(), b"b");
        assert!(audio.join("a.wav").exists());
    }

    #[test]
    fn test_backup_refuses_nested_destination() {
        let temp_dir = TempDir::new().unwrap();
        let audio = temp_dir.path().join("audio");
        fs::create_dir(&audio).unwrap();

        assert!(matches!(
            create_backup(&audio, &audio),
            Err(BackupError::DestinationInsideSource(_))
        ));
    }

    #[test]
    fn test_backup_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            create_backup(&temp_dir.path().join("nope"), temp_dir.path()),
            Err(BackupError::SourceMissing(_))
        ));
    }
}
