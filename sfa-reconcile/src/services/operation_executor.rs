//! Operation executor
//!
//! Applies a caller-approved batch of renames and moves to the audio folder,
//! records each successful change under a stable file identity, and writes
//! the change log and to-do list.
//!
//! **Execution order (independent of input order):**
//! 1. Validate the whole batch; any structural error aborts before touching files
//! 2. Create the holding directory if the batch moves anything
//! 3. All moves to holding
//! 4. All renames; a rename whose source has gone is skipped
//! 5. Logs: change log section, history document, to-do list
//!
//! Moves and renames are independent. A failure is recorded and the batch
//! continues; nothing is retried or rolled back.

use crate::config::ProjectContext;
use crate::models::{ExecutionReport, FailureKind, Operation, OperationFailure, OperationKind};
use crate::services::change_log;
use crate::services::file_history::{FileHistory, HistoryEntry, HistoryError};
use crate::utils::filename::is_bare_filename;
use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Batch-level executor errors; per-operation failures go in the report
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Malformed operation, reported before any file is touched
    #[error("Invalid operation at index {index}: {message}")]
    InvalidOperation { index: usize, message: String },

    /// Holding directory could not be created; no file was touched
    #[error("Cannot create holding directory {0}: {1}")]
    HoldingDirectory(PathBuf, String),

    #[error(transparent)]
    History(#[from] HistoryError),
}

pub struct OperationExecutor {
    ctx: ProjectContext,
    history: FileHistory,
}

impl OperationExecutor {
    /// Create an executor for a project, loading its history document
    pub fn new(ctx: &ProjectContext) -> Result<Self, ExecutorError> {
        let history = FileHistory::load(&ctx.history_path())?;
        Ok(Self {
            ctx: ctx.clone(),
            history,
        })
    }

    pub fn history(&self) -> &FileHistory {
        &self.history
    }

    /// Execute a batch
    ///
    /// # Returns
    /// Report with completed/failed/skipped counts and per-operation errors
    ///
    /// # Errors
    /// Structural problems with the batch, or failure to create the holding
    /// directory. In both cases no file has been changed.
    pub fn execute(&mut self, operations: &[Operation]) -> Result<ExecutionReport, ExecutorError> {
        validate_batch(operations)?;

        let mut report = ExecutionReport::new(self.ctx.log_paths());
        if operations.is_empty() {
            tracing::debug!("Empty batch, nothing to do");
            return Ok(report);
        }

        let by_kind = |kind: OperationKind| {
            operations
                .iter()
                .filter(move |op| op.kind() == kind)
                .collect::<Vec<_>>()
        };
        let moves = by_kind(OperationKind::MoveToHolding);
        let renames = by_kind(OperationKind::Rename);
        let unrecorded: Vec<Operation> = by_kind(OperationKind::MarkUnrecorded)
            .into_iter()
            .cloned()
            .collect();

        let holding = self.ctx.holding_path();
        if !moves.is_empty() {
            fs::create_dir_all(&holding)
                .map_err(|e| ExecutorError::HoldingDirectory(holding.clone(), e.to_string()))?;
        }

        let mut completed: Vec<Operation> = Vec::new();

        for op in moves {
            match self.apply_move(op, &holding) {
                Ok(()) => {
                    report.completed += 1;
                    completed.push(op.clone());
                }
                Err((kind, message)) => self.fail(&mut report, op, kind, message),
            }
        }

        for op in renames {
            let Operation::Rename { old_filename, .. } = op else {
                continue;
            };
            if !exists(&self.ctx.audio_folder.join(old_filename)) {
                tracing::debug!(file = %old_filename, "Rename source gone, skipping");
                report.skipped += 1;
                continue;
            }
            match self.apply_rename(op) {
                Ok(()) => {
                    report.completed += 1;
                    completed.push(op.clone());
                }
                Err((kind, message)) => self.fail(&mut report, op, kind, message),
            }
        }

        self.write_logs(&mut report, &completed, &unrecorded, &holding);

        tracing::info!(
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            unrecorded = unrecorded.len(),
            "Batch executed"
        );
        Ok(report)
    }

    fn fail(&self, report: &mut ExecutionReport, op: &Operation, kind: FailureKind, message: String) {
        tracing::warn!(operation = %op, error = %message, "Operation failed");
        report.record_failure(OperationFailure {
            operation: op.clone(),
            kind,
            message,
        });
    }

    fn apply_move(&mut self, op: &Operation, holding: &Path) -> Result<(), (FailureKind, String)> {
        let Operation::MoveToHolding { filename, reason } = op else {
            return Ok(());
        };
        let source = self.ctx.audio_folder.join(filename);
        let dest = holding.join(filename);

        if !exists(&source) {
            return Err((
                FailureKind::MissingSource,
                format!("Source file not found: {}", filename),
            ));
        }
        if exists(&dest) {
            return Err((
                FailureKind::NamingConflict,
                format!("File already exists in holding: {}", filename),
            ));
        }

        fs::rename(&source, &dest).map_err(|e| (FailureKind::Io, e.to_string()))?;
        tracing::debug!(file = %filename, "Moved to holding");

        let id = self.history.resolve_or_create(filename, &source);
        self.history.record(
            &id,
            HistoryEntry::new(OperationKind::MoveToHolding.as_str(), &source, &dest, reason),
        );
        Ok(())
    }

    fn apply_rename(&mut self, op: &Operation) -> Result<(), (FailureKind, String)> {
        let Operation::Rename {
            old_filename,
            new_filename,
            reference,
            field,
            reason,
        } = op
        else {
            return Ok(());
        };
        let source = self.ctx.audio_folder.join(old_filename);
        let dest = self.ctx.audio_folder.join(new_filename);

        let taken = destination_taken(&self.ctx.audio_folder, old_filename, new_filename)
            .map_err(|e| (FailureKind::Io, e.to_string()))?;
        if taken {
            return Err((
                FailureKind::NamingConflict,
                format!("Target file already exists: {}", new_filename),
            ));
        }

        fs::rename(&source, &dest).map_err(|e| (FailureKind::Io, e.to_string()))?;
        tracing::debug!(from = %old_filename, to = %new_filename, "Renamed");

        let id = self.history.resolve_or_create(old_filename, &source);
        self.history.record(
            &id,
            HistoryEntry::new(OperationKind::Rename.as_str(), &source, &dest, reason)
                .with_record(reference, field),
        );
        Ok(())
    }

    /// Change log, history and to-do list; failures land in `log_errors`
    fn write_logs(
        &mut self,
        report: &mut ExecutionReport,
        completed: &[Operation],
        unrecorded: &[Operation],
        holding: &Path,
    ) {
        let heading = sfa_common::time::log_heading(Local::now());

        if !completed.is_empty() || !report.errors.is_empty() {
            let section = change_log::render_change_section(
                &heading,
                completed,
                &report.errors,
                &self.ctx.holding_folder,
            );
            let path = self.ctx.change_log_path();
            if let Err(e) = change_log::append_change_section(&path, &section) {
                log_error(report, &format!("change log {}", path.display()), &e);
            }
        }

        if self.history.is_dirty() {
            if let Err(e) = self.history.save() {
                log_error(report, "history", &e);
            }
        }

        let moved_any = completed
            .iter()
            .chain(report.errors.iter().map(|f| &f.operation))
            .any(|op| op.kind() == OperationKind::MoveToHolding);
        if moved_any && self.history.path().exists() {
            if let Err(e) = self.history.copy_to(holding) {
                log_error(report, "history copy", &e);
            }
        }

        if !unrecorded.is_empty() {
            let content = change_log::render_todo(&heading, unrecorded);
            let path = self.ctx.todo_log_path();
            if let Err(e) = change_log::write_todo(&path, &content) {
                log_error(report, &format!("to-do list {}", path.display()), &e);
            }
        }
    }
}

fn log_error(report: &mut ExecutionReport, what: &str, e: &dyn std::fmt::Display) {
    let message = format!("{}: {}", what, e);
    tracing::warn!(error = %message, "Log write failed");
    report.log_errors.push(message);
}

/// Structural checks over the whole batch
pub fn validate_batch(operations: &[Operation]) -> Result<(), ExecutorError> {
    let invalid = |index: usize, message: String| ExecutorError::InvalidOperation { index, message };

    for (index, op) in operations.iter().enumerate() {
        match op {
            Operation::Rename {
                old_filename,
                new_filename,
                ..
            } => {
                for name in [old_filename, new_filename] {
                    if !is_bare_filename(name) {
                        return Err(invalid(index, format!("'{}' is not a bare filename", name)));
                    }
                }
                if old_filename == new_filename {
                    return Err(invalid(
                        index,
                        format!("rename of '{}' to itself", old_filename),
                    ));
                }
            }
            Operation::MoveToHolding { filename, .. } => {
                if !is_bare_filename(filename) {
                    return Err(invalid(index, format!("'{}' is not a bare filename", filename)));
                }
            }
            Operation::MarkUnrecorded { field, .. } => {
                if field.trim().is_empty() {
                    return Err(invalid(index, "mark_unrecorded without a field".to_string()));
                }
            }
        }
    }
    Ok(())
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// True when `new` is already taken by a file other than `old`
///
/// On case-insensitive file systems a case-only rename finds the source
/// itself at the destination, so the directory is listed for an exact match.
fn destination_taken(folder: &Path, old: &str, new: &str) -> io::Result<bool> {
    if old.to_lowercase() != new.to_lowercase() {
        return Ok(exists(&folder.join(new)));
    }

    for entry in fs::read_dir(folder)? {
        if entry?.file_name().to_string_lossy() == new {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(files: &[&str]) -> (TempDir, ProjectContext) {
        let temp_dir = TempDir::new().unwrap();
        for name in files {
            fs::write(temp_dir.path().join(name), b"RIFF").unwrap();
        }
        let ctx = ProjectContext::new(temp_dir.path());
        (temp_dir, ctx)
    }

    #[test]
    fn test_validation_names_index_and_touches_nothing() {
        let (_dir, ctx) = setup(&["a.wav"]);
        let mut executor = OperationExecutor::new(&ctx).unwrap();

        let batch = vec![
            Operation::move_to_holding("a.wav"),
            Operation::rename("../a.wav", "b.wav"),
        ];
        match executor.execute(&batch).unwrap_err() {
            ExecutorError::InvalidOperation { index, .. } => assert_eq!(index, 1),
            other => panic!("Expected InvalidOperation, got {:?}", other),
        }
        assert!(ctx.audio_folder.join("a.wav").exists());
        assert!(!ctx.holding_path().exists());
    }

    #[test]
    fn test_move_missing_source_fails() {
        let (_dir, ctx) = setup(&[]);
        let mut executor = OperationExecutor::new(&ctx).unwrap();

        let report = executor.execute(&[Operation::move_to_holding("ghost.wav")]).unwrap();
        assert!(!report.success);
        assert_eq!(report.errors[0].kind, FailureKind::MissingSource);
        assert!(executor.history().is_empty());
    }

    #[test]
    fn test_rename_missing_source_is_skipped() {
        let (_dir, ctx) = setup(&[]);
        let mut executor = OperationExecutor::new(&ctx).unwrap();

        let report = executor.execute(&[Operation::rename("gone.wav", "x.wav")]).unwrap();
        assert!(report.success);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.completed, 0);
        assert!(!ctx.change_log_path().exists());
    }

    #[test]
    fn test_holding_directory_failure_aborts() {
        let (_dir, ctx) = setup(&["a.wav", "b.wav"]);
        fs::write(ctx.holding_path(), b"not a directory").unwrap();
        let mut executor = OperationExecutor::new(&ctx).unwrap();

        let batch = vec![
            Operation::move_to_holding("a.wav"),
            Operation::rename("b.wav", "c.wav"),
        ];
        assert!(matches!(
            executor.execute(&batch),
            Err(ExecutorError::HoldingDirectory(_, _))
        ));
        assert!(ctx.audio_folder.join("b.wav").exists());
    }

    #[test]
    fn test_case_only_rename() {
        let (_dir, ctx) = setup(&["a.WAV"]);
        let mut executor = OperationExecutor::new(&ctx).unwrap();

        let report = executor.execute(&[Operation::rename("a.WAV", "a.wav")]).unwrap();
        assert!(report.success, "{:?}", report.errors);
        let names: Vec<String> = fs::read_dir(&ctx.audio_folder)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.contains(&"a.wav".to_string()));
        assert!(!names.contains(&"a.WAV".to_string()));
    }

    #[test]
    fn test_unrecorded_only_writes_todo() {
        let (_dir, ctx) = setup(&[]);
        let mut executor = OperationExecutor::new(&ctx).unwrap();

        let batch = vec![Operation::MarkUnrecorded {
            reference: "0023".to_string(),
            field: "Phonetic".to_string(),
            expected_filename: "0023_bird-phon.wav".to_string(),
            gloss: "bird".to_string(),
        }];
        let report = executor.execute(&batch).unwrap();
        assert!(report.success);
        assert_eq!(report.completed, 0);

        let todo = fs::read_to_string(ctx.todo_log_path()).unwrap();
        assert!(todo.contains("## Record 0023 - \"bird\""));
        assert!(todo.contains("- [ ] Phonetic (expected: 0023_bird-phon.wav)"));
        assert!(!ctx.change_log_path().exists());
        assert!(!ctx.history_path().exists());
    }
}
