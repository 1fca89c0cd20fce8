//! Operation batch model
//!
//! Operations are built by the caller (directly, from accepted match
//! candidates, or from a JSON batch file). The executor never invents them.

use crate::models::{ExpectedFile, MatchCandidate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

fn default_rename_reason() -> String {
    "Linked to record".to_string()
}

fn default_move_reason() -> String {
    "No matching record found".to_string()
}

/// One caller-approved mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Rename a file inside the audio folder
    Rename {
        old_filename: String,
        new_filename: String,
        #[serde(default)]
        reference: String,
        #[serde(default)]
        field: String,
        #[serde(default = "default_rename_reason")]
        reason: String,
    },
    /// Move a top-level file into the holding directory
    MoveToHolding {
        filename: String,
        #[serde(default = "default_move_reason")]
        reason: String,
    },
    /// No file-system effect; feeds the to-do list
    MarkUnrecorded {
        #[serde(default)]
        reference: String,
        field: String,
        expected_filename: String,
        #[serde(default)]
        gloss: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Rename,
    MoveToHolding,
    MarkUnrecorded,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Rename => "rename",
            OperationKind::MoveToHolding => "move_to_holding",
            OperationKind::MarkUnrecorded => "mark_unrecorded",
        }
    }
}

impl Operation {
    pub fn rename(old_filename: impl Into<String>, new_filename: impl Into<String>) -> Self {
        Operation::Rename {
            old_filename: old_filename.into(),
            new_filename: new_filename.into(),
            reference: String::new(),
            field: String::new(),
            reason: default_rename_reason(),
        }
    }

    pub fn move_to_holding(filename: impl Into<String>) -> Self {
        Operation::MoveToHolding {
            filename: filename.into(),
            reason: default_move_reason(),
        }
    }

    /// Rename an orphan onto the expected name of a candidate
    pub fn from_candidate(candidate: &MatchCandidate) -> Self {
        Operation::Rename {
            old_filename: candidate.orphan.clone(),
            new_filename: candidate.expected.filename.clone(),
            reference: candidate.expected.reference.clone(),
            field: candidate.expected.field.clone(),
            reason: format!("Matched with confidence {:.2}", candidate.confidence),
        }
    }

    /// To-do entry for an expected recording that does not exist
    pub fn unrecorded(expected: &ExpectedFile) -> Self {
        Operation::MarkUnrecorded {
            reference: expected.reference.clone(),
            field: expected.field.clone(),
            expected_filename: expected.filename.clone(),
            gloss: expected.gloss.clone(),
        }
    }

    /// Attach a record link to a rename; no effect on other variants
    pub fn linked_to(mut self, record_reference: &str, field_name: &str) -> Self {
        if let Operation::Rename {
            reference, field, ..
        } = &mut self
        {
            *reference = record_reference.to_string();
            *field = field_name.to_string();
        }
        self
    }

    /// Replace the reason; no effect on `MarkUnrecorded`
    pub fn with_reason(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            Operation::Rename { reason, .. } | Operation::MoveToHolding { reason, .. } => {
                *reason = text.into();
            }
            Operation::MarkUnrecorded { .. } => {}
        }
        self
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Rename { .. } => OperationKind::Rename,
            Operation::MoveToHolding { .. } => OperationKind::MoveToHolding,
            Operation::MarkUnrecorded { .. } => OperationKind::MarkUnrecorded,
        }
    }

    /// Filename the operation acts on at the top level of the audio folder
    pub fn source_filename(&self) -> Option<&str> {
        match self {
            Operation::Rename { old_filename, .. } => Some(old_filename),
            Operation::MoveToHolding { filename, .. } => Some(filename),
            Operation::MarkUnrecorded { .. } => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Rename {
                old_filename,
                new_filename,
                ..
            } => write!(f, "rename `{}` → `{}`", old_filename, new_filename),
            Operation::MoveToHolding { filename, .. } => {
                write!(f, "move `{}` to holding", filename)
            }
            Operation::MarkUnrecorded {
                reference, field, ..
            } => write!(f, "mark {} unrecorded for record {}", field, reference),
        }
    }
}

/// Why a single operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Destination name already taken
    NamingConflict,
    /// Source file not present
    MissingSource,
    /// Any other I/O or permission error
    Io,
}

/// Per-operation failure; the batch continues past it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    pub operation: Operation,
    pub kind: FailureKind,
    pub message: String,
}

/// Locations of the files written after a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPaths {
    pub history: PathBuf,
    pub change_log: PathBuf,
    pub todo_log: PathBuf,
}

/// Outcome of one executed batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// True when no move or rename failed
    pub success: bool,
    pub completed: usize,
    pub failed: usize,
    /// Renames whose source had already left the top level
    pub skipped: usize,
    pub errors: Vec<OperationFailure>,
    pub log_paths: LogPaths,
    /// Log or history write failures; file changes are not rolled back
    pub log_errors: Vec<String>,
}

impl ExecutionReport {
    pub fn new(log_paths: LogPaths) -> Self {
        Self {
            success: true,
            completed: 0,
            failed: 0,
            skipped: 0,
            errors: Vec::new(),
            log_paths,
            log_errors: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, failure: OperationFailure) {
        self.failed += 1;
        self.success = false;
        self.errors.push(failure);
    }
}
