//! Data model for reconciliation passes and operation batches

pub mod expected;
pub mod operation;
pub mod record;

pub use expected::{AmbiguousCase, ExpectedFile, ExtensionMismatch, MatchCandidate, SuffixResolution};
pub use operation::{
    ExecutionReport, FailureKind, LogPaths, Operation, OperationFailure, OperationKind,
};
pub use record::Record;
