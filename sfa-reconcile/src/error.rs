//! Error type for sfa-reconcile
//!
//! Each service owns a focused error enum; `ReconcileError` collects them for
//! callers that drive a whole pass.

use crate::catalog::CatalogError;
use crate::mapping::MappingError;
use crate::services::{BackupError, ExecutorError, HistoryError, ScanError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    /// sfa-common error (configuration, I/O)
    #[error("Common error: {0}")]
    Common(#[from] sfa_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
