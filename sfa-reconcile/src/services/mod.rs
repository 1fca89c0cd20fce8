//! Reconciliation services

pub mod backup;
pub mod change_log;
pub mod confidence_matcher;
pub mod expectation_engine;
pub mod file_history;
pub mod file_scanner;
pub mod inclusion_rules;
pub mod operation_executor;
pub mod reconciliation;
pub mod suffix_resolver;

pub use backup::{create_backup, BackupError};
pub use confidence_matcher::ConfidenceMatcher;
pub use expectation_engine::{expand, IncludeAll, InclusionPolicy};
pub use file_history::{FileHistory, HistoryEntry, HistoryError};
pub use file_scanner::{AudioFolderScanner, ScanError, ScanResult};
pub use inclusion_rules::RuleSet;
pub use operation_executor::{ExecutorError, OperationExecutor};
pub use reconciliation::{diff, ReconciliationReport};
pub use suffix_resolver::SuffixResolver;
