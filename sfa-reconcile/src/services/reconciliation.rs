//! Expected vs. actual set difference

use crate::models::ExpectedFile;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    /// Expected entries with no actual file, in expectation order
    pub missing: Vec<ExpectedFile>,
    /// Actual files no expected entry names, in listing order
    pub orphaned: Vec<String>,
}

impl ReconciliationReport {
    /// Nothing missing and nothing orphaned
    pub fn is_converged(&self) -> bool {
        self.missing.is_empty() && self.orphaned.is_empty()
    }
}

/// Compare expected filenames against the folder listing
///
/// Names are compared exactly. An actual file satisfying several expected
/// entries is counted once.
pub fn diff<S: AsRef<str>>(expected: &[ExpectedFile], actual: &[S]) -> ReconciliationReport {
    let actual_set: HashSet<&str> = actual.iter().map(|s| s.as_ref()).collect();
    let expected_set: HashSet<&str> = expected.iter().map(|e| e.filename.as_str()).collect();

    let missing: Vec<ExpectedFile> = expected
        .iter()
        .filter(|e| !actual_set.contains(e.filename.as_str()))
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let orphaned: Vec<String> = actual
        .iter()
        .map(|s| s.as_ref())
        .filter(|name| !expected_set.contains(name) && seen.insert(*name))
        .map(str::to_string)
        .collect();

    tracing::info!(
        expected = expected.len(),
        actual = actual.len(),
        missing = missing.len(),
        orphaned = orphaned.len(),
        "Reconciliation complete"
    );

    ReconciliationReport { missing, orphaned }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(filename: &str, field: &str) -> ExpectedFile {
        ExpectedFile {
            record_index: 0,
            field: field.to_string(),
            suffix: String::new(),
            filename: filename.to_string(),
            reference: String::new(),
            gloss: String::new(),
        }
    }

    #[test]
    fn test_missing_and_orphaned() {
        let exp = vec![expected("a.wav", "SoundFile"), expected("a-phon.wav", "Phonetic")];
        let actual = vec!["a.wav", "stray.wav"];

        let report = diff(&exp, &actual);
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].filename, "a-phon.wav");
        assert_eq!(report.orphaned, vec!["stray.wav"]);
        assert!(!report.is_converged());
    }

    #[test]
    fn test_shared_file_is_not_double_reported() {
        let exp = vec![expected("a-phon.wav", "Phonetic"), expected("a-phon.wav", "Phonemic")];
        let report = diff(&exp, &["a-phon.wav"]);
        assert!(report.is_converged());
    }

    #[test]
    fn test_comparison_is_exact() {
        let report = diff(&[expected("a.wav", "SoundFile")], &["a.WAV"]);
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.orphaned, vec!["a.WAV"]);
    }
}
