//! Derived reconciliation values: expected files, match candidates and
//! resolver findings. All of these are recomputed on every pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A filename that should exist for one field of one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedFile {
    /// Position of the source record in the catalog
    pub record_index: usize,
    pub field: String,
    pub suffix: String,
    pub filename: String,
    /// Display metadata copied from the record
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub gloss: String,
}

/// Proposed pairing of an orphaned file with a missing expected file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub orphan: String,
    pub expected: ExpectedFile,
    /// Combined score in [0, 1]
    pub confidence: f64,
    /// Advisory: confidence is high enough to accept without review
    pub auto_accept: bool,
}

/// File whose longest matching base is shared by more than one base filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousCase {
    pub file: String,
    pub chosen_base: String,
    pub alternatives: Vec<String>,
}

/// File whose extension differs from its base's extension only by case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionMismatch {
    pub expected_name: String,
    pub actual_name: String,
}

/// Output of suffix resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixResolution {
    /// Suffix -> files carrying it, in input order
    pub suffixes: BTreeMap<String, Vec<String>>,
    pub ambiguous: Vec<AmbiguousCase>,
    /// Files no base name is a prefix of
    pub unmatched: Vec<String>,
}

impl SuffixResolution {
    /// Known suffix vocabulary, sorted
    pub fn vocabulary(&self) -> Vec<String> {
        self.suffixes.keys().cloned().collect()
    }
}
