//! Confidence matcher
//!
//! Scores pairings between orphaned files and missing expected files so a
//! caller can propose renames.
//!
//! **Weights:**
//! - Filename similarity (normalized Levenshtein): 50%
//! - Reference found in the orphan name: 30%
//! - Gloss found in the orphan name: 20%
//!
//! **Thresholds:**
//! - Keep: ≥0.50 (top 3 per orphan)
//! - Auto-accept: ≥0.85 (advisory)

use crate::models::{ExpectedFile, MatchCandidate, Record};
use sfa_common::config::FieldNames;

/// Per-signal scores for one pairing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evidence {
    pub filename_similarity: f64,
    pub reference_similarity: f64,
    pub gloss_similarity: f64,
}

pub struct ConfidenceMatcher {
    filename_weight: f64,
    reference_weight: f64,
    gloss_weight: f64,
    /// Candidates below this are dropped
    keep_threshold: f64,
    auto_accept_threshold: f64,
    max_per_orphan: usize,
    fields: FieldNames,
}

impl ConfidenceMatcher {
    pub fn new(fields: FieldNames) -> Self {
        Self {
            filename_weight: 0.5,
            reference_weight: 0.3,
            gloss_weight: 0.2,
            keep_threshold: 0.5,
            auto_accept_threshold: 0.85,
            max_per_orphan: 3,
            fields,
        }
    }

    /// Candidate pairings for every orphan
    ///
    /// **Algorithm:**
    /// 1. Score each orphan against every missing file
    /// 2. Drop scores below the keep threshold
    /// 3. Sort descending per orphan (stable, so ties keep missing-list order)
    /// 4. Keep the top three per orphan
    ///
    /// # Arguments
    /// * `missing` - Expected files with no actual file
    /// * `orphaned` - Actual files no expected entry names
    /// * `records` - Catalog, consulted for the reference and gloss of each
    ///   expected file's record
    pub fn find_matches(
        &self,
        missing: &[ExpectedFile],
        orphaned: &[String],
        records: &[Record],
    ) -> Vec<MatchCandidate> {
        let mut suggestions = Vec::new();

        for orphan in orphaned {
            let mut best: Vec<MatchCandidate> = missing
                .iter()
                .filter_map(|expected| {
                    let confidence = self.confidence(orphan, expected, records);
                    (confidence >= self.keep_threshold).then(|| MatchCandidate {
                        orphan: orphan.clone(),
                        expected: expected.clone(),
                        confidence,
                        auto_accept: confidence >= self.auto_accept_threshold,
                    })
                })
                .collect();

            best.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
            best.truncate(self.max_per_orphan);

            if let Some(top) = best.first() {
                tracing::debug!(
                    orphan = %orphan,
                    expected = %top.expected.filename,
                    confidence = top.confidence,
                    candidates = best.len(),
                    "Match candidates found"
                );
            }
            suggestions.extend(best);
        }

        tracing::info!(
            orphans = orphaned.len(),
            missing = missing.len(),
            suggestions = suggestions.len(),
            "Confidence matching complete"
        );
        suggestions
    }

    /// Combined confidence in [0, 1]
    pub fn confidence(&self, orphan: &str, expected: &ExpectedFile, records: &[Record]) -> f64 {
        let evidence = self.evidence(orphan, expected, records);
        (evidence.filename_similarity * self.filename_weight)
            + (evidence.reference_similarity * self.reference_weight)
            + (evidence.gloss_similarity * self.gloss_weight)
    }

    pub fn evidence(&self, orphan: &str, expected: &ExpectedFile, records: &[Record]) -> Evidence {
        let (reference, gloss) = match records.get(expected.record_index) {
            Some(record) => (record.reference(&self.fields), record.gloss(&self.fields)),
            None => (expected.reference.as_str(), expected.gloss.as_str()),
        };

        Evidence {
            filename_similarity: filename_similarity(orphan, &expected.filename),
            reference_similarity: reference_similarity(orphan, reference),
            gloss_similarity: gloss_similarity(orphan, gloss),
        }
    }
}

impl Default for ConfidenceMatcher {
    fn default() -> Self {
        Self::new(FieldNames::default())
    }
}

/// 1 − Levenshtein(lowercased) / longest length in characters
pub fn filename_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(&a.to_lowercase(), &b.to_lowercase());
    (1.0 - distance as f64 / longest as f64).clamp(0.0, 1.0)
}

/// 1.0 when the reference appears verbatim, 0.8 without leading zeros
pub fn reference_similarity(filename: &str, reference: &str) -> f64 {
    if reference.is_empty() {
        return 0.0;
    }
    if filename.contains(reference) {
        return 1.0;
    }

    let stripped = reference.trim_start_matches('0');
    if !stripped.is_empty() && filename.contains(stripped) {
        return 0.8;
    }
    0.0
}

/// 1.0 when the gloss appears (any case), 0.6 when its first four characters do
pub fn gloss_similarity(filename: &str, gloss: &str) -> f64 {
    if gloss.is_empty() {
        return 0.0;
    }

    let filename = filename.to_lowercase();
    let gloss = gloss.to_lowercase();
    if filename.contains(&gloss) {
        return 1.0;
    }

    if gloss.chars().count() >= 4 {
        let prefix: String = gloss.chars().take(4).collect();
        if filename.contains(&prefix) {
            return 0.6;
        }
    }
    0.0
}
