//! One reconciliation pass, end to end
//!
//! **Pass:**
//! 1. Resolve suffixes of the actual files against the catalog's base names
//! 2. Expand records into expected files (caller mapping, or one entry per
//!    discovered suffix)
//! 3. Diff expected against actual
//! 4. Score orphans against missing files
//!
//! `plan_batch` turns an analysis into a proposed batch; the caller decides
//! whether to execute it.

use crate::config::ProjectContext;
use crate::error::ReconcileError;
use crate::mapping::SuffixMapping;
use crate::models::{
    ExpectedFile, ExtensionMismatch, MatchCandidate, Operation, Record, SuffixResolution,
};
use crate::services::{
    diff, expand, AudioFolderScanner, ConfidenceMatcher, InclusionPolicy, ReconciliationReport,
    ScanError, SuffixResolver,
};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Non-blank base filenames in catalog order
    pub base_names: Vec<String>,
    pub resolution: SuffixResolution,
    pub extension_mismatches: Vec<ExtensionMismatch>,
    /// Mapping the expectations were built from
    pub mapping: SuffixMapping,
    pub expected: Vec<ExpectedFile>,
    pub report: ReconciliationReport,
    pub suggestions: Vec<MatchCandidate>,
}

/// Audio files at the top level of the project folder
pub fn scan_folder(ctx: &ProjectContext) -> Result<Vec<String>, ScanError> {
    AudioFolderScanner::new(&ctx.audio_extensions).scan(&ctx.audio_folder)
}

/// Base filenames of all records that have one
pub fn base_names(ctx: &ProjectContext, records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.base_filename(&ctx.fields))
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}

/// Run a full pass over records and a folder listing
///
/// # Arguments
/// * `mapping` - Suffix mapping; `None` expects every discovered suffix
/// * `policy` - Per-field inclusion decision
pub fn analyze<P: InclusionPolicy + ?Sized>(
    ctx: &ProjectContext,
    records: &[Record],
    actual: &[String],
    mapping: Option<&SuffixMapping>,
    policy: &P,
) -> Analysis {
    let base_names = base_names(ctx, records);
    let resolver = SuffixResolver::new(ctx.case_sensitive);
    let resolution = resolver.resolve(actual, &base_names);
    let extension_mismatches = resolver.extension_mismatches(actual, &base_names);

    let mapping = match mapping {
        Some(m) => m.clone(),
        None => SuffixMapping::from_vocabulary(resolution.vocabulary(), &ctx.fields.sound_file),
    };

    let expected = expand(records, &mapping, &ctx.fields, policy);
    let report = diff(&expected, actual);
    let suggestions =
        ConfidenceMatcher::new(ctx.fields.clone()).find_matches(&report.missing, &report.orphaned, records);

    Analysis {
        base_names,
        resolution,
        extension_mismatches,
        mapping,
        expected,
        report,
        suggestions,
    }
}

/// Scan the project folder, then `analyze`
pub fn analyze_folder<P: InclusionPolicy + ?Sized>(
    ctx: &ProjectContext,
    records: &[Record],
    mapping: Option<&SuffixMapping>,
    policy: &P,
) -> Result<Analysis, ReconcileError> {
    let actual = scan_folder(ctx)?;
    Ok(analyze(ctx, records, &actual, mapping, policy))
}

/// Read a mapping file: the JSON export when the name ends in `.json`, the
/// tab exchange format otherwise
pub fn load_mapping(path: &Path) -> Result<SuffixMapping, ReconcileError> {
    let text = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let mapping = if is_json {
        SuffixMapping::from_export_json(&text)?
    } else {
        SuffixMapping::parse_exchange(&text)?
    };
    tracing::debug!(path = %path.display(), suffixes = mapping.len(), "Mapping loaded");
    Ok(mapping)
}

/// Proposed batch for an analysis
///
/// **Algorithm:**
/// 1. Rename each orphan with an auto-accept suggestion, best first, as long
///    as neither the orphan nor the target name is already claimed
/// 2. Move every other orphan to holding
/// 3. Mark every still-missing expected file unrecorded
pub fn plan_batch(analysis: &Analysis) -> Vec<Operation> {
    let mut batch = Vec::new();
    let mut used_orphans: HashSet<&str> = HashSet::new();
    let mut claimed: HashSet<&str> = HashSet::new();

    for candidate in analysis.suggestions.iter().filter(|c| c.auto_accept) {
        if used_orphans.contains(candidate.orphan.as_str())
            || claimed.contains(candidate.expected.filename.as_str())
        {
            continue;
        }
        used_orphans.insert(&candidate.orphan);
        claimed.insert(&candidate.expected.filename);
        batch.push(Operation::from_candidate(candidate));
    }

    for orphan in &analysis.report.orphaned {
        if !used_orphans.contains(orphan.as_str()) {
            batch.push(Operation::move_to_holding(orphan.clone()));
        }
    }

    for missing in &analysis.report.missing {
        if !claimed.contains(missing.filename.as_str()) {
            batch.push(Operation::unrecorded(missing));
        }
    }

    tracing::info!(operations = batch.len(), "Batch planned");
    batch
}
