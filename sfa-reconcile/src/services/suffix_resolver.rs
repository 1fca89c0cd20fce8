//! Filename suffix resolver
//!
//! Works out which base filename each actual file belongs to and what suffix
//! it carries.
//!
//! **Algorithm:**
//! 1. Strip the extension from the file and from every base name
//! 2. Collect every base whose stem is a prefix of the file stem
//! 3. Choose the longest match; equal-length distinct bases are reported as
//!    ambiguous and the first in input order wins
//! 4. The suffix is the remainder of the file stem, original casing kept

use crate::models::{AmbiguousCase, ExtensionMismatch, SuffixResolution};
use crate::utils::filename::{self, DEFAULT_EXTENSION};

/// Base chosen for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment<'a> {
    pub base: &'a str,
    pub suffix: &'a str,
    /// Other bases matching with the same length
    pub tied: Vec<&'a str>,
}

pub struct SuffixResolver {
    case_sensitive: bool,
}

impl SuffixResolver {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    /// Resolve suffixes for every actual file
    ///
    /// # Arguments
    /// * `actual_files` - Filenames present in the audio folder
    /// * `base_names` - Base filenames from the catalog; blanks are ignored
    ///
    /// # Returns
    /// Suffix → files map, ambiguous files, and files matching no base
    pub fn resolve<S: AsRef<str>>(&self, actual_files: &[S], base_names: &[S]) -> SuffixResolution {
        let bases = distinct_bases(base_names);
        let mut resolution = SuffixResolution::default();

        for file in actual_files {
            let file = file.as_ref();
            match self.assign(file, &bases) {
                Some(assignment) => {
                    tracing::debug!(
                        file = %file,
                        base = %assignment.base,
                        suffix = %assignment.suffix,
                        "Suffix resolved"
                    );
                    if !assignment.tied.is_empty() {
                        tracing::warn!(
                            file = %file,
                            chosen = %assignment.base,
                            alternatives = ?assignment.tied,
                            "Ambiguous base filename match"
                        );
                        resolution.ambiguous.push(AmbiguousCase {
                            file: file.to_string(),
                            chosen_base: assignment.base.to_string(),
                            alternatives: assignment.tied.iter().map(|s| s.to_string()).collect(),
                        });
                    }
                    resolution
                        .suffixes
                        .entry(assignment.suffix.to_string())
                        .or_default()
                        .push(file.to_string());
                }
                None => resolution.unmatched.push(file.to_string()),
            }
        }

        tracing::info!(
            files = actual_files.len(),
            suffixes = resolution.suffixes.len(),
            ambiguous = resolution.ambiguous.len(),
            unmatched = resolution.unmatched.len(),
            "Suffix resolution complete"
        );
        resolution
    }

    /// Files whose extension differs from their base's only by case
    ///
    /// A base without an extension is treated as `.wav`.
    pub fn extension_mismatches<S: AsRef<str>>(
        &self,
        actual_files: &[S],
        base_names: &[S],
    ) -> Vec<ExtensionMismatch> {
        let bases = distinct_bases(base_names);
        let mut mismatches = Vec::new();

        for file in actual_files {
            let file = file.as_ref();
            let Some(assignment) = self.assign(file, &bases) else {
                continue;
            };
            let (file_stem, file_ext) = filename::split_extension(file);
            let Some(file_ext) = file_ext else {
                continue;
            };
            let base_ext = filename::split_extension(assignment.base)
                .1
                .unwrap_or(DEFAULT_EXTENSION);

            if file_ext != base_ext && file_ext.eq_ignore_ascii_case(base_ext) {
                mismatches.push(ExtensionMismatch {
                    expected_name: format!("{}{}", file_stem, base_ext),
                    actual_name: file.to_string(),
                });
            }
        }

        mismatches
    }

    /// Longest-prefix base for one file, `None` when no base matches
    pub fn assign<'a>(&self, file: &'a str, bases: &[&'a str]) -> Option<Assignment<'a>> {
        let file_stem = filename::stem(file);
        let mut best: Option<(usize, &'a str, &'a str)> = None;
        let mut tied: Vec<&'a str> = Vec::new();

        for &base in bases {
            let base_stem = filename::stem(base);
            let Some(rest) = filename::strip_prefix(file_stem, base_stem, self.case_sensitive)
            else {
                continue;
            };
            let len = base_stem.chars().count();

            match best {
                Some((best_len, _, _)) if len < best_len => {}
                Some((best_len, _, _)) if len == best_len => tied.push(base),
                _ => {
                    best = Some((len, base, rest));
                    tied.clear();
                }
            }
        }

        best.map(|(_, base, suffix)| Assignment { base, suffix, tied })
    }
}

impl Default for SuffixResolver {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Trimmed, non-empty base names with exact duplicates removed, input order kept
pub fn distinct_bases<S: AsRef<str>>(base_names: &[S]) -> Vec<&str> {
    let mut bases: Vec<&str> = Vec::new();
    for base in base_names {
        let base = base.as_ref().trim();
        if !base.is_empty() && !bases.contains(&base) {
            bases.push(base);
        }
    }
    bases
}
