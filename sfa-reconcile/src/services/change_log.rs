//! Human-readable batch logs
//!
//! The change log gains one `## <timestamp>` section per batch and is never
//! truncated. The to-do list is regenerated from the batch's unrecorded
//! entries each time.

use crate::models::{Operation, OperationFailure};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Render one change-log section
///
/// # Arguments
/// * `heading` - Section timestamp text
/// * `completed` - Successful renames and moves, in execution order
/// * `failed` - Operations that failed in this batch
/// * `holding_folder` - Holding directory name shown in move lines
pub fn render_change_section(
    heading: &str,
    completed: &[Operation],
    failed: &[OperationFailure],
    holding_folder: &str,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n## {}\n\n", heading));

    let renames: Vec<&Operation> = completed
        .iter()
        .filter(|op| matches!(op, Operation::Rename { .. }))
        .collect();
    if !renames.is_empty() {
        out.push_str("### Renamed Files\n");
        for op in renames {
            if let Operation::Rename {
                old_filename,
                new_filename,
                reference,
                field,
                reason,
            } = op
            {
                out.push_str(&format!("- `{}` → `{}`\n", old_filename, new_filename));
                out.push_str(&format!(
                    "  - Linked to Record {}, field {}\n",
                    or_na(reference),
                    or_na(field)
                ));
                out.push_str(&format!("  - Reason: {}\n", reason));
            }
        }
        out.push('\n');
    }

    let moves: Vec<&Operation> = completed
        .iter()
        .filter(|op| matches!(op, Operation::MoveToHolding { .. }))
        .collect();
    if !moves.is_empty() {
        out.push_str("### Orphaned Files Moved\n");
        for op in moves {
            if let Operation::MoveToHolding { filename, reason } = op {
                out.push_str(&format!("- `{}` → `{}/{}`\n", filename, holding_folder, filename));
                out.push_str(&format!("  - Reason: {}\n", reason));
            }
        }
        out.push('\n');
    }

    if !failed.is_empty() {
        out.push_str("### Failed Operations\n");
        for failure in failed {
            out.push_str(&format!("- {}\n", failure.operation));
            out.push_str(&format!("  - Error: {}\n", failure.message));
        }
        out.push('\n');
    }

    out
}

/// Render the to-do list for unrecorded fields, grouped by record reference
pub fn render_todo(heading: &str, unrecorded: &[Operation]) -> String {
    struct Group<'a> {
        gloss: &'a str,
        items: Vec<(&'a str, &'a str)>,
    }

    let mut by_record: BTreeMap<&str, Group> = BTreeMap::new();
    for op in unrecorded {
        if let Operation::MarkUnrecorded {
            reference,
            field,
            expected_filename,
            gloss,
        } = op
        {
            let key = if reference.trim().is_empty() {
                "Unknown"
            } else {
                reference.as_str()
            };
            let group = by_record.entry(key).or_insert(Group {
                gloss: "",
                items: Vec::new(),
            });
            if group.gloss.is_empty() {
                group.gloss = gloss.as_str();
            }
            group.items.push((field.as_str(), expected_filename.as_str()));
        }
    }

    let mut out = String::new();
    out.push_str("# Unrecorded Fields To-Do List\n");
    out.push_str(&format!("Generated: {}\n\n", heading));

    for (reference, group) in by_record {
        out.push_str(&format!("## Record {}", reference));
        if !group.gloss.is_empty() {
            out.push_str(&format!(" - \"{}\"", group.gloss));
        }
        out.push('\n');
        for (field, expected) in group.items {
            out.push_str(&format!("- [ ] {} (expected: {})\n", field, expected));
        }
        out.push('\n');
    }

    out
}

/// Append a section to the change log, creating it if needed
pub fn append_change_section(path: &Path, section: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(section.as_bytes())?;
    tracing::debug!(path = %path.display(), "Change log section appended");
    Ok(())
}

/// Overwrite the to-do list
pub fn write_todo(path: &Path, content: &str) -> io::Result<()> {
    fs::write(path, content)?;
    tracing::debug!(path = %path.display(), "To-do list written");
    Ok(())
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}
