//! Filename helpers shared by the resolver, expectation engine and executor
//!
//! Extensions are recognised only when the text after the last dot is a
//! short alphanumeric token, so base names such as `0021.5_dog` keep their
//! dot.

/// Default extension for base names recorded without one
pub const DEFAULT_EXTENSION: &str = ".wav";

const MAX_EXTENSION_LEN: usize = 5;

/// Split a filename into stem and extension (extension includes the dot)
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = &name[idx + 1..];
            if !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
            {
                (&name[..idx], Some(&name[idx..]))
            } else {
                (name, None)
            }
        }
        _ => (name, None),
    }
}

/// Filename without its extension
pub fn stem(name: &str) -> &str {
    split_extension(name).0
}

/// Strip `prefix` from `text`, returning the remainder with original casing
///
/// Case-insensitive comparison folds each character independently, so the
/// remainder is always sliced at a character boundary of `text`.
pub fn strip_prefix<'a>(text: &'a str, prefix: &str, case_sensitive: bool) -> Option<&'a str> {
    if case_sensitive {
        return text.strip_prefix(prefix);
    }

    let mut chars = text.char_indices();
    for p in prefix.chars() {
        let (_, t) = chars.next()?;
        if !t.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }
    let offset = chars.next().map(|(i, _)| i).unwrap_or(text.len());
    Some(&text[offset..])
}

/// Compare two strings for equality honoring the case flag
pub fn names_equal(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// A bare filename: non-empty, no path separators, not `.` or `..`
pub fn is_bare_filename(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}
