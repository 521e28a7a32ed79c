//! Byte-range edit model (component A).
//!
//! A [`Change`] is a pure value; the serializer is the only mutator of
//! files. Two edits against the same file are composed by sorting in
//! descending `start` order and applying sequentially, which keeps
//! earlier offsets valid while later ones are rewritten.

use std::path::{Path, PathBuf};

use crate::error::{RefactorError, Result};

/// A single byte-range text edit against one file's pre-application
/// content.
#[derive(Debug, Clone)]
pub struct Change {
    /// File this edit applies to.
    pub file: PathBuf,
    /// Byte offset of the start of the replaced range (inclusive).
    pub start: usize,
    /// Byte offset of the end of the replaced range (exclusive).
    pub end: usize,
    /// The text originally occupying `[start, end)`, if known. When
    /// non-empty it must byte-equal `original_content[start..end]`.
    pub old_text: String,
    /// The replacement text.
    pub new_text: String,
    /// Human-readable description, surfaced in previews.
    pub description: String,
}

impl Change {
    /// Construct a `Change`, validating it against the file's original
    /// content when `old_text` is supplied non-empty.
    pub fn new(
        file: impl Into<PathBuf>,
        start: usize,
        end: usize,
        old_text: impl Into<String>,
        new_text: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self> {
        let file = file.into();
        let old_text = old_text.into();
        if start > end {
            return Err(RefactorError::InvalidOperation(format!(
                "edit range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { file, start, end, old_text, new_text: new_text.into(), description: description.into() })
    }

    /// Validate `old_text` (if non-empty) against the file's true
    /// original content.
    pub fn validate_against(&self, original_content: &str) -> Result<()> {
        if self.end > original_content.len() {
            return Err(RefactorError::InvalidOperation(format!(
                "edit range {}..{} exceeds file length {}",
                self.start,
                self.end,
                original_content.len()
            )));
        }
        if !self.old_text.is_empty() {
            let actual = &original_content[self.start..self.end];
            if actual != self.old_text {
                return Err(RefactorError::InvalidOperation(format!(
                    "edit old_text mismatch at {}..{}: expected {:?}, found {:?}",
                    self.start, self.end, self.old_text, actual
                )));
            }
        }
        Ok(())
    }
}

fn overlap_conflict(a: &Change, b: &Change) -> Option<RefactorError> {
    if a.file != b.file {
        return None;
    }
    if a.start < b.end && b.start < a.end {
        return Some(RefactorError::InvalidOperation(format!(
            "overlapping edits in {}: {}..{} and {}..{}",
            a.file.display(),
            a.start,
            a.end,
            b.start,
            b.end
        )));
    }
    None
}

/// Check that no two changes targeting the same file overlap.
///
/// Strict: `a.start < b.end && b.start < a.end` is forbidden, but two
/// edits that merely touch at a boundary (`a.end == b.start`) are fine.
/// O(n²) across one file's edits, performed before any I/O.
pub fn check_non_overlapping(changes: &[Change]) -> Result<()> {
    for (i, a) in changes.iter().enumerate() {
        for b in &changes[i + 1..] {
            if let Some(e) = overlap_conflict(a, b) {
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Same check over a slice of references, used where changes are
/// borrowed from a larger plan rather than owned.
pub fn check_non_overlapping_refs(changes: &[&Change]) -> Result<()> {
    for (i, a) in changes.iter().enumerate() {
        for b in &changes[i + 1..] {
            if let Some(e) = overlap_conflict(a, b) {
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Group changes by file, preserving first-seen file order.
pub fn group_by_file(changes: &[Change]) -> Vec<(PathBuf, Vec<&Change>)> {
    let mut order: Vec<PathBuf> = Vec::new();
    let mut groups: std::collections::HashMap<PathBuf, Vec<&Change>> = std::collections::HashMap::new();
    for c in changes {
        groups.entry(c.file.clone()).or_insert_with(|| {
            order.push(c.file.clone());
            Vec::new()
        });
        groups.get_mut(&c.file).unwrap().push(c);
    }
    order.into_iter().map(|f| { let v = groups.remove(&f).unwrap_or_default(); (f, v) }).collect()
}

/// Apply a set of non-overlapping changes (all against the same file) to
/// `content`, by sorting descending on `start` and replacing sequentially.
pub fn apply_to_text(content: &str, changes: &[&Change]) -> Result<String> {
    check_non_overlapping_refs(changes)?;
    let mut sorted: Vec<&&Change> = changes.iter().collect();
    sorted.sort_by(|a, b| b.start.cmp(&a.start));
    let mut out = content.to_string();
    for change in sorted {
        change.validate_against(content)?;
        out.replace_range(change.start..change.end, &change.new_text);
    }
    Ok(out)
}

/// Wraps `Path::to_path_buf`, kept so call sites read naturally as a map
/// key comparator helper.
pub(crate) fn to_path_buf(path: &Path) -> PathBuf {
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(start: usize, end: usize, old: &str, new: &str) -> Change {
        Change::new("a.go", start, end, old, new, "test").unwrap()
    }

    #[test]
    fn non_overlapping_passes() {
        let changes = vec![change(0, 3, "abc", "xyz"), change(3, 6, "def", "uvw")];
        assert!(check_non_overlapping(&changes).is_ok());
    }

    #[test]
    fn overlapping_fails() {
        let changes = vec![change(0, 4, "abcd", "x"), change(2, 6, "cdef", "y")];
        assert!(check_non_overlapping(&changes).is_err());
    }

    #[test]
    fn touching_boundary_is_not_overlap() {
        let changes = vec![change(0, 3, "abc", "x"), change(3, 3, "", "y")];
        assert!(check_non_overlapping(&changes).is_ok());
    }

    #[test]
    fn apply_descending_keeps_earlier_offsets_valid() {
        let content = "abcdef";
        let a = change(0, 1, "a", "AA");
        let b = change(4, 5, "e", "EE");
        let result = apply_to_text(content, &[&a, &b]).unwrap();
        assert_eq!(result, "AAbcdEEf");
    }

    #[test]
    fn old_text_mismatch_is_rejected() {
        let c = change(0, 1, "z", "x");
        assert!(c.validate_against("abc").is_err());
    }

    #[test]
    fn group_by_file_preserves_order() {
        let a = change(0, 1, "a", "x");
        let mut b = change(0, 1, "a", "y");
        b.file = "b.go".into();
        let groups = group_by_file(&[a.clone(), b.clone(), a]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, std::path::PathBuf::from("a.go"));
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn to_path_buf_round_trips() {
        assert_eq!(to_path_buf(Path::new("x")), PathBuf::from("x"));
    }
}
