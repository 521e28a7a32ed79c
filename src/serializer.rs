//! Serializer (component D).
//!
//! The only part of this crate allowed to mutate files on disk. Applies a
//! plan's changes grouped by file, reorganizes imports, hands the result
//! to the external pretty-printer, and writes atomically. Per-file backup
//! bookkeeping is a separate, explicit step (`backup_file`/
//! `restore_from_backup`/`cleanup_old_backups`) rather than an implicit
//! part of `apply_changes`, so a caller can choose its own backup/retention
//! policy via `RefactoringConfig`.

use std::path::{Path, PathBuf};

use crate::config::{self, RefactoringConfig};
use crate::edit::{self, Change};
use crate::error::{RefactorError, Result};
use crate::imports;
use crate::model::Workspace;
use crate::resolver::{DiagnosticSink, Formatter};

fn current_content(workspace: &Workspace, path: &Path) -> Result<String> {
    if let Some((_, file)) = workspace.file_by_path(path) {
        return Ok(file.original_content.clone());
    }
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(RefactorError::io(path, e)),
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension().map(|e| e == "go").unwrap_or(false)
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| RefactorError::io(path, e))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| RefactorError::io(parent, e))?;
            set_permissions(parent, 0o755)?;
        }
    }
    std::fs::write(path, bytes).map_err(|e| RefactorError::io(path, e))?;
    set_permissions(path, 0o644)?;
    Ok(())
}

/// Apply every change in `changes`, grouped by file, to disk.
///
/// For files recognized as target-language source, imports are reorganized
/// before formatting. A formatter failure is downgraded to a
/// [`DiagnosticSink::warn`] call rather than aborting: the pre-format text
/// is still written, on the principle that a human-readable diff beats an
/// unwritten change.
pub fn apply_changes(workspace: &Workspace, changes: &[Change], formatter: &dyn Formatter, sink: &dyn DiagnosticSink) -> Result<Vec<PathBuf>> {
    let groups = edit::group_by_file(changes);
    let mut written = Vec::with_capacity(groups.len());

    for (path, file_changes) in groups {
        let current = current_content(workspace, &path)?;
        let applied = edit::apply_to_text(&current, &file_changes)?;

        let organized = if is_source_file(&path) && workspace.module_path.is_some() {
            imports::organize_imports(&applied, workspace.module_path.as_deref(), &workspace.workspace_modules)
        } else {
            applied
        };

        let final_bytes = match formatter.format(organized.as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => {
                sink.warn(&format!("formatter failed for {}: {} (writing unformatted content)", path.display(), e));
                organized.into_bytes()
            }
        };

        write_atomically(&path, &final_bytes)?;
        written.push(path);
    }

    Ok(written)
}

fn collapse_and_truncate(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > 80 {
        let head: String = collapsed.chars().take(77).collect();
        format!("{}...", head)
    } else {
        collapsed
    }
}

/// Deterministic textual rendering of every change in `changes`.
pub fn preview_changes(changes: &[Change]) -> String {
    let mut groups = edit::group_by_file(changes);
    groups.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = format!("Preview of {} changes across {} files:\n\n", changes.len(), groups.len());
    for (path, mut file_changes) in groups {
        file_changes.sort_by_key(|c| c.start);
        let display_path = path.display().to_string();
        out.push_str(&format!("File: {}\n", display_path));
        out.push_str(&"-".repeat(display_path.len() + 6));
        out.push('\n');
        for (i, change) in file_changes.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, change.description));
            out.push_str(&format!("   Position: {}-{}\n", change.start, change.end));
            out.push_str(&format!("   - {}\n", collapse_and_truncate(&change.old_text)));
            out.push_str(&format!("   + {}\n", collapse_and_truncate(&change.new_text)));
            out.push('\n');
        }
    }
    out
}

fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

/// Snapshot `path`'s current bytes into `<path>.backup`. A missing
/// original yields a zero-byte backup, the sentinel for "this file did
/// not exist before the operation".
pub fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup_path = backup_path_for(path);
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(RefactorError::io(path, e)),
    };
    write_atomically(&backup_path, &bytes)?;
    Ok(backup_path)
}

/// Restore `path` from a snapshot produced by [`backup_file`]. A
/// zero-byte backup removes `path` instead of overwriting it with empty
/// content.
pub fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<()> {
    let bytes = std::fs::read(backup_path).map_err(|e| RefactorError::io(backup_path, e))?;
    if bytes.is_empty() {
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| RefactorError::io(path, e))?;
        }
        return Ok(());
    }
    write_atomically(path, &bytes)
}

/// Reclaim `.backup` files under `dir` (non-recursive) according to
/// `config`'s retention policy: files older than `backup_max_age_seconds`
/// are removed outright, then the newest `max_backup_retention` survivors
/// are kept and any excess (oldest first) is removed. Either limit being
/// `0` disables that half of the policy. Returns the paths removed.
pub fn cleanup_old_backups(dir: &Path, config: &RefactoringConfig) -> Result<Vec<PathBuf>> {
    let mut backups = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(RefactorError::io(dir, e)),
    };
    for entry in entries {
        let entry = entry.map_err(|e| RefactorError::io(dir, e))?;
        let path = entry.path();
        if path.extension().map(|e| e == "backup").unwrap_or(false) {
            let modified = entry.metadata().map_err(|e| RefactorError::io(&path, e))?.modified().map_err(|e| RefactorError::io(&path, e))?;
            backups.push((path, modified));
        }
    }

    let mut removed = Vec::new();
    if config.backup_max_age_seconds != 0 {
        backups.retain(|(path, modified)| {
            if config.backup_is_expired(config::age_since(*modified)) {
                removed.push(path.clone());
                false
            } else {
                true
            }
        });
    }

    if config.max_backup_retention != 0 && backups.len() > config.max_backup_retention {
        backups.sort_by_key(|(_, modified)| *modified);
        let excess = backups.len() - config.max_backup_retention;
        removed.extend(backups.drain(..excess).map(|(path, _)| path));
    }

    for path in &removed {
        std::fs::remove_file(path).map_err(|e| RefactorError::io(path, e))?;
    }
    Ok(removed)
}

/// A minimal, deterministic line-oriented diff between `old` and `new`.
/// Not required to be rigorous. Callers needing a real diff algorithm
/// should reach for one externally.
pub fn generate_diff(old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let max = old_lines.len().max(new_lines.len());
    let mut out = String::new();
    for i in 0..max {
        match (old_lines.get(i), new_lines.get(i)) {
            (Some(o), Some(n)) if o == n => {}
            (Some(o), Some(n)) => out.push_str(&format!("-{}\n+{}\n", o, n)),
            (Some(o), None) => out.push_str(&format!("-{}\n", o)),
            (None, Some(n)) => out.push_str(&format!("+{}\n", n)),
            (None, None) => {}
        }
    }
    out
}

/// Re-validate post-edit source via the external formatter: its error, if
/// any, is the `ParseError` surfaced to callers.
pub fn validate_file_structure(formatter: &dyn Formatter, source: &[u8]) -> Result<()> {
    formatter.format(source).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    struct PassthroughFormatter;
    impl Formatter for PassthroughFormatter {
        fn format(&self, source: &[u8]) -> Result<Vec<u8>> {
            Ok(source.to_vec())
        }
    }

    struct FailingFormatter;
    impl Formatter for FailingFormatter {
        fn format(&self, _source: &[u8]) -> Result<Vec<u8>> {
            Err(RefactorError::ParseError("broken".into()))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        warnings: RefCell<Vec<String>>,
    }
    impl DiagnosticSink for RecordingSink {
        fn warn(&self, message: &str) {
            self.warnings.borrow_mut().push(message.to_string());
        }
        fn info(&self, _message: &str) {}
    }

    #[test]
    fn apply_changes_writes_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.go");
        fs::write(&path, "package main\n").unwrap();

        let workspace = Workspace::default();
        let change = Change::new(&path, 8, 12, "main", "other", "rename package").unwrap();
        let written = apply_changes(&workspace, &[change], &PassthroughFormatter, &RecordingSink::default()).unwrap();

        assert_eq!(written, vec![path.clone()]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "package other\n");
    }

    #[test]
    fn apply_changes_downgrades_formatter_failure_to_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.go");
        fs::write(&path, "package main\n").unwrap();

        let workspace = Workspace::default();
        let change = Change::new(&path, 0, 0, "", "", "no-op").unwrap();
        let sink = RecordingSink::default();
        apply_changes(&workspace, &[change], &FailingFormatter, &sink).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "package main\n");
        assert_eq!(sink.warnings.borrow().len(), 1);
    }

    #[test]
    fn backup_and_restore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.go");
        fs::write(&path, "original\n").unwrap();

        let backup = backup_file(&path).unwrap();
        fs::write(&path, "mutated\n").unwrap();
        restore_from_backup(&path, &backup).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "original\n");
    }

    #[test]
    fn backup_of_missing_file_is_zero_byte_and_restore_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.go");

        let backup = backup_file(&path).unwrap();
        assert_eq!(fs::metadata(&backup).unwrap().len(), 0);

        fs::write(&path, "created later\n").unwrap();
        restore_from_backup(&path, &backup).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn preview_lists_each_change_with_position_and_diff() {
        let change = Change::new("a.go", 0, 4, "abcd", "wxyz", "swap").unwrap();
        let preview = preview_changes(&[change]);
        assert!(preview.starts_with("Preview of 1 changes across 1 files:\n\n"));
        assert!(preview.contains("File: a.go\n"));
        assert!(preview.contains("1. swap\n"));
        assert!(preview.contains("Position: 0-4\n"));
        assert!(preview.contains("   - abcd\n"));
        assert!(preview.contains("   + wxyz\n"));
    }

    #[test]
    fn diff_reports_added_removed_and_changed_lines() {
        let diff = generate_diff("a\nb\nc\n", "a\nx\nc\nd\n");
        assert!(diff.contains("-b"));
        assert!(diff.contains("+x"));
        assert!(diff.contains("+d"));
        assert!(!diff.contains("-a"));
    }

    #[test]
    fn cleanup_removes_excess_backups_beyond_retention_count() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("f{i}.go.backup")), "x").unwrap();
        }
        let config = RefactoringConfig { max_backup_retention: 2, backup_max_age_seconds: 0, ..RefactoringConfig::default() };
        let removed = cleanup_old_backups(dir.path(), &config).unwrap();
        assert_eq!(removed.len(), 3);
        let remaining: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(remaining.len(), 2);
    }

    #[test]
    fn cleanup_with_zero_limits_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("f.go.backup"), "x").unwrap();
        let config = RefactoringConfig { max_backup_retention: 0, backup_max_age_seconds: 0, ..RefactoringConfig::default() };
        let removed = cleanup_old_backups(dir.path(), &config).unwrap();
        assert!(removed.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn cleanup_of_missing_directory_returns_empty() {
        let config = RefactoringConfig::default();
        let removed = cleanup_old_backups(Path::new("/nonexistent/does/not/exist"), &config).unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn validate_file_structure_surfaces_parse_errors() {
        assert!(validate_file_structure(&PassthroughFormatter, b"ok").is_ok());
        assert!(validate_file_structure(&FailingFormatter, b"broken").is_err());
    }
}
