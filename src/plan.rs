//! The output of an operation: an ordered set of edits plus an impact
//! summary.

use std::path::PathBuf;

use crate::config::RefactoringConfig;
use crate::edit::Change;
use crate::error::{RefactorError, Result};

/// How severe an [`Issue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Purely informational; no action required.
    Info,
    /// Worth a human's attention, but not necessarily wrong.
    Warning,
    /// Very likely to break compilation or behavior.
    Error,
}

/// The kind of concern an [`Issue`] raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// The change may alter the visibility contract of exported code.
    VisibilityError,
    /// The change may not type-check (the formatter is the real
    /// validator; this is a heuristic early warning).
    TypeMismatch,
    /// The change is very likely to fail to compile.
    CompilationError,
}

/// A single impact-analysis finding attached to a [`RefactoringPlan`].
#[derive(Debug, Clone)]
pub struct Issue {
    /// What kind of concern this is.
    pub kind: IssueKind,
    /// How severe it is.
    pub severity: Severity,
    /// Human-readable explanation.
    pub description: String,
}

/// Aggregate impact analysis for a plan.
#[derive(Debug, Clone, Default)]
pub struct Impact {
    /// Issues surfaced while computing the plan.
    pub potential_issues: Vec<Issue>,
}

/// The result of an operation's `Execute`: every edit to apply, the files
/// and packages they touch, and an impact summary.
#[derive(Debug, Clone, Default)]
pub struct RefactoringPlan {
    /// Every edit to apply, across every affected file.
    pub changes: Vec<Change>,
    /// Files touched by `changes`, deduplicated, first-seen order.
    pub affected_files: Vec<PathBuf>,
    /// Packages touched by `changes`, deduplicated, first-seen order.
    pub affected_packages: Vec<String>,
    /// Impact analysis.
    pub impact: Impact,
    /// Whether the operation can be cleanly undone via a single backup
    /// snapshot. Undo beyond one level is out of scope, but an operation
    /// can still mark itself as not reversible at all, e.g. `MoveCode`
    /// writes two files non-atomically.
    pub reversible: bool,
}

impl RefactoringPlan {
    /// Build a plan from a list of changes plus package membership,
    /// deriving `affected_files`/`affected_packages` by first appearance.
    pub fn new(changes: Vec<Change>, affected_packages: Vec<String>) -> Self {
        let mut affected_files = Vec::new();
        for c in &changes {
            if !affected_files.contains(&c.file) {
                affected_files.push(c.file.clone());
            }
        }
        Self { changes, affected_files, affected_packages, impact: Impact::default(), reversible: true }
    }

    /// Add an impact issue.
    pub fn warn(&mut self, kind: IssueKind, description: impl Into<String>) {
        self.impact.potential_issues.push(Issue { kind, severity: Severity::Warning, description: description.into() });
    }

    /// Add an informational impact issue.
    pub fn info(&mut self, kind: IssueKind, description: impl Into<String>) {
        self.impact.potential_issues.push(Issue { kind, severity: Severity::Info, description: description.into() });
    }

    /// Reject this plan if it touches more files than `config` allows.
    pub fn check_file_limit(&self, config: &RefactoringConfig) -> Result<()> {
        if config.exceeds_file_limit(self.affected_files.len()) {
            return Err(RefactorError::InvalidOperation(format!(
                "operation exceeds maximum file limit: {} files touched, {} allowed",
                self.affected_files.len(),
                config.max_files_per_operation
            )));
        }
        Ok(())
    }
}
