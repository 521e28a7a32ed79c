//! A source-level refactoring-plan engine for a statically typed,
//! package-based target language.
//!
//! The crate accepts a parsed [`model::Workspace`] (packages of
//! [`model::File`]s carrying an [`ast::File`], the original source bytes,
//! and a symbol table) and produces a [`plan::RefactoringPlan`]: an
//! ordered set of byte-range [`edit::Change`]s that, once applied by the
//! [`serializer`] and reformatted, yield a semantically equivalent program
//! modulo the requested refactoring.
//!
//! ## Operations
//!
//! - [`change_signature`]: rewrite a function/method declaration and all
//!   its call sites to add, remove, or reorder parameters and returns.
//! - [`safe_delete`]: remove a declaration after verifying it is unused.
//! - [`extract_method`]: promote a statement range into a new method.
//! - [`imports`]: reclassify and regroup import declarations.
//!
//! These are coordinated by [`operation`], which exposes the shared
//! `Validate` → `Execute` → `RefactoringPlan` lifecycle, and applied to
//! disk by [`serializer`].
//!
//! ## What this crate does not do
//!
//! Parsing, symbol resolution, module-manifest discovery, and
//! pretty-printing are external collaborators, referenced here only
//! through the trait boundary in [`resolver`]. This crate never type-checks
//! its output; the external formatter is the only validator.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(
    clippy::too_many_lines,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::collapsible_if,
    clippy::needless_range_loop
)]

/// Minimal Go-shaped abstract syntax tree consumed by the engines.
pub mod ast;
/// Change-Signature engine: rewrite declarations and call sites.
pub mod change_signature;
/// Ambient configuration: file-count limits and backup retention policy.
pub mod config;
/// Byte-range edit model and overlap validation.
pub mod edit;
/// Error taxonomy shared by every operation.
pub mod error;
/// Extract-Method engine: promote a statement range into a new method.
pub mod extract_method;
/// Per-file byte-offset to line/column resolution.
pub mod fileset;
/// Lightweight Go-subset source builder used to construct test fixtures.
pub mod fixtures;
/// Import classifier & renderer.
pub mod imports;
/// Read-only workspace data model (files, packages, symbols, references).
pub mod model;
/// Operation driver: the shared `Validate` / `Execute` lifecycle.
pub mod operation;
/// Refactoring-plan output type and impact reporting.
pub mod plan;
/// External-collaborator trait boundary (parser, resolver, formatter, sink).
pub mod resolver;
/// Safe-Delete engine: remove an unreferenced declaration.
pub mod safe_delete;
/// Applies a plan's edits to disk: preview, apply, backup, restore, diff.
pub mod serializer;
/// Workspace-module manifest discovery.
pub mod workspace_modules;

pub use config::RefactoringConfig;
pub use edit::Change;
pub use error::RefactorError;
pub use model::{File, Package, Reference, Scope, Symbol, SymbolKind, Workspace};
pub use operation::{Operation, OperationKind, OperationType, OrganizeImportsInput};
pub use plan::{Issue, IssueKind, RefactoringPlan, Severity};
