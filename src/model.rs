//! Read-only workspace data model.
//!
//! Everything here is produced by the (external) workspace loader and is
//! immutable for the lifetime of an operation's `Execute` call. Edits are
//! accumulated separately, in [`crate::edit::Change`], and applied only
//! by [`crate::serializer`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::ast;

/// A single source file: its original bytes, parsed AST, and a
/// back-reference to the owning package's path.
///
/// `original_content` is the authoritative source of truth for byte
/// ranges; AST positions are plain offsets into it (see
/// [`crate::fileset::FileSet`]).
#[derive(Debug, Clone)]
pub struct File {
    /// Filesystem path of this file, relative to the workspace root.
    pub path: PathBuf,
    /// Parsed syntax tree.
    pub ast: ast::File,
    /// Original source bytes. The single source of truth for byte ranges.
    pub original_content: String,
    /// Path of the owning package, for lookup in `Workspace::packages`.
    pub package_path: String,
}

/// A package: a directory of files sharing one import path, plus the
/// symbols declared within it.
///
/// Test files are indexed separately from production files so resolvers
/// can prefer a production declaration when the same name appears in both.
#[derive(Debug, Clone, Default)]
pub struct Package {
    /// Import path identifying this package (e.g. `github.com/acme/app/pkg/foo`).
    pub path: String,
    /// Package's declared name (may differ from the last path segment).
    pub name: String,
    /// Directory on disk containing this package's files.
    pub dir: PathBuf,
    /// Production source files, keyed by filename.
    pub files: BTreeMap<String, File>,
    /// `_test` source files, keyed by filename.
    pub test_files: BTreeMap<String, File>,
    /// Symbols declared anywhere in this package.
    pub symbols: Vec<Symbol>,
}

impl Package {
    /// Iterate production files followed by test files: the order every
    /// engine in this crate uses when scanning for a declaration, so that
    /// a non-test match is always found first.
    pub fn all_files(&self) -> impl Iterator<Item = (&String, &File)> {
        self.files.iter().chain(self.test_files.iter())
    }
}

/// The whole workspace: root directory, the shared `FileSet`-equivalent
/// position space, and every package keyed by import path.
///
/// Single-owner and immutable during operation execution.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    /// Root directory of the workspace on disk.
    pub root_path: PathBuf,
    /// Every package in the workspace, keyed by import path.
    pub packages: BTreeMap<String, Package>,
    /// This workspace's own module path (used by the import classifier),
    /// if one has been configured.
    pub module_path: Option<String>,
    /// Import paths of sibling modules in a multi-module workspace.
    pub workspace_modules: Vec<String>,
}

impl Workspace {
    /// Look up a file by package path and filename.
    pub fn file(&self, package_path: &str, filename: &str) -> Option<&File> {
        let pkg = self.packages.get(package_path)?;
        pkg.files.get(filename).or_else(|| pkg.test_files.get(filename))
    }

    /// Find the first file (production files before test files, across
    /// packages in `BTreeMap` iteration order) whose path matches
    /// `source_file`.
    pub fn file_by_path(&self, source_file: &std::path::Path) -> Option<(&Package, &File)> {
        for pkg in self.packages.values() {
            for (_, f) in pkg.all_files() {
                if f.path == source_file {
                    return Some((pkg, f));
                }
            }
        }
        None
    }
}

/// The kind of entity a [`Symbol`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// A free-standing function.
    Function,
    /// A method with a receiver.
    Method,
    /// A defined (non-interface) type.
    Type,
    /// An interface type.
    Interface,
    /// A package-level or local variable.
    Variable,
    /// A constant.
    Constant,
}

/// A named, located declaration.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Bare name, or `Type.Method` for methods.
    pub name: String,
    /// What kind of entity this is.
    pub kind: SymbolKind,
    /// Import path of the owning package.
    pub package: String,
    /// File the symbol is declared in.
    pub file: PathBuf,
    /// Byte offset of the start of the declaration (or, for a method
    /// lookup, the position of its defining identifier).
    pub position: usize,
    /// Byte offset one past the end of the declaration.
    pub end: usize,
    /// 0-based line of `position`.
    pub line: u32,
    /// 0-based column of `position`.
    pub column: u32,
    /// Whether the symbol's name starts with an uppercase letter.
    pub exported: bool,
}

/// A single use-site of a [`Symbol`]: the byte position of the identifier
/// at the use site, not the enclosing expression.
#[derive(Debug, Clone)]
pub struct Reference {
    /// File the reference occurs in.
    pub file: PathBuf,
    /// Byte offset of the referencing identifier.
    pub position: usize,
}

/// Whether references are considered only within the defining package or
/// across the whole workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only references within the symbol's own package.
    Package,
    /// References anywhere in the workspace.
    Workspace,
}
