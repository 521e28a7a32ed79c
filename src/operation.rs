//! Operation driver (component H).
//!
//! The four operation kinds share one capability set (`Type`, `Validate`,
//! `Execute`, `Description`), modeled here as a sum type dispatched by a
//! thin driver rather than a runtime-typed inheritance tree: a single
//! validate-then-execute entry point generalized across all four kinds.

use crate::change_signature::{self, ChangeSignatureInput};
use crate::error::{RefactorError, Result};
use crate::extract_method::{self, ExtractMethodInput};
use crate::imports;
use crate::model::Workspace;
use crate::plan::RefactoringPlan;
use crate::resolver::SymbolResolver;
use crate::safe_delete::{self, SafeDeleteInput};
use std::path::PathBuf;

/// What kind of refactoring a [`Operation`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Component E.
    ChangeSignature,
    /// Component F.
    SafeDelete,
    /// Component G.
    ExtractMethod,
    /// Component B, driven as an operation.
    OrganizeImports,
}

/// Input to an Import-Organizer operation: the single file whose imports
/// should be reclassified and regrouped.
#[derive(Debug, Clone)]
pub struct OrganizeImportsInput {
    /// File to organize.
    pub source_file: PathBuf,
}

/// One of the four refactorings this crate can plan, carrying its own
/// input: a sum type, not an inheritance tree.
#[derive(Debug, Clone)]
pub enum OperationKind {
    /// Rewrite a declaration and its call sites.
    ChangeSignature(ChangeSignatureInput),
    /// Remove an unreferenced declaration.
    SafeDelete(SafeDeleteInput),
    /// Promote a statement range into a new method.
    ExtractMethod(ExtractMethodInput),
    /// Reclassify and regroup a file's imports.
    OrganizeImports(OrganizeImportsInput),
}

/// The shared lifecycle every operation exposes: `Type`, `Validate`,
/// `Execute`, `Description`.
pub trait Operation {
    /// Which kind of refactoring this is.
    fn operation_type(&self) -> OperationType;

    /// Inspect inputs without touching the workspace. A total function:
    /// never panics, never mutates state.
    fn validate(&self, workspace: &Workspace) -> Result<()>;

    /// Compute the refactoring plan. Idempotent: executing twice against
    /// the same workspace yields equal plans.
    fn execute(&self, workspace: &Workspace, resolver: &dyn SymbolResolver) -> Result<RefactoringPlan>;

    /// A short human-readable description of what this operation will do.
    fn description(&self) -> String;
}

impl Operation for OperationKind {
    fn operation_type(&self) -> OperationType {
        match self {
            OperationKind::ChangeSignature(_) => OperationType::ChangeSignature,
            OperationKind::SafeDelete(_) => OperationType::SafeDelete,
            OperationKind::ExtractMethod(_) => OperationType::ExtractMethod,
            OperationKind::OrganizeImports(_) => OperationType::OrganizeImports,
        }
    }

    fn validate(&self, workspace: &Workspace) -> Result<()> {
        match self {
            OperationKind::ChangeSignature(input) => change_signature::validate(input),
            OperationKind::SafeDelete(input) => safe_delete::validate(input),
            OperationKind::ExtractMethod(input) => extract_method::validate(input),
            OperationKind::OrganizeImports(input) => {
                if workspace.file_by_path(&input.source_file).is_none() {
                    return Err(RefactorError::InvalidOperation(format!("no such file: {}", input.source_file.display())));
                }
                Ok(())
            }
        }
    }

    fn execute(&self, workspace: &Workspace, resolver: &dyn SymbolResolver) -> Result<RefactoringPlan> {
        self.validate(workspace)?;
        match self {
            OperationKind::ChangeSignature(input) => change_signature::execute(workspace, input, resolver),
            OperationKind::SafeDelete(input) => safe_delete::execute(workspace, input, resolver),
            OperationKind::ExtractMethod(input) => extract_method::execute(workspace, input),
            OperationKind::OrganizeImports(input) => execute_organize_imports(workspace, input),
        }
    }

    fn description(&self) -> String {
        match self {
            OperationKind::ChangeSignature(input) => format!("change signature of {}", input.function_name),
            OperationKind::SafeDelete(input) => format!("delete {}", input.symbol.name),
            OperationKind::ExtractMethod(input) => format!("extract {} from {}", input.new_method_name, input.target_struct),
            OperationKind::OrganizeImports(input) => format!("organize imports in {}", input.source_file.display()),
        }
    }
}

fn execute_organize_imports(workspace: &Workspace, input: &OrganizeImportsInput) -> Result<RefactoringPlan> {
    let (pkg, file) = workspace
        .file_by_path(&input.source_file)
        .ok_or_else(|| RefactorError::InvalidOperation(format!("no such file: {}", input.source_file.display())))?;

    let edit = imports::organize_imports_edit(&file.original_content, workspace.module_path.as_deref(), &workspace.workspace_modules);

    let changes = match edit {
        Some((start, end, rendered)) if file.original_content[start..end] != rendered.as_str() => {
            vec![crate::edit::Change::new(
                file.path.clone(),
                start,
                end,
                file.original_content[start..end].to_string(),
                rendered,
                "organize imports",
            )?]
        }
        _ => Vec::new(),
    };

    Ok(RefactoringPlan::new(changes, vec![pkg.path.clone()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast;
    use crate::model::{File, Package};
    use crate::resolver::SymbolResolver;
    use crate::{Reference, Scope, Symbol};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    struct StubResolver;
    impl SymbolResolver for StubResolver {
        fn resolve_symbol(&self, _package: &str, _name: &str) -> Result<Symbol> {
            Err(RefactorError::InvalidOperation("not used".into()))
        }
        fn find_references(&self, _symbol: &Symbol, _scope: Scope) -> Result<Vec<Reference>> {
            Ok(Vec::new())
        }
    }

    fn workspace_with_file(path: &str, content: &str) -> Workspace {
        let file = File {
            path: PathBuf::from(path),
            ast: ast::File { package_name: "main".into(), imports: Vec::new(), decls: Vec::new() },
            original_content: content.to_string(),
            package_path: "main".into(),
        };
        let mut files = BTreeMap::new();
        files.insert(path.to_string(), file);
        let mut packages = BTreeMap::new();
        packages.insert("main".to_string(), Package { path: "main".into(), name: "main".into(), dir: PathBuf::new(), files, test_files: BTreeMap::new(), symbols: Vec::new() });
        Workspace { root_path: PathBuf::new(), packages, module_path: None, workspace_modules: Vec::new() }
    }

    #[test]
    fn organize_imports_validate_rejects_unknown_file() {
        let workspace = workspace_with_file("a.go", "package main\n");
        let op = OperationKind::OrganizeImports(OrganizeImportsInput { source_file: "missing.go".into() });
        assert!(op.validate(&workspace).is_err());
    }

    #[test]
    fn organize_imports_execute_is_noop_without_imports() {
        let workspace = workspace_with_file("a.go", "package main\n\nfunc main() {}\n");
        let op = OperationKind::OrganizeImports(OrganizeImportsInput { source_file: "a.go".into() });
        let plan = op.execute(&workspace, &StubResolver).unwrap();
        assert!(plan.changes.is_empty());
    }

    #[test]
    fn organize_imports_execute_emits_minimal_range_change() {
        let content = "package main\n\nimport (\n\t\"os\"\n\t\"fmt\"\n)\n\nfunc main() {}\n";
        let workspace = workspace_with_file("a.go", content);
        let op = OperationKind::OrganizeImports(OrganizeImportsInput { source_file: "a.go".into() });
        let plan = op.execute(&workspace, &StubResolver).unwrap();
        assert_eq!(plan.changes.len(), 1);
        let change = &plan.changes[0];
        assert!(change.old_text.contains("\"os\""));
        assert!(change.new_text.find("\"fmt\"").unwrap() < change.new_text.find("\"os\"").unwrap());
    }

    #[test]
    fn description_mentions_operation_target() {
        let op = OperationKind::OrganizeImports(OrganizeImportsInput { source_file: "a.go".into() });
        assert_eq!(op.description(), "organize imports in a.go");
        assert_eq!(op.operation_type(), OperationType::OrganizeImports);
    }
}
