//! End-to-end scenarios exercising each engine against literal source
//! strings built with `fixtures`, mirroring the walkthroughs used to
//! pin down this crate's byte-level contracts.

use go_refactor_core::change_signature::{self, ChangeSignatureInput, Parameter};
use go_refactor_core::extract_method::{self, ExtractMethodInput};
use go_refactor_core::fixtures;
use go_refactor_core::imports;
use go_refactor_core::operation::{Operation, OperationKind, OrganizeImportsInput};
use go_refactor_core::{RefactorError, Reference, Scope, Symbol};
use std::path::PathBuf;

struct FixedResolver {
    refs: Vec<Reference>,
}

impl go_refactor_core::resolver::SymbolResolver for FixedResolver {
    fn resolve_symbol(&self, _package: &str, _name: &str) -> go_refactor_core::error::Result<Symbol> {
        Err(RefactorError::InvalidOperation("not used by these tests".into()))
    }

    fn find_references(&self, _symbol: &Symbol, _scope: Scope) -> go_refactor_core::error::Result<Vec<Reference>> {
        Ok(self.refs.clone())
    }
}

fn resolver_at(file: &str, call_site: &str, needle: &str) -> FixedResolver {
    let position = call_site.find(needle).expect("needle present in source") + needle.len();
    FixedResolver { refs: vec![Reference { file: PathBuf::from(file), position }] }
}

#[test]
fn goroutine_wrapped_call_inserts_ctx_at_position_zero() {
    let source = "package main\n\nfunc (s *Server) Process(k int) {\n}\n\nfunc main() {\n\tk := 1\n\tgo func(k int) { s.Process(k) }(k)\n}\n";
    let workspace = fixtures::single_file_workspace("main.go", source, "main", None);
    let resolver = resolver_at("main.go", source, "s.");

    let input = ChangeSignatureInput {
        function_name: "Server.Process".into(),
        source_file: None,
        new_params: vec![
            Parameter { name: "ctx".into(), ty: "context.Context".into() },
            Parameter { name: "k".into(), ty: "int".into() },
        ],
        new_returns: Vec::new(),
        default_value: "context.TODO()".into(),
        new_param_position: 0,
        scope: Scope::Workspace,
    };

    let plan = change_signature::execute(&workspace, &input, &resolver).unwrap();

    let call_change = plan.changes.iter().find(|c| c.old_text == "s.Process(k)").expect("call-site edit present");
    assert_eq!(call_change.new_text, "s.Process(context.TODO(), k)");

    let decl_change = plan.changes.iter().find(|c| c.old_text == "(k int)").expect("declaration params edit present");
    assert_eq!(decl_change.new_text, "(ctx context.Context, k int)");
}

#[test]
fn closure_call_preserves_multiple_args_and_existing_returns() {
    let source = "package main\n\nfunc (s *Server) Process(k int, msg string) (string, error) {\n\treturn \"\", nil\n}\n\nfunc main() {\n\tk := 1\n\tgo func(k int) {\n\t\tresp, err := s.Process(k, \"hello\")\n\t\t_ = resp\n\t\t_ = err\n\t}(k)\n}\n";
    let workspace = fixtures::single_file_workspace("main.go", source, "main", None);
    let resolver = resolver_at("main.go", source, "s.");

    let input = ChangeSignatureInput {
        function_name: "Server.Process".into(),
        source_file: None,
        new_params: vec![
            Parameter { name: "ctx".into(), ty: "context.Context".into() },
            Parameter { name: "k".into(), ty: "int".into() },
            Parameter { name: "msg".into(), ty: "string".into() },
        ],
        new_returns: vec!["string".into(), "error".into()],
        default_value: "context.TODO()".into(),
        new_param_position: 0,
        scope: Scope::Workspace,
    };

    let plan = change_signature::execute(&workspace, &input, &resolver).unwrap();

    let call_change = plan.changes.iter().find(|c| c.old_text == "s.Process(k, \"hello\")").expect("call-site edit present");
    assert_eq!(call_change.new_text, "s.Process(context.TODO(), k, \"hello\")");

    let returns_change = plan.changes.iter().find(|c| c.old_text == "(string, error)");
    assert!(returns_change.is_none() || returns_change.unwrap().new_text == "(string, error)");
}

#[test]
fn function_literal_argument_is_preserved_byte_for_byte() {
    let source = "package main\n\nfunc (s *Server) Execute(name string, cond func(x int) bool) {\n}\n\nfunc main() {\n\ts.Execute(\"test\", func(x int) bool { return x > 0 })\n}\n";
    let workspace = fixtures::single_file_workspace("main.go", source, "main", None);
    let resolver = resolver_at("main.go", source, "s.");

    let input = ChangeSignatureInput {
        function_name: "Server.Execute".into(),
        source_file: None,
        new_params: vec![
            Parameter { name: "ctx".into(), ty: "context.Context".into() },
            Parameter { name: "name".into(), ty: "string".into() },
            Parameter { name: "cond".into(), ty: "func(x int) bool".into() },
        ],
        new_returns: Vec::new(),
        default_value: "context.TODO()".into(),
        new_param_position: 0,
        scope: Scope::Workspace,
    };

    let plan = change_signature::execute(&workspace, &input, &resolver).unwrap();

    let call_change = plan
        .changes
        .iter()
        .find(|c| c.old_text.starts_with("s.Execute("))
        .expect("call-site edit present");
    assert!(call_change.new_text.contains("func(x int) bool { return x > 0 }"), "literal body must survive byte for byte: {}", call_change.new_text);
    assert!(call_change.new_text.starts_with("s.Execute(context.TODO(), "));
}

#[test]
fn interface_method_preserves_existing_return_when_none_requested() {
    let source = "package main\n\ntype save interface {\n\tSaveTile(key *string, data []byte) error\n}\n";
    let workspace = fixtures::single_file_workspace("main.go", source, "main", None);
    let resolver = FixedResolver { refs: Vec::new() };

    let input = ChangeSignatureInput {
        function_name: "save.SaveTile".into(),
        source_file: None,
        new_params: vec![
            Parameter { name: "key".into(), ty: "*string".into() },
            Parameter { name: "data".into(), ty: "[]byte".into() },
            Parameter { name: "ttl".into(), ty: "int".into() },
        ],
        new_returns: Vec::new(),
        default_value: "0".into(),
        new_param_position: 2,
        scope: Scope::Workspace,
    };

    let plan = change_signature::execute(&workspace, &input, &resolver).unwrap();

    let returns_change = plan.changes.iter().find(|c| c.old_text == "error").expect("return-list edit present even when unchanged");
    assert_eq!(returns_change.new_text, "error", "preserved return must still read `error`, never interface{}");
    assert!(!returns_change.new_text.contains("interface{}"));

    let params_change = plan.changes.iter().find(|c| c.old_text == "(key *string, data []byte)").expect("params edit present");
    assert_eq!(params_change.new_text, "(key *string, data []byte, ttl int)");
}

#[test]
fn organize_imports_orders_stdlib_external_workspace_module() {
    let source = "package foo\n\nimport (\n\t\"fmt\"\n\t\"github.com/mamaar/gorefactor/pkg/types\"\n\t\"github.com/stretchr/testify/assert\"\n\t\"github.com/mamaar/othermod/pkg/foo\"\n)\n\nfunc main() {}\n";
    let workspace = fixtures::single_file_workspace(
        "main.go",
        source,
        "github.com/mamaar/gorefactor",
        Some("github.com/mamaar/gorefactor"),
    );
    let mut workspace = workspace;
    workspace.workspace_modules.push("github.com/mamaar/othermod".to_string());

    let op = OperationKind::OrganizeImports(OrganizeImportsInput { source_file: PathBuf::from("main.go") });
    let resolver = FixedResolver { refs: Vec::new() };
    let plan = op.execute(&workspace, &resolver).unwrap();

    assert_eq!(plan.changes.len(), 1);
    let rendered = &plan.changes[0].new_text;
    let stdlib_idx = rendered.find("\"fmt\"").unwrap();
    let external_idx = rendered.find("\"github.com/stretchr/testify/assert\"").unwrap();
    let workspace_idx = rendered.find("\"github.com/mamaar/othermod/pkg/foo\"").unwrap();
    let module_idx = rendered.find("\"github.com/mamaar/gorefactor/pkg/types\"").unwrap();
    assert!(stdlib_idx < external_idx);
    assert!(external_idx < workspace_idx);
    assert!(workspace_idx < module_idx);

    // Direct call into the classifier-level function agrees with the
    // operation-driver path; both share one implementation.
    let via_function = imports::organize_imports(source, workspace.module_path.as_deref(), &workspace.workspace_modules);
    assert!(via_function.find("\"fmt\"").unwrap() < via_function.find("\"github.com/mamaar/gorefactor/pkg/types\"").unwrap());
}

#[test]
fn extract_method_infers_params_and_returns_without_interface_placeholder() {
    let source = "package main\n\nfunc (a *Accumulator) Sum(items []int, count int, seen map[string]bool, exists bool) int {\n\ttotal := 0\n\tfor i := range items {\n\t\tn := items[i]\n\t\ttotal += n\n\t\tseen[\"x\"] = exists\n\t\t_ = count\n\t}\n\treturn total\n}\n";
    let workspace = fixtures::single_file_workspace("main.go", source, "main", None);

    let input = ExtractMethodInput {
        source_file: PathBuf::from("main.go"),
        start_line: 4,
        end_line: 9,
        new_method_name: "accumulate".into(),
        target_struct: "Accumulator".into(),
    };

    let plan = extract_method::execute(&workspace, &input).unwrap();

    let extracted = &plan.changes[0];
    assert!(extracted.old_text.contains("total += n"));
    assert!(extracted.old_text.contains("seen[\"x\"] = exists"));

    let appended = &plan.changes[1];
    assert!(appended.new_text.contains("func (a *Accumulator) accumulate"), "{}", appended.new_text);
    assert!(appended.new_text.contains("count int"), "count must be inferred as an int parameter: {}", appended.new_text);
    assert!(appended.new_text.contains("seen map[string]bool"), "the map must remain a parameter: {}", appended.new_text);
    assert!(appended.new_text.contains(") int {"), "must return a bare int, not a tuple: {}", appended.new_text);
    assert!(!appended.new_text.contains("interface{}"), "extracted signature must never fall back to interface{{}}: {}", appended.new_text);

    assert!(extracted.new_text.starts_with("total = a.accumulate("), "{}", extracted.new_text);
}
