//! Test-only Go-subset source builder.
//!
//! Integration tests need [`crate::model::Workspace`] values built from
//! literal source strings, but the real parser is an external
//! collaborator this crate never implements. This module is the
//! stand-in: a small hand-rolled lexer and recursive-descent parser that
//! covers the statement/expression shapes the engines actually inspect
//! (calls, selectors, assignment, `go`/`defer`, `if`/`for`/`range`,
//! function literals, interface method sets) and degrades anything else
//! to the AST's own `Other` escape hatches. It is never exposed as, or
//! substituted for, a production parser.
//!
//! Fixtures are hand-assembled trees built from literal source strings
//! rather than a golden-file corpus.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::ast::{
    AssignStmt, Block, CallExpr, Decl, DeferStmt, Expr, Field, File as AstFile, ForStmt, FuncDecl, FuncLit, GoStmt, Ident, IfStmt, ImportSpec,
    InterfaceType, MethodSpec, RangeStmt, ReturnStmt, Stmt, TypeDecl, TypeSpec, parse_field_list,
};
use crate::model::{File, Package, Workspace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tok<'a> {
    text: &'a str,
    pos: usize,
    end: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn lex(source: &str) -> Vec<Tok<'_>> {
    let bytes = source.as_bytes();
    let mut toks = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '/' && bytes.get(i + 1) == Some(&b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if c == '"' || c == '`' {
            let quote = c;
            let start = i;
            i += 1;
            while i < bytes.len() && bytes[i] as char != quote {
                if quote == '"' && bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(bytes.len());
            toks.push(Tok { text: &source[start..i], pos: start, end: i });
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.') {
                i += 1;
            }
            toks.push(Tok { text: &source[start..i], pos: start, end: i });
            continue;
        }
        if is_ident_start(c) {
            let start = i;
            while i < bytes.len() && is_ident_continue(bytes[i] as char) {
                i += 1;
            }
            toks.push(Tok { text: &source[start..i], pos: start, end: i });
            continue;
        }
        const MULTI: &[&str] = &[":=", "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "*=", "/=", "++", "--"];
        let rest = &source[i..];
        if let Some(op) = MULTI.iter().find(|op| rest.starts_with(*op)) {
            toks.push(Tok { text: &source[i..i + op.len()], pos: i, end: i + op.len() });
            i += op.len();
            continue;
        }
        toks.push(Tok { text: &source[i..i + 1], pos: i, end: i + 1 });
        i += 1;
    }
    toks
}

struct Parser<'a> {
    source: &'a str,
    toks: Vec<Tok<'a>>,
    idx: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, toks: lex(source), idx: 0 }
    }

    fn peek(&self) -> Tok<'a> {
        self.toks.get(self.idx).copied().unwrap_or(Tok { text: "", pos: self.source.len(), end: self.source.len() })
    }

    fn peek_n(&self, n: usize) -> Tok<'a> {
        self.toks.get(self.idx + n).copied().unwrap_or(Tok { text: "", pos: self.source.len(), end: self.source.len() })
    }

    fn at_end(&self) -> bool {
        self.idx >= self.toks.len()
    }

    fn bump(&mut self) -> Tok<'a> {
        let t = self.peek();
        self.idx += 1;
        t
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.peek().text == text {
            self.idx += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, text: &str) {
        if !self.eat(text) {
            // Best-effort fixture parser: tolerate malformed input by not
            // consuming, letting the caller's loop make progress elsewhere.
        }
    }

    /// Index of the matching close bracket for the open bracket at `open_idx`.
    fn matching_close(&self, open_idx: usize, open: &str, close: &str) -> usize {
        let mut depth = 0i32;
        let mut j = open_idx;
        while j < self.toks.len() {
            if self.toks[j].text == open {
                depth += 1;
            } else if self.toks[j].text == close {
                depth -= 1;
                if depth == 0 {
                    return j;
                }
            }
            j += 1;
        }
        self.toks.len().saturating_sub(1)
    }

    /// Index of the next top-level (bracket-depth 0) occurrence of `text`,
    /// starting the scan at `self.idx`.
    fn find_top_level(&self, text: &str) -> Option<usize> {
        let mut depth = 0i32;
        let mut j = self.idx;
        while j < self.toks.len() {
            match self.toks[j].text {
                "(" | "[" => depth += 1,
                ")" | "]" => depth -= 1,
                t if t == text && depth == 0 => return Some(j),
                _ => {}
            }
            j += 1;
        }
        None
    }

    fn parse_field_group(&mut self, open: &str, close: &str) -> (Vec<Field>, (usize, usize)) {
        let start = self.peek().pos;
        let open_idx = self.idx;
        self.expect(open);
        let close_idx = self.matching_close(open_idx, open, close);
        let inner_start = self.peek().pos;
        let inner_end = self.toks.get(close_idx).map(|t| t.pos).unwrap_or(inner_start);
        let body = if inner_end >= inner_start { &self.source[inner_start..inner_end] } else { "" };
        self.idx = close_idx;
        let end = self.peek().end;
        self.expect(close);
        (parse_field_list(body), (start, end))
    }

    /// Optional result list following a parameter list: `(T1, T2)`, a bare
    /// bare type, or nothing if the next token opens the body/method end.
    fn parse_optional_results(&mut self, stop_tokens: &[&str]) -> (Vec<Field>, Option<(usize, usize)>) {
        if self.peek().text == "(" {
            let (fields, span) = self.parse_field_group("(", ")");
            (fields, Some(span))
        } else if stop_tokens.contains(&self.peek().text) || self.at_end() {
            (Vec::new(), None)
        } else {
            let start = self.peek().pos;
            let mut end = start;
            loop {
                if stop_tokens.contains(&self.peek().text) || self.at_end() {
                    break;
                }
                // A following `Ident (` starts the next method spec inside
                // an interface body; stop the bare-type scan there.
                if end != start && self.peek().text.chars().next().is_some_and(is_ident_start) && self.peek_n(1).text == "(" {
                    break;
                }
                end = self.peek().end;
                self.bump();
            }
            (parse_field_list(&self.source[start..end]), Some((start, end)))
        }
    }

    fn parse_block(&mut self) -> Block {
        let start = self.peek().pos;
        self.expect("{");
        let mut stmts = Vec::new();
        while self.peek().text != "}" && !self.at_end() {
            stmts.push(self.parse_stmt());
        }
        let end = self.peek().end;
        self.expect("}");
        Block { stmts, pos: start, end }
    }

    fn parse_stmt(&mut self) -> Stmt {
        match self.peek().text {
            "go" => {
                let pos = self.bump().pos;
                let expr = self.parse_expr();
                let call = into_call(expr);
                let end = call.end;
                Stmt::Go(GoStmt { call, pos, end })
            }
            "defer" => {
                let pos = self.bump().pos;
                let expr = self.parse_expr();
                let call = into_call(expr);
                let end = call.end;
                Stmt::Defer(DeferStmt { call, pos, end })
            }
            "return" => {
                let pos = self.bump().pos;
                let mut results = Vec::new();
                if self.peek().text != "}" {
                    results.push(self.parse_expr());
                    while self.eat(",") {
                        results.push(self.parse_expr());
                    }
                }
                let end = results.last().map(|e| e.end()).unwrap_or(pos);
                Stmt::Return(ReturnStmt { results, pos, end })
            }
            "if" => Stmt::If(self.parse_if()),
            "for" => self.parse_for(),
            "{" => Stmt::Block(self.parse_block()),
            _ => self.parse_simple_stmt(),
        }
    }

    fn parse_if(&mut self) -> IfStmt {
        let pos = self.bump().pos; // "if"
        let _cond = self.parse_expr();
        let then = self.parse_block();
        let mut end = then.end;
        let mut els = None;
        if self.peek().text == "else" {
            self.bump();
            if self.peek().text == "if" {
                let nested = self.parse_if();
                let nested_end = nested.end;
                let nested_pos = nested.pos;
                let block = Block { stmts: vec![Stmt::If(nested)], pos: nested_pos, end: nested_end };
                end = nested_end;
                els = Some(block);
            } else {
                let block = self.parse_block();
                end = block.end;
                els = Some(block);
            }
        }
        IfStmt { then, els, pos, end }
    }

    fn parse_for(&mut self) -> Stmt {
        let pos = self.bump().pos; // "for"
        let brace_idx = self.find_top_level("{").unwrap_or(self.toks.len());
        let has_range = self.toks[self.idx..brace_idx.min(self.toks.len())].iter().any(|t| t.text == "range");

        if !has_range {
            self.idx = brace_idx;
            let body = self.parse_block();
            let end = body.end;
            return Stmt::For(ForStmt { body, pos, end });
        }

        let mut key = None;
        let mut value = None;
        if self.peek().text != "range" {
            let first = self.parse_ident();
            if self.eat(",") {
                let second = self.parse_ident();
                key = if first.name != "_" { Some(first) } else { None };
                value = if second.name != "_" { Some(second) } else { None };
            } else {
                key = if first.name != "_" { Some(first) } else { None };
            }
            self.expect(":=");
        }
        self.expect("range");
        let x = self.parse_expr();
        let body = self.parse_block();
        let end = body.end;
        Stmt::Range(RangeStmt { key, value, x, body, pos, end })
    }

    fn parse_ident(&mut self) -> Ident {
        let t = self.bump();
        Ident { name: t.text.to_string(), pos: t.pos, end: t.end }
    }

    fn parse_simple_stmt(&mut self) -> Stmt {
        let start = self.peek().pos;
        if self.peek().text.is_empty() || self.peek().text == "}" {
            return Stmt::Other { pos: start, end: start };
        }
        let mut lhs = vec![self.parse_expr()];
        while self.eat(",") {
            lhs.push(self.parse_expr());
        }
        const ASSIGN_OPS: &[&str] = &[":=", "=", "+=", "-=", "*=", "/="];
        if ASSIGN_OPS.contains(&self.peek().text) {
            let op = self.bump().text.to_string();
            let mut rhs = vec![self.parse_expr()];
            while self.eat(",") {
                rhs.push(self.parse_expr());
            }
            let end = rhs.last().map(|e| e.end()).unwrap_or(start);
            return Stmt::Assign(AssignStmt { lhs, op, rhs, pos: start, end });
        }
        if lhs.len() == 1 {
            let expr = lhs.into_iter().next().unwrap();
            Stmt::Expr(expr)
        } else {
            let end = lhs.last().map(|e| e.end()).unwrap_or(start);
            Stmt::Other { pos: start, end }
        }
    }

    fn parse_expr(&mut self) -> Expr {
        let mut node = self.parse_primary();
        loop {
            match self.peek().text {
                "." => {
                    self.bump();
                    let sel = self.parse_ident();
                    let pos = node.pos();
                    let end = sel.end;
                    node = Expr::Selector(Box::new(crate::ast::SelectorExpr { x: node, sel, pos, end }));
                }
                "(" => {
                    let pos = node.pos();
                    let open_idx = self.idx;
                    self.bump();
                    let close_idx = self.matching_close(open_idx, "(", ")");
                    let mut args = Vec::new();
                    while self.idx < close_idx {
                        args.push(self.parse_expr());
                        if !self.eat(",") {
                            break;
                        }
                    }
                    self.idx = close_idx;
                    let end = self.peek().end;
                    self.expect(")");
                    node = Expr::Call(Box::new(CallExpr { fun: node, args, pos, end }));
                }
                "[" => {
                    let pos = node.pos();
                    let open_idx = self.idx;
                    let close_idx = self.matching_close(open_idx, "[", "]");
                    self.idx = close_idx;
                    let end = self.peek().end;
                    self.expect("]");
                    node = Expr::Other { pos, end };
                }
                _ => break,
            }
        }
        node
    }

    fn parse_primary(&mut self) -> Expr {
        let tok = self.peek();
        if tok.text == "func" {
            return Expr::FuncLit(Box::new(self.parse_func_lit()));
        }
        if tok.text == "(" {
            let pos = tok.pos;
            self.bump();
            let inner = self.parse_expr();
            let end = self.peek().end;
            self.expect(")");
            return Expr::Paren { inner: Box::new(inner), pos, end };
        }
        if tok.text.starts_with('"') || tok.text.starts_with('`') || tok.text.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            return Expr::BasicLit { value: tok.text.to_string(), pos: tok.pos, end: tok.end };
        }
        if tok.text.chars().next().is_some_and(is_ident_start) {
            self.bump();
            return Expr::Ident(Ident { name: tok.text.to_string(), pos: tok.pos, end: tok.end });
        }
        // Composite literal, unary/binary operator expression, or anything
        // else this grammar does not model: consume one token (or a
        // bracketed group) and degrade to an opaque span.
        if tok.text == "{" || tok.text == "[" {
            let open_idx = self.idx;
            let close = if tok.text == "{" { "}" } else { "]" };
            let close_idx = self.matching_close(open_idx, tok.text, close);
            self.idx = close_idx;
            let end = self.peek().end;
            self.expect(close);
            return Expr::Other { pos: tok.pos, end };
        }
        self.bump();
        Expr::Other { pos: tok.pos, end: tok.end }
    }

    fn parse_func_lit(&mut self) -> FuncLit {
        let pos = self.bump().pos; // "func"
        let (params, _) = self.parse_field_group("(", ")");
        let (results, _) = self.parse_optional_results(&["{"]);
        let body = self.parse_block();
        let end = body.end;
        FuncLit { params, results, body, pos, end }
    }

    fn parse_func_decl(&mut self) -> FuncDecl {
        let pos = self.bump().pos; // "func"
        let recv = if self.peek().text == "(" {
            let (fields, _) = self.parse_field_group("(", ")");
            fields.into_iter().next()
        } else {
            None
        };
        let name_tok = self.bump();
        let (params, params_span) = self.parse_field_group("(", ")");
        let (results, results_span) = self.parse_optional_results(&["{"]);
        let body = if self.peek().text == "{" { Some(self.parse_block()) } else { None };
        let end = body.as_ref().map(|b| b.end).unwrap_or_else(|| results_span.map(|s| s.1).unwrap_or(params_span.1));
        FuncDecl {
            name: name_tok.text.to_string(),
            recv,
            params,
            results,
            pos,
            name_pos: name_tok.pos,
            params_span,
            results_span,
            body,
            end,
        }
    }

    fn parse_method_spec(&mut self) -> MethodSpec {
        let name_tok = self.bump();
        let (params, params_span) = self.parse_field_group("(", ")");
        let (results, results_span) = self.parse_optional_results(&["}"]);
        let end = results_span.map(|s| s.1).unwrap_or(params_span.1);
        MethodSpec { name: name_tok.text.to_string(), params, results, name_pos: name_tok.pos, params_span, results_span, end }
    }

    fn parse_type_decl(&mut self) -> TypeDecl {
        let pos = self.bump().pos; // "type"
        let name_tok = self.bump();
        if self.peek().text == "interface" {
            self.bump();
            self.expect("{");
            let mut methods = Vec::new();
            while self.peek().text != "}" && !self.at_end() {
                methods.push(self.parse_method_spec());
            }
            let end = self.peek().end;
            self.expect("}");
            return TypeDecl { name: name_tok.text.to_string(), spec: TypeSpec::Interface(InterfaceType { methods }), pos, end };
        }
        if self.peek().text == "struct" {
            let struct_start = self.peek().pos;
            self.bump();
            let open_idx = self.idx;
            self.expect("{");
            let close_idx = self.matching_close(open_idx, "{", "}");
            self.idx = close_idx;
            let end = self.peek().end;
            self.expect("}");
            let raw = self.source[struct_start..end].to_string();
            return TypeDecl { name: name_tok.text.to_string(), spec: TypeSpec::Other(raw), pos, end };
        }
        let t = self.bump();
        TypeDecl { name: name_tok.text.to_string(), spec: TypeSpec::Other(t.text.to_string()), pos, end: t.end }
    }

    fn parse_import_spec(&mut self) -> ImportSpec {
        let pos = self.peek().pos;
        let alias = if self.peek_n(1).text.starts_with('"') { Some(self.bump().text.to_string()) } else { None };
        let path_tok = self.bump();
        let path = path_tok.text.trim_matches(['"', '`']).to_string();
        ImportSpec { alias, path, comment: None, pos, end: path_tok.end }
    }

    fn parse_file(&mut self) -> AstFile {
        let mut file = AstFile::default();
        if self.peek().text == "package" {
            self.bump();
            file.package_name = self.bump().text.to_string();
        }
        loop {
            match self.peek().text {
                "" => break,
                "import" => {
                    self.bump();
                    if self.peek().text == "(" {
                        self.bump();
                        while self.peek().text != ")" && !self.at_end() {
                            file.imports.push(self.parse_import_spec());
                        }
                        self.expect(")");
                    } else {
                        file.imports.push(self.parse_import_spec());
                    }
                }
                "func" => file.decls.push(Decl::Func(self.parse_func_decl())),
                "type" => file.decls.push(Decl::Type(self.parse_type_decl())),
                _ => {
                    self.bump();
                }
            }
        }
        file
    }
}

fn into_call(expr: Expr) -> CallExpr {
    match expr {
        Expr::Call(c) => *c,
        other => {
            let pos = other.pos();
            let end = other.end();
            CallExpr { fun: other, args: Vec::new(), pos, end }
        }
    }
}

/// Parse `source` into an [`crate::ast::File`] using this crate's
/// test-only Go-subset grammar.
pub fn parse_file(source: &str) -> AstFile {
    Parser::new(source).parse_file()
}

/// Build a single-package, single-file [`Workspace`] from one source
/// string, convenient for unit and integration tests that only need one
/// file in scope.
pub fn single_file_workspace(path: impl Into<PathBuf>, source: &str, package_path: &str, module_path: Option<&str>) -> Workspace {
    let path = path.into();
    let ast = parse_file(source);
    let file = File { path: path.clone(), ast, original_content: source.to_string(), package_path: package_path.to_string() };
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("main.go").to_string();
    let mut files = BTreeMap::new();
    files.insert(filename, file);
    let mut packages = BTreeMap::new();
    packages.insert(
        package_path.to_string(),
        Package { path: package_path.to_string(), name: package_path.to_string(), dir: PathBuf::new(), files, test_files: BTreeMap::new(), symbols: Vec::new() },
    );
    Workspace { root_path: PathBuf::new(), packages, module_path: module_path.map(str::to_string), workspace_modules: Vec::new() }
}

/// Build a multi-file, multi-package [`Workspace`]. `entries` is
/// `(package_path, file_path, source)`.
pub fn workspace_from(entries: &[(&str, &str, &str)], module_path: Option<&str>, workspace_modules: &[&str]) -> Workspace {
    let mut packages: BTreeMap<String, Package> = BTreeMap::new();
    for (package_path, file_path, source) in entries {
        let path: PathBuf = Path::new(file_path).to_path_buf();
        let ast = parse_file(source);
        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or(file_path).to_string();
        let file = File { path: path.clone(), ast, original_content: source.to_string(), package_path: package_path.to_string() };
        let pkg = packages.entry(package_path.to_string()).or_insert_with(|| Package {
            path: package_path.to_string(),
            name: package_path.to_string(),
            dir: PathBuf::new(),
            files: BTreeMap::new(),
            test_files: BTreeMap::new(),
            symbols: Vec::new(),
        });
        pkg.files.insert(filename, file);
    }
    Workspace {
        root_path: PathBuf::new(),
        packages,
        module_path: module_path.map(str::to_string),
        workspace_modules: workspace_modules.iter().map(|s| s.to_string()).collect(),
    }
}
