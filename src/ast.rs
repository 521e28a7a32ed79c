//! A minimal, Go-shaped abstract syntax tree.
//!
//! The real parser is an external collaborator; this module
//! defines the node vocabulary the engines need in order to consume one.
//! Every node carries `pos`/`end` byte offsets into its owning file's
//! `original_content`. This is the single hard invariant this crate
//! relies on: edits are always computed from these offsets, never from a
//! reprint of the node.

/// A parsed source file: its package clause, import declarations, and
/// top-level declarations.
#[derive(Debug, Clone, Default)]
pub struct File {
    /// Declared package name (`package foo` → `"foo"`).
    pub package_name: String,
    /// Import declarations, in source order.
    pub imports: Vec<ImportSpec>,
    /// Top-level declarations, in source order.
    pub decls: Vec<Decl>,
}

impl File {
    /// All function/method declarations, in source order.
    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Func(f) => Some(f),
            _ => None,
        })
    }

    /// All interface type declarations, in source order.
    pub fn interfaces(&self) -> impl Iterator<Item = (&str, &InterfaceType)> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Type(t) => match &t.spec {
                TypeSpec::Interface(i) => Some((t.name.as_str(), i)),
                TypeSpec::Other(_) => None,
            },
            Decl::Func(_) => None,
        })
    }
}

/// A single import declaration, e.g. `alias "path/to/pkg"`.
#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// Optional alias (`.` for dot-import, `_` for blank-import, or a
    /// named alias). `None` when the import uses its package's own name.
    pub alias: Option<String>,
    /// The quoted import path, without quotes.
    pub path: String,
    /// Trailing line comment, if any (without the leading `//`).
    pub comment: Option<String>,
    /// Byte offset of the start of this import spec.
    pub pos: usize,
    /// Byte offset one past the end of this import spec.
    pub end: usize,
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub enum Decl {
    /// A function or method declaration.
    Func(FuncDecl),
    /// A type declaration.
    Type(TypeDecl),
}

/// `type Name <spec>`.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    /// The declared type's name.
    pub name: String,
    /// What the name is defined as.
    pub spec: TypeSpec,
    /// Byte offset of the start of the `type` keyword.
    pub pos: usize,
    /// Byte offset one past the end of the declaration.
    pub end: usize,
}

/// The right-hand side of a type declaration.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    /// An interface type, with its method set.
    Interface(InterfaceType),
    /// Any other type spec, kept only as raw source text (structs, aliases,
    /// etc.: the engines never need to look inside these).
    Other(String),
}

/// `interface { MethodSpec... }`.
#[derive(Debug, Clone, Default)]
pub struct InterfaceType {
    /// Method signatures declared directly in this interface.
    pub methods: Vec<MethodSpec>,
}

/// A single method signature inside an `interface { ... }` body.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    /// Method name.
    pub name: String,
    /// Parameter fields.
    pub params: Vec<Field>,
    /// Result fields.
    pub results: Vec<Field>,
    /// Byte offset of the method name.
    pub name_pos: usize,
    /// Byte range of the parenthesized parameter list, including parens.
    pub params_span: (usize, usize),
    /// Byte range of the result list, if present (bare type, or a
    /// parenthesized list).
    pub results_span: Option<(usize, usize)>,
    /// Byte offset one past the end of the whole method spec line.
    pub end: usize,
}

/// `func (recv) Name(params) (results) { body }`.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    /// Function or method name.
    pub name: String,
    /// Receiver field, for methods (`func (s *Server) Process(...)`).
    pub recv: Option<Field>,
    /// Parameter fields.
    pub params: Vec<Field>,
    /// Result fields.
    pub results: Vec<Field>,
    /// Byte offset of the declaration's `func` keyword.
    pub pos: usize,
    /// Byte offset of the function name identifier.
    pub name_pos: usize,
    /// Byte range of the parenthesized parameter list, including parens.
    pub params_span: (usize, usize),
    /// Byte range of the result list, if present.
    pub results_span: Option<(usize, usize)>,
    /// The function body, if any (absent for a bare forward declaration).
    pub body: Option<Block>,
    /// Byte offset one past the end of the whole declaration.
    pub end: usize,
}

impl FuncDecl {
    /// `Type.Method` for a method with a named receiver type, else the
    /// bare function name.
    pub fn qualified_name(&self) -> String {
        match &self.recv {
            Some(r) => format!("{}.{}", r.ty.trim_start_matches('*'), self.name),
            None => self.name.clone(),
        }
    }
}

/// One parameter/result/receiver group: zero or more names sharing a type.
///
/// An unnamed field (bare type, as in most result lists) has an empty
/// `names`. It still counts as exactly one return slot.
#[derive(Debug, Clone)]
pub struct Field {
    /// Names bound by this field (empty for an unnamed field).
    pub names: Vec<String>,
    /// The field's type, as already-rendered surface syntax.
    pub ty: String,
}

impl Field {
    /// Number of return/parameter slots this field occupies.
    pub fn slot_count(&self) -> usize {
        self.names.len().max(1)
    }
}

/// Parse a Go-style field list body (the text between, but not including,
/// the enclosing parens) into grouped [`Field`]s.
///
/// Handles the `a, b int` grouping rule: consecutive bare identifiers are
/// accumulated as pending names until a segment with both a name and a
/// type is found, at which point the type applies to every pending name
/// plus the current one. If the list runs out without finding a typed
/// segment, every pending identifier is itself treated as an unnamed type
/// (the common case for result lists: `(string, error)`).
pub fn parse_field_list(body: &str) -> Vec<Field> {
    let segments = split_top_level_commas(body);
    let mut fields = Vec::new();
    let mut pending_names: Vec<String> = Vec::new();

    for seg in segments {
        let seg = seg.trim();
        if seg.is_empty() {
            continue;
        }
        match split_name_and_type(seg) {
            Some((name, ty)) => {
                pending_names.push(name);
                fields.push(Field { names: std::mem::take(&mut pending_names), ty });
            }
            None => pending_names.push(seg.to_string()),
        }
    }

    // Any names left over never found a type: each is itself a bare type.
    for leftover in pending_names {
        fields.push(Field { names: Vec::new(), ty: leftover });
    }

    fields
}

/// Split `seg` into `(name, type)` if it looks like `ident rest...`, i.e.
/// the segment contains a space/tab after a leading identifier and the
/// remainder is non-empty. Variadic (`...T`) and bare types with no
/// separating identifier return `None`.
fn split_name_and_type(seg: &str) -> Option<(String, String)> {
    let mut chars = seg.char_indices();
    let first = chars.next()?.1;
    if !(first.is_alphabetic() || first == '_') {
        return None;
    }
    let mut split_at = seg.len();
    for (i, c) in seg.char_indices() {
        if c.is_whitespace() {
            split_at = i;
            break;
        }
        if !(c.is_alphanumeric() || c == '_') {
            return None; // not a bare identifier, e.g. `*Foo` or `[]int`
        }
    }
    if split_at == seg.len() {
        return None; // no type followed (bare identifier, still pending)
    }
    let name = seg[..split_at].to_string();
    let ty = seg[split_at..].trim().to_string();
    if ty.is_empty() { None } else { Some((name, ty)) }
}

/// Split `s` on commas that are not nested inside `()`, `[]`, `{}`.
fn split_top_level_commas(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

/// A brace-delimited sequence of statements.
#[derive(Debug, Clone, Default)]
pub struct Block {
    /// Statements, in source order.
    pub stmts: Vec<Stmt>,
    /// Byte offset of the opening `{`.
    pub pos: usize,
    /// Byte offset one past the closing `}`.
    pub end: usize,
}

/// A statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// A bare expression statement (typically a call).
    Expr(Expr),
    /// `lhs... op rhs...` (`=`, `:=`, or a compound assignment).
    Assign(AssignStmt),
    /// `go <call>`.
    Go(GoStmt),
    /// `defer <call>`.
    Defer(DeferStmt),
    /// `return expr...`.
    Return(ReturnStmt),
    /// `if cond { then } else { els }`.
    If(IfStmt),
    /// A C-style `for` loop (condition and body only; init/post are kept
    /// as opaque text since the engines never need to inspect them).
    For(ForStmt),
    /// `for key, value := range x { body }`.
    Range(RangeStmt),
    /// A nested, unlabeled block.
    Block(Block),
    /// Anything this crate's minimal grammar does not model in depth
    /// (e.g. `var`/`const` blocks, `switch`): kept only as a byte span so
    /// position arithmetic elsewhere stays correct.
    Other {
        /// Byte offset of the start of the statement.
        pos: usize,
        /// Byte offset one past the end of the statement.
        end: usize,
    },
}

impl Stmt {
    /// Byte offset of the start of this statement.
    pub fn pos(&self) -> usize {
        match self {
            Stmt::Expr(e) => e.pos(),
            Stmt::Assign(a) => a.pos,
            Stmt::Go(g) => g.pos,
            Stmt::Defer(d) => d.pos,
            Stmt::Return(r) => r.pos,
            Stmt::If(i) => i.pos,
            Stmt::For(f) => f.pos,
            Stmt::Range(r) => r.pos,
            Stmt::Block(b) => b.pos,
            Stmt::Other { pos, .. } => *pos,
        }
    }

    /// Byte offset one past the end of this statement.
    pub fn end(&self) -> usize {
        match self {
            Stmt::Expr(e) => e.end(),
            Stmt::Assign(a) => a.end,
            Stmt::Go(g) => g.end,
            Stmt::Defer(d) => d.end,
            Stmt::Return(r) => r.end,
            Stmt::If(i) => i.end,
            Stmt::For(f) => f.end,
            Stmt::Range(r) => r.end,
            Stmt::Block(b) => b.end,
            Stmt::Other { end, .. } => *end,
        }
    }
}

/// `lhs... op rhs...`.
#[derive(Debug, Clone)]
pub struct AssignStmt {
    /// Left-hand side targets.
    pub lhs: Vec<Expr>,
    /// `:=`, `=`, `+=`, etc.
    pub op: String,
    /// Right-hand side expressions.
    pub rhs: Vec<Expr>,
    /// Byte offset of the start of the statement.
    pub pos: usize,
    /// Byte offset one past the end of the statement.
    pub end: usize,
}

/// `go <call expression>`. Go's grammar guarantees the launched
/// expression is always a call (possibly of a function literal).
#[derive(Debug, Clone)]
pub struct GoStmt {
    /// The launched call.
    pub call: CallExpr,
    /// Byte offset of the `go` keyword.
    pub pos: usize,
    /// Byte offset one past the end of the statement.
    pub end: usize,
}

/// `defer <call expression>`.
#[derive(Debug, Clone)]
pub struct DeferStmt {
    /// The deferred call.
    pub call: CallExpr,
    /// Byte offset of the `defer` keyword.
    pub pos: usize,
    /// Byte offset one past the end of the statement.
    pub end: usize,
}

/// `return expr, ...`.
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    /// Returned expressions (empty for a bare `return`).
    pub results: Vec<Expr>,
    /// Byte offset of the `return` keyword.
    pub pos: usize,
    /// Byte offset one past the end of the statement.
    pub end: usize,
}

/// `if cond { then } [else { els }]`.
#[derive(Debug, Clone)]
pub struct IfStmt {
    /// The `then` branch.
    pub then: Block,
    /// The `else` branch, if any (only a block is modeled; `else if` is
    /// represented as a single nested `If` statement inside `els`).
    pub els: Option<Block>,
    /// Byte offset of the `if` keyword.
    pub pos: usize,
    /// Byte offset one past the end of the statement.
    pub end: usize,
}

/// A C-style `for` loop.
#[derive(Debug, Clone)]
pub struct ForStmt {
    /// Loop body.
    pub body: Block,
    /// Byte offset of the `for` keyword.
    pub pos: usize,
    /// Byte offset one past the end of the statement.
    pub end: usize,
}

/// `for key, value := range x { body }`.
#[derive(Debug, Clone)]
pub struct RangeStmt {
    /// Loop-introduced key variable, if bound (not `_`).
    pub key: Option<Ident>,
    /// Loop-introduced value variable, if bound (not `_`).
    pub value: Option<Ident>,
    /// The ranged-over expression.
    pub x: Expr,
    /// Loop body.
    pub body: Block,
    /// Byte offset of the `for` keyword.
    pub pos: usize,
    /// Byte offset one past the end of the statement.
    pub end: usize,
}

/// An identifier occurrence.
#[derive(Debug, Clone)]
pub struct Ident {
    /// The identifier's text.
    pub name: String,
    /// Byte offset of the identifier.
    pub pos: usize,
    /// Byte offset one past the end of the identifier.
    pub end: usize,
}

/// An expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A bare identifier.
    Ident(Ident),
    /// `x.Sel`.
    Selector(Box<SelectorExpr>),
    /// `fun(args...)`.
    Call(Box<CallExpr>),
    /// `func(params) (results) { body }`.
    FuncLit(Box<FuncLit>),
    /// A basic literal (string, number, etc.), kept as raw source text.
    BasicLit {
        /// The literal's raw source text, including quotes for strings.
        value: String,
        /// Byte offset of the start of the literal.
        pos: usize,
        /// Byte offset one past the end of the literal.
        end: usize,
    },
    /// `(inner)`.
    Paren {
        /// The parenthesized expression.
        inner: Box<Expr>,
        /// Byte offset of the opening paren.
        pos: usize,
        /// Byte offset one past the closing paren.
        end: usize,
    },
    /// Any expression form this crate's grammar does not parse in depth
    /// (composite literals, index/slice expressions, unary/binary
    /// operators): kept as a raw byte span, never reprinted from
    /// anything but the original source.
    Other {
        /// Byte offset of the start of the expression.
        pos: usize,
        /// Byte offset one past the end of the expression.
        end: usize,
    },
}

impl Expr {
    /// Byte offset of the start of this expression.
    pub fn pos(&self) -> usize {
        match self {
            Expr::Ident(i) => i.pos,
            Expr::Selector(s) => s.pos,
            Expr::Call(c) => c.pos,
            Expr::FuncLit(f) => f.pos,
            Expr::BasicLit { pos, .. } => *pos,
            Expr::Paren { pos, .. } => *pos,
            Expr::Other { pos, .. } => *pos,
        }
    }

    /// Byte offset one past the end of this expression.
    pub fn end(&self) -> usize {
        match self {
            Expr::Ident(i) => i.end,
            Expr::Selector(s) => s.end,
            Expr::Call(c) => c.end,
            Expr::FuncLit(f) => f.end,
            Expr::BasicLit { end, .. } => *end,
            Expr::Paren { end, .. } => *end,
            Expr::Other { end, .. } => *end,
        }
    }

    /// The identifier that names this expression when used as a call
    /// callee: either the bare identifier itself, or the selector field
    /// of a `pkg.Name`/`recv.Method` selector expression. Returns `None`
    /// for anything else (e.g. a function literal used as a callee).
    pub fn callee_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(i) => Some(i),
            Expr::Selector(s) => Some(&s.sel),
            _ => None,
        }
    }
}

/// `x.Sel`.
#[derive(Debug, Clone)]
pub struct SelectorExpr {
    /// The base expression.
    pub x: Expr,
    /// The selected field/method identifier.
    pub sel: Ident,
    /// Byte offset of the start of `x`.
    pub pos: usize,
    /// Byte offset one past the end of `Sel`.
    pub end: usize,
}

/// `fun(args...)`.
#[derive(Debug, Clone)]
pub struct CallExpr {
    /// The called expression (identifier, selector, or function literal).
    pub fun: Expr,
    /// Argument expressions, in source order.
    pub args: Vec<Expr>,
    /// Byte offset of the start of `fun`.
    pub pos: usize,
    /// Byte offset one past the closing paren.
    pub end: usize,
}

/// `func(params) (results) { body }` used as an expression.
#[derive(Debug, Clone)]
pub struct FuncLit {
    /// Parameter fields.
    pub params: Vec<Field>,
    /// Result fields.
    pub results: Vec<Field>,
    /// The literal's body.
    pub body: Block,
    /// Byte offset of the `func` keyword.
    pub pos: usize,
    /// Byte offset one past the end of the body.
    pub end: usize,
}

/// Recursively visit every [`CallExpr`] reachable from `block`, including
/// calls nested inside function literals. This is the traversal
/// Change-Signature needs when locating a call site that may be wrapped
/// in a goroutine launch or a closure.
pub fn walk_calls<'a>(block: &'a Block, visit: &mut dyn FnMut(&'a CallExpr)) {
    for stmt in &block.stmts {
        walk_calls_stmt(stmt, visit);
    }
}

fn walk_calls_stmt<'a>(stmt: &'a Stmt, visit: &mut dyn FnMut(&'a CallExpr)) {
    match stmt {
        Stmt::Expr(e) => walk_calls_expr(e, visit),
        Stmt::Assign(a) => {
            for e in a.lhs.iter().chain(a.rhs.iter()) {
                walk_calls_expr(e, visit);
            }
        }
        Stmt::Go(g) => walk_calls_call(&g.call, visit),
        Stmt::Defer(d) => walk_calls_call(&d.call, visit),
        Stmt::Return(r) => {
            for e in &r.results {
                walk_calls_expr(e, visit);
            }
        }
        Stmt::If(i) => {
            walk_calls(&i.then, visit);
            if let Some(els) = &i.els {
                walk_calls(els, visit);
            }
        }
        Stmt::For(f) => walk_calls(&f.body, visit),
        Stmt::Range(r) => {
            walk_calls_expr(&r.x, visit);
            walk_calls(&r.body, visit);
        }
        Stmt::Block(b) => walk_calls(b, visit),
        Stmt::Other { .. } => {}
    }
}

fn walk_calls_expr<'a>(expr: &'a Expr, visit: &mut dyn FnMut(&'a CallExpr)) {
    match expr {
        Expr::Call(c) => walk_calls_call(c, visit),
        Expr::Selector(s) => walk_calls_expr(&s.x, visit),
        Expr::Paren { inner, .. } => walk_calls_expr(inner, visit),
        Expr::FuncLit(f) => walk_calls(&f.body, visit),
        Expr::Ident(_) | Expr::BasicLit { .. } | Expr::Other { .. } => {}
    }
}

fn walk_calls_call<'a>(call: &'a CallExpr, visit: &mut dyn FnMut(&'a CallExpr)) {
    walk_calls_expr(&call.fun, visit);
    for a in &call.args {
        walk_calls_expr(a, visit);
    }
    visit(call);
}

/// Find the innermost call expression whose callee identifier sits at
/// byte offset `pos`: the central lookup behind the Change-Signature
/// call-site algorithm. Recurses into function literals,
/// `go`/`defer` launches, and every statement form, but never widens past
/// the matched [`CallExpr`] itself.
pub fn find_call_at<'a>(file: &'a File, pos: usize) -> Option<&'a CallExpr> {
    let mut found = None;
    for func in file.funcs() {
        if let Some(body) = &func.body {
            walk_calls(body, &mut |call| {
                if found.is_none() {
                    if let Some(id) = call.fun.callee_ident() {
                        if id.pos == pos {
                            found = Some(call);
                        }
                    }
                }
            });
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_list_groups_shared_type() {
        let fields = parse_field_list("a, b int, c string");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].names, vec!["a", "b"]);
        assert_eq!(fields[0].ty, "int");
        assert_eq!(fields[1].names, vec!["c"]);
        assert_eq!(fields[1].ty, "string");
    }

    #[test]
    fn field_list_unnamed_results() {
        let fields = parse_field_list("string, error");
        assert_eq!(fields.len(), 2);
        assert!(fields[0].names.is_empty());
        assert_eq!(fields[0].ty, "string");
        assert!(fields[1].names.is_empty());
        assert_eq!(fields[1].ty, "error");
    }

    #[test]
    fn field_list_single_named() {
        let fields = parse_field_list("ctx context.Context");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].names, vec!["ctx"]);
        assert_eq!(fields[0].ty, "context.Context");
    }

    #[test]
    fn slot_count_unnamed_is_one() {
        let f = Field { names: vec![], ty: "error".into() };
        assert_eq!(f.slot_count(), 1);
    }

    #[test]
    fn split_top_level_commas_respects_nesting() {
        let parts = split_top_level_commas("a func(int, int) bool, b string");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].trim(), "a func(int, int) bool");
        assert_eq!(parts[1].trim(), "b string");
    }
}
