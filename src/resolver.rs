//! External-collaborator trait boundary.
//!
//! Parsing, symbol resolution, and pretty-printing all live outside this
//! crate. The engines only ever see these narrow traits, so a real
//! implementation (backed by an actual compiler front end) can be swapped
//! in without touching any engine code.

use crate::error::Result;
use crate::model::{Reference, Scope, Symbol};

/// Resolves symbols and their references across a workspace.
pub trait SymbolResolver {
    /// Resolve a symbol by package import path and name.
    fn resolve_symbol(&self, package: &str, name: &str) -> Result<Symbol>;

    /// Find every reference to `symbol`, within `scope`.
    fn find_references(&self, symbol: &Symbol, scope: Scope) -> Result<Vec<Reference>>;
}

/// The external pretty-printer. `format` returns the reformatted bytes,
/// or an error if the input does not parse.
pub trait Formatter {
    /// Reformat `source`, or fail if it is not syntactically valid.
    fn format(&self, source: &[u8]) -> Result<Vec<u8>>;
}

/// A diagnostic sink that ignores everything by default.
pub trait DiagnosticSink {
    /// Report a non-fatal warning.
    fn warn(&self, message: &str);
    /// Report an informational message.
    fn info(&self, message: &str);
}

/// Ignores every message. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnosticSink;

impl DiagnosticSink for NullDiagnosticSink {
    fn warn(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
}

/// Emits every message through [`tracing`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnosticSink;

impl DiagnosticSink for TracingDiagnosticSink {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_does_not_panic() {
        let sink = NullDiagnosticSink;
        sink.warn("anything");
        sink.info("anything");
    }
}
