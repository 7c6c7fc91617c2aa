//! Diagnostics that need both a [`Grammar`] and the pragma list together, so
//! they live here rather than in `gramforge_core` (which never sees a
//! pragma).

use gramforge_core::grammar::Grammar;
use gramforge_core::Diagnostic;
use gramforge_syntax::Pragma;

/// §4.L: a `%destructor` declared for a symbol no live action ever pops off
/// the value stack.
#[tracing::instrument(level = "debug", skip(g, pragmas))]
pub fn unused_destructors(g: &Grammar, pragmas: &[Pragma]) -> Vec<Diagnostic> {
    pragmas
        .iter()
        .filter_map(|p| match p {
            Pragma::Destructor { symbol, .. } => Some(symbol),
            _ => None,
        })
        .filter(|symbol| match g.symbol_by_name(symbol) {
            Some(id) => !g.symbol(id).used,
            None => true,
        })
        .map(|symbol| Diagnostic::UnusedDestructor { symbol: symbol.clone() })
        .collect()
}
