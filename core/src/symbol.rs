//! Stage A (part 1): the symbol side of the registry. See [`crate::grammar`]
//! for the `intern` entry point and the post-parse sort.

use crate::ids::{RuleId, SymbolId};
use crate::sets::TermSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
    Multiterminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
    Nonassoc,
    Unknown,
}

/// A named grammar terminal, nonterminal, or multiterminal.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub id: SymbolId,
    pub kind: SymbolKind,
    /// -1 means undefined, matching the reference sentinel.
    pub precedence: i32,
    pub associativity: Associativity,
    pub lambda: bool,
    pub first: TermSet,
    pub fallback: Option<SymbolId>,
    /// Constituent terminals, populated only for `Multiterminal` symbols.
    pub constituents: Vec<SymbolId>,
    /// Per-LHS rule chain (stage A: "maintain per-LHS rule chains").
    pub rules: Vec<RuleId>,
    /// True once some rule actually uses this symbol; used for the unused
    /// warning diagnostics.
    pub used: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, id: SymbolId, kind: SymbolKind) -> Self {
        Symbol {
            name: name.into(),
            id,
            kind,
            precedence: -1,
            associativity: Associativity::Unknown,
            lambda: false,
            first: TermSet::new(),
            fallback: None,
            constituents: Vec::new(),
            rules: Vec::new(),
            used: false,
        }
    }

    /// First-character classification used by `intern`: uppercase ⇒
    /// terminal, lowercase ⇒ nonterminal. Multiterminals are never inferred
    /// this way; they are only created explicitly via `%token_class`.
    pub fn infer_kind(name: &str) -> SymbolKind {
        match name.chars().next() {
            Some(c) if c.is_ascii_uppercase() => SymbolKind::Terminal,
            _ => SymbolKind::Nonterminal,
        }
    }
}
