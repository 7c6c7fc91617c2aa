//! Non-fatal diagnostics (§4.L, "Non-fatal"). These accumulate on the
//! [`crate::grammar::Grammar`] rather than being printed immediately, so both
//! the `.out` report and any other consumer can read them back.

use crate::ids::RuleId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The start symbol appears on the right-hand side of some rule.
    StartSymbolOnRhs { rule: RuleId },
    /// A rule that no reachable state ever reduces by.
    UnreducibleRule { rule: RuleId, lhs: String },
    /// A terminal was declared (via `%destructor`) but never used in a rule.
    UnusedDestructor { symbol: String },
    /// A nonterminal has no rules defining it.
    UndefinedNonterminal { name: String },
    /// An unresolved shift/reduce conflict, retained in the tables' conflict
    /// count but resolved in favor of shift per §4.F.
    ShiftReduceConflict { state: u32, terminal: String },
    /// An unresolved reduce/reduce conflict, resolved in favor of the
    /// earlier-numbered rule.
    ReduceReduceConflict { state: u32, terminal: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::StartSymbolOnRhs { rule } => {
                write!(f, "start symbol appears on the right-hand side of rule {rule}")
            }
            Diagnostic::UnreducibleRule { rule, lhs } => {
                write!(f, "rule {rule} ({lhs} ::= ...) is never reduced")
            }
            Diagnostic::UnusedDestructor { symbol } => {
                write!(f, "destructor for `{symbol}` is never used")
            }
            Diagnostic::UndefinedNonterminal { name } => {
                write!(f, "nonterminal `{name}` has no rules")
            }
            Diagnostic::ShiftReduceConflict { state, terminal } => {
                write!(f, "{state} shift/reduce conflict on `{terminal}` resolved in favor of shift")
            }
            Diagnostic::ReduceReduceConflict { state, terminal } => {
                write!(f, "{state} reduce/reduce conflict on `{terminal}` resolved in favor of the first rule")
            }
        }
    }
}
