//! §6a: the imperative mutation stream the tokenizer feeds the core. The
//! core places exactly one requirement on the producer: these must arrive in
//! source order.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
}

#[derive(Debug, Clone)]
pub enum Declaration {
    /// `%left` / `%right` / `%nonassoc TERM1 TERM2 ... .` — each call bumps
    /// the precedence counter once, then assigns it (with the given
    /// associativity) to every terminal named.
    PrecedenceBand { assoc: Assoc, terminals: Vec<String> },
    /// `%token_class NAME TERM1|TERM2|... .`
    TokenClass { name: String, constituents: Vec<String> },
    /// `%start_symbol NAME.`
    StartSymbol(String),
    /// `%fallback TERM1 TERM2 ... .` — `fallback` becomes the fallback for
    /// each of `terminals`.
    Fallback { fallback: String, terminals: Vec<String> },
    /// `%wildcard TERM.`
    Wildcard(String),
    /// Begin a rule: `lhs(alias)? ::=`.
    RuleStart { lhs: String, lhs_alias: Option<String> },
    /// Append one RHS symbol (with optional alias) to the rule under
    /// construction.
    RuleAppend { symbol: String, alias: Option<String> },
    /// Close the rule under construction.
    RuleFinish {
        action_code: Option<String>,
        explicit_prec: Option<String>,
    },
}
