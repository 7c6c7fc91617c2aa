//! The explicit pipeline object a front end drives: feed it the declaration
//! stream in source order, then call [`Builder::finish`] to run stages A
//! through I and get back the packed tables plus any accumulated
//! diagnostics.

use crate::declaration::{Assoc, Declaration};
use crate::diagnostic::Diagnostic;
use crate::error::BuildError;
use crate::grammar::Grammar;
use crate::ids::SymbolId;
use crate::pack::PackedTables;
use crate::symbol::Associativity;
use crate::{analyze, compress, first, follow, lr0, pack, resort, synth};

pub struct Builder {
    grammar: Grammar,
    current_rule: Option<PendingRule>,
    first_rule_lhs: Option<SymbolId>,
}

struct PendingRule {
    lhs: SymbolId,
    lhs_alias: Option<String>,
    rhs: Vec<SymbolId>,
    rhs_aliases: Vec<Option<String>>,
}

pub struct BuildOutput {
    pub grammar: Grammar,
    pub tables: PackedTables,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lets the CLI's `-c`/`-r` flags skip stages G/H for diagnostic or
/// size-comparison runs; table-construction correctness (§8.8) must hold
/// either way.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub compress: bool,
    pub resort: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions { compress: true, resort: true }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Builder {
            grammar: Grammar::new(),
            current_rule: None,
            first_rule_lhs: None,
        }
    }

    fn assoc(a: Assoc) -> Associativity {
        match a {
            Assoc::Left => Associativity::Left,
            Assoc::Right => Associativity::Right,
            Assoc::Nonassoc => Associativity::Nonassoc,
        }
    }

    /// Apply one declaration from the source-order stream.
    pub fn feed(&mut self, decl: Declaration) {
        match decl {
            Declaration::PrecedenceBand { assoc, terminals } => {
                let ids: Vec<SymbolId> = terminals.iter().map(|t| self.grammar.intern(t)).collect();
                self.grammar.declare_precedence_band(Self::assoc(assoc), &ids);
            }
            Declaration::TokenClass { name, constituents } => {
                let ids: Vec<SymbolId> = constituents.iter().map(|t| self.grammar.intern(t)).collect();
                self.grammar.intern_multiterminal(&name, ids);
            }
            Declaration::StartSymbol(name) => {
                let id = self.grammar.intern(&name);
                self.grammar.start_symbol = Some(id);
            }
            Declaration::Fallback { fallback, terminals } => {
                let fallback_id = self.grammar.intern(&fallback);
                for t in &terminals {
                    let id = self.grammar.intern(t);
                    self.grammar.symbol_mut(id).fallback = Some(fallback_id);
                }
            }
            Declaration::Wildcard(name) => {
                let id = self.grammar.intern(&name);
                self.grammar.wildcard = Some(id);
            }
            Declaration::RuleStart { lhs, lhs_alias } => {
                let lhs_id = self.grammar.intern(&lhs);
                if self.first_rule_lhs.is_none() {
                    self.first_rule_lhs = Some(lhs_id);
                }
                self.current_rule = Some(PendingRule { lhs: lhs_id, lhs_alias, rhs: Vec::new(), rhs_aliases: Vec::new() });
            }
            Declaration::RuleAppend { symbol, alias } => {
                let id = self.grammar.intern(&symbol);
                if let Some(rule) = self.current_rule.as_mut() {
                    rule.rhs.push(id);
                    rule.rhs_aliases.push(alias);
                }
            }
            Declaration::RuleFinish { action_code, explicit_prec } => {
                if let Some(pending) = self.current_rule.take() {
                    let rule_id = self.grammar.add_rule(pending.lhs, pending.rhs);
                    {
                        let rule = self.grammar.rule_mut(rule_id);
                        rule.lhs_alias = pending.lhs_alias;
                        rule.rhs_aliases = pending.rhs_aliases;
                    }
                    if let Some(code) = action_code {
                        self.grammar.rule_mut(rule_id).action_code = Some(code);
                    }
                    if let Some(prec_name) = explicit_prec {
                        let prec_id = self.grammar.intern(&prec_name);
                        let rule = self.grammar.rule_mut(rule_id);
                        rule.prec_sym = Some(prec_id);
                        rule.has_explicit_prec = true;
                    }
                }
            }
        }
    }

    /// Feed a whole stream at once; equivalent to calling [`Builder::feed`]
    /// in a loop.
    pub fn feed_all(&mut self, decls: impl IntoIterator<Item = Declaration>) {
        for decl in decls {
            self.feed(decl);
        }
    }

    /// Run stages A through I and return the packed tables plus the fully
    /// mutated grammar (states, actions, diagnostics all live on it).
    pub fn finish(self) -> Result<BuildOutput, BuildError> {
        self.finish_with(BuildOptions::default())
    }

    /// As [`Builder::finish`], but lets the caller skip stage G
    /// (`-c`) and/or stage H (`-r`).
    pub fn finish_with(mut self, options: BuildOptions) -> Result<BuildOutput, BuildError> {
        if self.grammar.start_symbol.is_none() {
            self.grammar.start_symbol = self.first_rule_lhs;
        }
        let start_name = self
            .grammar
            .start_symbol
            .map(|id| self.grammar.symbol(id).name.clone())
            .unwrap_or_default();
        if self.grammar.start_symbol.is_none() || self.grammar.rules.is_empty() {
            return Err(BuildError::NoRules);
        }

        let real_start = self.grammar.intern("{start}");
        let user_start = self.grammar.start_symbol.unwrap();
        if self.grammar.symbols[user_start.index()].rules.is_empty() {
            return Err(BuildError::StartSymbolNotFound(start_name));
        }
        self.grammar.user_start_symbol = Some(user_start);
        self.grammar.add_rule(real_start, vec![user_start]);
        self.grammar.start_symbol = Some(real_start);

        let g = &mut self.grammar;
        g.sort_and_renumber_symbols();
        g.number_rules();
        g.resolve_precedence();
        first::run(g);
        lr0::build(g)?;
        follow::run(g);
        synth::synthesize_actions(g);
        let mut diagnostics = synth::resolve_conflicts(g);
        if options.compress {
            compress::run(g);
        }
        if options.resort {
            resort::run(g);
        } else {
            resort::run_identity(g);
        }
        let tables = pack::run(g);

        analyze::mark_surviving_reduces(g);
        diagnostics.extend(analyze::run(g));

        Ok(BuildOutput { grammar: self.grammar, tables, diagnostics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::Declaration as D;

    fn rule(lhs: &str, rhs: &[&str]) -> Vec<D> {
        let mut out = vec![D::RuleStart { lhs: lhs.into(), lhs_alias: None }];
        for s in rhs {
            out.push(D::RuleAppend { symbol: (*s).into(), alias: None });
        }
        out.push(D::RuleFinish { action_code: None, explicit_prec: None });
        out
    }

    #[test]
    fn minimal_expression_grammar_builds_without_diagnostics() {
        let mut b = Builder::new();
        b.feed(D::PrecedenceBand { assoc: Assoc::Left, terminals: vec!["Plus".into()] });
        b.feed_all(rule("e", &["e", "Plus", "e"]));
        b.feed_all(rule("e", &["Id"]));
        let out = b.finish().unwrap();
        assert!(out.diagnostics.is_empty());
        assert!(!out.tables.action.is_empty());
    }

    #[test]
    fn missing_start_symbol_use_is_an_error() {
        let mut b = Builder::new();
        b.feed(Declaration::StartSymbol("never_defined".into()));
        b.feed_all(rule("e", &["Id"]));
        let err = b.finish().unwrap_err();
        assert!(matches!(err, BuildError::StartSymbolNotFound(_)));
    }

    #[test]
    fn defaults_start_symbol_to_first_rules_lhs_when_undeclared() {
        let mut b = Builder::new();
        b.feed_all(rule("e", &["Id"]));
        let out = b.finish().unwrap();
        assert_eq!(out.grammar.symbol(out.grammar.start_symbol.unwrap()).name, "{start}");
    }
}
