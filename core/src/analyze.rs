//! §4.L's non-fatal diagnostic band: grammar trivia that table construction
//! doesn't need but a grammar author would want surfaced — a rule nothing
//! ever reduces by, a nonterminal with no productions, the start symbol
//! reappearing on some right-hand side. Runs last, after packing, since it
//! only reads the finished grammar.

use crate::diagnostic::Diagnostic;
use crate::grammar::Grammar;
use crate::ids::RuleId;
use crate::symbol::SymbolKind;

/// Mark [`crate::rule::Rule::doesreduce`] for every rule a live action, or
/// some state's default reduce, still reduces by after compression.
/// `canreduce` (set during stage F) only records that a Reduce action was
/// ever synthesized for the rule, before conflict resolution or compression
/// could have demoted every instance of it.
#[tracing::instrument(level = "debug", skip(g))]
pub fn mark_surviving_reduces(g: &mut Grammar) {
    use crate::action::ActionPayload;

    let mut survives = vec![false; g.rules.len()];
    for state in &g.states {
        for a in &state.actions {
            if !a.is_live() {
                continue;
            }
            match a.payload {
                ActionPayload::Reduce(r) | ActionPayload::ShiftReduce(r) => survives[r.index()] = true,
                _ => {}
            }
        }
        if let Some(r) = state.default_reduce {
            survives[r.index()] = true;
        }
    }
    for (rule, survived) in g.rules.iter_mut().zip(survives) {
        rule.doesreduce = survived;
    }
}

/// The rule `Builder::finish_with` added to augment the grammar with a
/// synthetic start production; it reduces only via Accept, never Reduce, so
/// it would otherwise look unreducible.
fn augmenting_rule(g: &Grammar) -> Option<RuleId> {
    let start = g.start_symbol?;
    let user_start = g.user_start_symbol?;
    g.rules
        .iter()
        .position(|r| r.lhs == start && r.rhs == [user_start])
        .map(|i| RuleId(i as u32))
}

#[tracing::instrument(level = "debug", skip(g))]
pub fn run(g: &Grammar) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let augmenting = augmenting_rule(g);

    // A start symbol recursing through its own alternatives (`e ::= e Plus
    // e`) is ordinary and not diagnosed; this only fires when some *other*
    // nonterminal's production reaches back into the start symbol, which
    // the augmenting rule's single reference into it was never meant to
    // share company with.
    if let Some(user_start) = g.user_start_symbol {
        for (i, rule) in g.rules.iter().enumerate() {
            if Some(RuleId(i as u32)) == augmenting || rule.lhs == user_start {
                continue;
            }
            if rule.rhs.contains(&user_start) {
                diagnostics.push(Diagnostic::StartSymbolOnRhs { rule: RuleId(i as u32) });
            }
        }
    }

    for (i, rule) in g.rules.iter().enumerate() {
        if Some(RuleId(i as u32)) == augmenting || rule.doesreduce {
            continue;
        }
        diagnostics.push(Diagnostic::UnreducibleRule {
            rule: RuleId(i as u32),
            lhs: g.symbol(rule.lhs).name.clone(),
        });
    }

    for sym in &g.symbols {
        if sym.kind == SymbolKind::Nonterminal && sym.rules.is_empty() {
            diagnostics.push(Diagnostic::UndefinedNonterminal { name: sym.name.clone() });
        }
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SymbolId;

    fn pipeline(rules: Vec<(&str, Vec<&str>)>, start: &str) -> Grammar {
        let mut g = Grammar::new();
        for (lhs, rhs) in &rules {
            g.intern(lhs);
            for s in rhs {
                g.intern(s);
            }
        }
        let start_id = g.intern(start);
        g.user_start_symbol = Some(start_id);
        let real_start = g.intern("{start}");
        g.start_symbol = Some(real_start);
        g.add_rule(real_start, vec![start_id]);
        for (lhs, rhs) in rules {
            let lhs_id = g.intern(lhs);
            let rhs_ids: Vec<SymbolId> = rhs.into_iter().map(|s| g.intern(s)).collect();
            g.add_rule(lhs_id, rhs_ids);
        }
        g.sort_and_renumber_symbols();
        g.resolve_precedence();
        crate::first::run(&mut g);
        crate::lr0::build(&mut g).unwrap();
        crate::follow::run(&mut g);
        crate::synth::synthesize_actions(&mut g);
        crate::synth::resolve_conflicts(&mut g);
        crate::compress::run(&mut g);
        mark_surviving_reduces(&mut g);
        g
    }

    #[test]
    fn augmenting_rule_is_never_flagged_unreducible() {
        let g = pipeline(vec![("e", vec!["Id"])], "e");
        let diags = run(&g);
        assert!(diags.iter().all(|d| !matches!(d, Diagnostic::UnreducibleRule { lhs, .. } if lhs == "{start}")));
    }

    #[test]
    fn a_rule_masked_by_another_rule_in_every_reachable_state_is_unreducible() {
        // `dead` is never reduced: `b` is interned (so it's not an
        // UndefinedNonterminal) but nothing on any right-hand side ever
        // shifts into a state whose basis includes `dead`'s item.
        let mut g = Grammar::new();
        let e = g.intern("e");
        let id = g.intern("Id");
        let dead = g.intern("dead");
        let b = g.intern("b");
        g.user_start_symbol = Some(e);
        let real_start = g.intern("{start}");
        g.start_symbol = Some(real_start);
        g.add_rule(real_start, vec![e]);
        g.add_rule(e, vec![id]);
        g.add_rule(dead, vec![b]);
        g.add_rule(b, vec![id]);
        g.sort_and_renumber_symbols();
        g.resolve_precedence();
        crate::first::run(&mut g);
        crate::lr0::build(&mut g).unwrap();
        crate::follow::run(&mut g);
        crate::synth::synthesize_actions(&mut g);
        crate::synth::resolve_conflicts(&mut g);
        crate::compress::run(&mut g);
        mark_surviving_reduces(&mut g);

        let diags = run(&g);
        assert!(diags
            .iter()
            .any(|d| matches!(d, Diagnostic::UnreducibleRule { lhs, .. } if lhs == "dead")));
    }

    #[test]
    fn start_symbol_recursing_into_its_own_alternatives_is_not_flagged() {
        // e ::= e Plus e | Id -- ordinary self-recursion, no diagnostic.
        let g = pipeline(
            vec![("e", vec!["e", "Plus", "e"]), ("e", vec!["Id"])],
            "e",
        );
        let diags = run(&g);
        assert!(diags.iter().all(|d| !matches!(d, Diagnostic::StartSymbolOnRhs { .. })));
    }

    #[test]
    fn start_symbol_reached_from_another_nonterminals_rule_is_flagged() {
        // e is the start symbol, but `wrap` also reaches back into it.
        let g = pipeline(
            vec![("e", vec!["Id"]), ("wrap", vec!["e", "Extra"])],
            "e",
        );
        let diags = run(&g);
        assert!(diags.iter().any(|d| matches!(d, Diagnostic::StartSymbolOnRhs { .. })));
    }

    #[test]
    fn an_undefined_nonterminal_is_flagged() {
        let mut g = Grammar::new();
        let e = g.intern("e");
        let undefined = g.intern("never_has_a_rule");
        g.user_start_symbol = Some(e);
        let real_start = g.intern("{start}");
        g.start_symbol = Some(real_start);
        g.add_rule(real_start, vec![e]);
        g.add_rule(e, vec![undefined]);
        // no rule ever defines `undefined` -- deliberately left dangling,
        // this grammar would fail closure-building elsewhere; here we only
        // check the diagnostic fires on the raw registry.
        let diags = run(&g);
        assert!(diags
            .iter()
            .any(|d| matches!(d, Diagnostic::UndefinedNonterminal { name } if name == "never_has_a_rule")));
    }
}
