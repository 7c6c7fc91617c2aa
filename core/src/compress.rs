//! Stage G: default-action compression.
//!
//! Three passes, in order: pick a default reduce rule per state (demoting
//! the individual Reduce actions it subsumes), detect auto-reduce states
//! (every live action agrees on one rule), then fuse a Shift into an
//! auto-reduce successor directly into a ShiftReduce action so the runtime
//! never has to visit that successor state.

use std::collections::HashMap;

use crate::action::{ActionKind, ActionPayload};
use crate::grammar::Grammar;
use crate::ids::RuleId;

/// For one state: find the reduce rule with the most live lookaheads
/// (ties broken by lowest `i_rule`, matching earliest-declared-wins
/// elsewhere in the pipeline). A rule whose LHS is the start symbol is
/// never a candidate -- it must always be reduced explicitly, never
/// defaulted (§4.G).
fn most_frequent_reduce(g: &Grammar, state_idx: usize) -> Option<RuleId> {
    let mut counts: HashMap<RuleId, u32> = HashMap::new();
    for a in &g.states[state_idx].actions {
        if a.kind == ActionKind::Reduce {
            if let ActionPayload::Reduce(r) = a.payload {
                if Some(g.rule(r).lhs) == g.start_symbol {
                    continue;
                }
                *counts.entry(r).or_insert(0) += 1;
            }
        }
    }
    counts
        .into_iter()
        .max_by_key(|&(r, count)| (count, std::cmp::Reverse(g.rule(r).i_rule.0)))
        .map(|(r, _)| r)
}

/// §4.G.1–2: choose each state's default reduce rule, demote the Reduce
/// actions it subsumes, and mark the state auto-reduce if nothing else
/// survives. A state with a live Shift on the wildcard token is never
/// defaulted -- the wildcard already catches every otherwise-unmatched
/// lookahead, so collapsing its reduces would shadow it.
fn compress_state(g: &mut Grammar, state_idx: usize) {
    if let Some(wildcard) = g.wildcard {
        let shifts_wildcard = g.states[state_idx]
            .actions
            .iter()
            .any(|a| a.is_live() && a.kind == ActionKind::Shift && a.lookahead == wildcard);
        if shifts_wildcard {
            return;
        }
    }

    let default_rule = match most_frequent_reduce(g, state_idx) {
        Some(r) => r,
        None => return,
    };

    for a in g.states[state_idx].actions.iter_mut() {
        if a.kind == ActionKind::Reduce && a.payload == ActionPayload::Reduce(default_rule) {
            let old = std::mem::replace(&mut a.payload, ActionPayload::None);
            a.payload = ActionPayload::Superseded(Box::new(old));
            a.kind = ActionKind::NotUsed;
        }
    }

    let any_other_live = g.states[state_idx]
        .actions
        .iter()
        .any(|a| a.is_live() && !(a.kind == ActionKind::Reduce && a.payload == ActionPayload::Reduce(default_rule)));

    g.states[state_idx].default_reduce = Some(default_rule);
    g.states[state_idx].auto_reduce = !any_other_live;
}

/// §4.G.3: a Shift into an auto-reduce state never needs to land there — it
/// can reduce immediately. Replace the Shift action with a fused
/// ShiftReduce.
fn fuse_shift_into_autoreduce(g: &mut Grammar) {
    let autoreduce_rule: Vec<Option<RuleId>> = g
        .states
        .iter()
        .map(|s| if s.auto_reduce { s.default_reduce } else { None })
        .collect();

    for state in g.states.iter_mut() {
        for a in state.actions.iter_mut() {
            if a.kind != ActionKind::Shift {
                continue;
            }
            if let ActionPayload::Shift(target) = a.payload {
                if let Some(rule) = autoreduce_rule[target.index()] {
                    a.kind = ActionKind::ShiftReduce;
                    a.payload = ActionPayload::ShiftReduce(rule);
                }
            }
        }
    }
}

/// Optional unit-rule inlining heuristic: left unimplemented. The reference
/// design leaves its exact shape an open question; since it is a pure
/// size optimization with no effect on accepted language or table
/// correctness, this pass is a deliberate no-op placeholder rather than a
/// guessed-at heuristic.
fn inline_unit_rules(_g: &mut Grammar) {}

#[tracing::instrument(level = "debug", skip(g))]
pub fn run(g: &mut Grammar) {
    for state_idx in 0..g.states.len() {
        compress_state(g, state_idx);
    }
    fuse_shift_into_autoreduce(g);
    inline_unit_rules(g);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Associativity;

    fn build_and_compress(rules: Vec<(&str, Vec<&str>)>, start: &str, precedence: Vec<(&str, Associativity)>) -> Grammar {
        let mut g = Grammar::new();
        for (lhs, rhs) in &rules {
            g.intern(lhs);
            for s in rhs {
                g.intern(s);
            }
        }
        let start_id = g.intern(start);
        let real_start = g.intern("{start}");
        g.start_symbol = Some(real_start);
        g.add_rule(real_start, vec![start_id]);
        for (lhs, rhs) in rules {
            let lhs_id = g.intern(lhs);
            let rhs_ids: Vec<_> = rhs.into_iter().map(|s| g.intern(s)).collect();
            g.add_rule(lhs_id, rhs_ids);
        }
        g.sort_and_renumber_symbols();
        for (name, assoc) in precedence {
            let id = g.symbol_by_name(name).unwrap();
            g.declare_precedence_band(assoc, &[id]);
        }
        g.resolve_precedence();
        crate::first::run(&mut g);
        crate::lr0::build(&mut g).unwrap();
        crate::follow::run(&mut g);
        crate::synth::synthesize_actions(&mut g);
        crate::synth::resolve_conflicts(&mut g);
        run(&mut g);
        g
    }

    #[test]
    fn state_with_a_single_surviving_reduce_becomes_auto_reduce() {
        // e ::= Id  -- after shifting Id, the only live action is reduce.
        let g = build_and_compress(vec![("e", vec!["Id"])], "e", vec![]);
        let id = g.symbol_by_name("Id").unwrap();
        let shift_target = g.states[0]
            .actions
            .iter()
            .find(|a| a.lookahead == id && a.kind == ActionKind::Shift)
            .map(|a| match a.payload {
                ActionPayload::Shift(t) => t,
                _ => unreachable!(),
            });
        assert!(shift_target.is_some());
        let target = shift_target.unwrap();
        assert!(g.states[target.index()].auto_reduce);
        assert!(g.states[target.index()].default_reduce.is_some());
    }

    #[test]
    fn shift_into_autoreduce_state_is_fused() {
        let g = build_and_compress(vec![("e", vec!["Id"])], "e", vec![]);
        let id = g.symbol_by_name("Id").unwrap();
        let a = g.states[0].actions.iter().find(|a| a.lookahead == id).unwrap();
        assert_eq!(a.kind, ActionKind::ShiftReduce);
    }

    /// §4.G.1: a reduce of the augmenting start rule is never a default
    /// candidate, even if it happens to be the most frequent reduce in a
    /// state (e.g. when it shares the state with only one other reduce).
    #[test]
    fn start_rule_reduce_is_never_a_default_candidate() {
        use crate::action::Action;

        let mut g = Grammar::new();
        let e = g.intern("e");
        let real_start = g.intern("{start}");
        g.start_symbol = Some(real_start);
        let start_rule = g.add_rule(real_start, vec![e]);
        let id = g.intern("Id");
        let other_rule = g.add_rule(e, vec![id]);

        g.states.push(crate::state::State::new(crate::ids::StateId(0), vec![]));
        g.states[0].actions = vec![
            Action::new(crate::ids::EOF_SYMBOL, ActionKind::Reduce, ActionPayload::Reduce(start_rule), 0),
            Action::new(id, ActionKind::Reduce, ActionPayload::Reduce(other_rule), 1),
        ];

        assert_eq!(most_frequent_reduce(&g, 0), Some(other_rule));
    }

    /// §4.G.1: a state with a live Shift on the wildcard token must never be
    /// given a default reduce -- the wildcard already swallows every
    /// lookahead the state doesn't explicitly handle, so defaulting one of
    /// its reduces would shadow it for lookaheads the wildcard should own.
    #[test]
    fn state_shifting_the_wildcard_is_never_defaulted() {
        use crate::action::Action;
        use crate::ids::StateId;
        use crate::state::State;

        let mut g = Grammar::new();
        let any = g.intern("Any");
        let a = g.intern("A");
        let b = g.intern("B");
        g.wildcard = Some(any);
        let lhs = g.intern("x");
        let rule_a = g.add_rule(lhs, vec![a]);
        let rule_b = g.add_rule(lhs, vec![b]);

        g.states.push(State::new(StateId(0), vec![]));
        g.states[0].actions = vec![
            Action::new(any, ActionKind::Shift, ActionPayload::Shift(StateId(1)), 0),
            Action::new(a, ActionKind::Reduce, ActionPayload::Reduce(rule_a), 1),
            Action::new(b, ActionKind::Reduce, ActionPayload::Reduce(rule_b), 2),
        ];

        compress_state(&mut g, 0);

        assert!(g.states[0].default_reduce.is_none());
        assert!(!g.states[0].auto_reduce);
        assert!(g.states[0].actions.iter().all(|act| act.kind != ActionKind::NotUsed));
    }

    /// §9's compression-soundness property: compressing must never change
    /// which rule a state+lookahead pair resolves to, only how that
    /// resolution is represented (an explicit live action vs a state's
    /// `default_reduce` fallback). Build the same grammar up to conflict
    /// resolution, fork it, compress only one fork, and check every
    /// state/lookahead decision agrees.
    fn effective_rule(g: &Grammar, state_idx: usize, lookahead: crate::ids::SymbolId) -> Option<&'static str> {
        let state = &g.states[state_idx];
        for a in &state.actions {
            if a.lookahead != lookahead || !a.is_live() {
                continue;
            }
            return Some(match a.kind {
                ActionKind::Shift => "shift",
                ActionKind::ShiftReduce => "shift-reduce",
                ActionKind::Reduce => "reduce",
                ActionKind::Accept => "accept",
                ActionKind::Error => "error",
                _ => "other",
            });
        }
        if state.default_reduce.is_some() {
            return Some("reduce");
        }
        None
    }

    #[test]
    fn compression_does_not_change_any_states_lookahead_decision() {
        let mut g = Grammar::new();
        for (lhs, rhs) in [
            ("e", vec!["e", "Plus", "e"]),
            ("e", vec!["e", "Star", "e"]),
            ("e", vec!["Id"]),
            ("e", vec!["LParen", "e", "RParen"]),
        ] {
            g.intern(lhs);
            for s in &rhs {
                g.intern(s);
            }
        }
        let start_id = g.intern("e");
        let real_start = g.intern("{start}");
        g.start_symbol = Some(real_start);
        g.add_rule(real_start, vec![start_id]);
        for (lhs, rhs) in [
            ("e", vec!["e", "Plus", "e"]),
            ("e", vec!["e", "Star", "e"]),
            ("e", vec!["Id"]),
            ("e", vec!["LParen", "e", "RParen"]),
        ] {
            let lhs_id = g.intern(lhs);
            let rhs_ids: Vec<_> = rhs.into_iter().map(|s| g.intern(s)).collect();
            g.add_rule(lhs_id, rhs_ids);
        }
        g.sort_and_renumber_symbols();
        let plus = g.symbol_by_name("Plus").unwrap();
        let star = g.symbol_by_name("Star").unwrap();
        g.declare_precedence_band(Associativity::Left, &[plus]);
        g.declare_precedence_band(Associativity::Left, &[star]);
        g.resolve_precedence();
        crate::first::run(&mut g);
        crate::lr0::build(&mut g).unwrap();
        crate::follow::run(&mut g);
        crate::synth::synthesize_actions(&mut g);
        crate::synth::resolve_conflicts(&mut g);

        let uncompressed = g.clone();
        run(&mut g);
        let compressed = g;

        assert_eq!(uncompressed.states.len(), compressed.states.len());
        for state_idx in 0..uncompressed.states.len() {
            for sym_idx in 0..uncompressed.symbols.len() {
                let lookahead = crate::ids::SymbolId(sym_idx as u32);
                assert_eq!(
                    effective_rule(&uncompressed, state_idx, lookahead),
                    effective_rule(&compressed, state_idx, lookahead),
                    "state {state_idx} disagrees on lookahead {sym_idx} after compression"
                );
            }
        }
    }
}
