//! Stage F: reduce/accept action synthesis and conflict resolution.
//!
//! Shift actions (covering both real shifts and nonterminal gotos) are
//! already on each state's action list, emitted by [`crate::lr0`]. This
//! stage adds one Reduce action per completed item's follow-set terminal
//! (or a single Accept for the augmented start rule), sorts the combined
//! list per §4.J, and resolves same-lookahead collisions using precedence.

use crate::action::{sort_actions, Action, ActionKind, ActionPayload};
use crate::diagnostic::Diagnostic;
use crate::grammar::Grammar;
use crate::ids::EOF_SYMBOL;
use crate::symbol::Associativity;

/// Emit Reduce/Accept actions for every completed item in every state's
/// closure.
#[tracing::instrument(level = "debug", skip(g))]
pub fn synthesize_actions(g: &mut Grammar) {
    let real_start_rule = g
        .start_symbol
        .map(|s| g.symbols[s.index()].rules.clone())
        .unwrap_or_default();

    for state_idx in 0..g.states.len() {
        let closure = g.states[state_idx].closure.clone();
        let mut counter = g.states[state_idx].actions.len() as u32;
        let mut new_actions = Vec::new();
        for cid in closure {
            let (rule_id, dot, follow) = {
                let c = g.config(cid);
                (c.rule, c.dot, c.follow.clone())
            };
            let rule = g.rule(rule_id);
            if (dot as usize) < rule.len() {
                continue;
            }
            if real_start_rule.contains(&rule_id) {
                new_actions.push(Action::new(
                    EOF_SYMBOL,
                    ActionKind::Accept,
                    ActionPayload::Accept,
                    counter,
                ));
                counter += 1;
                continue;
            }
            for t in follow.iter() {
                new_actions.push(Action::new(
                    t.into(),
                    ActionKind::Reduce,
                    ActionPayload::Reduce(rule_id),
                    counter,
                ));
                counter += 1;
            }
            g.rules[rule_id.index()].canreduce = true;
        }
        g.states[state_idx].actions.extend(new_actions);
        sort_actions(&mut g.states[state_idx].actions);
    }
}

/// Precedence/associativity truth table for a Shift/Reduce pair on the same
/// lookahead. Returns `true` if the shift wins, `None` if precedence cannot
/// resolve it.
fn shift_wins(shift_symbol_prec: i32, rule_prec_assoc: Option<(i32, Associativity)>) -> Option<bool> {
    let (reduce_prec, assoc) = rule_prec_assoc?;
    if shift_symbol_prec < 0 {
        return None;
    }
    if shift_symbol_prec > reduce_prec {
        Some(true)
    } else if shift_symbol_prec < reduce_prec {
        Some(false)
    } else {
        match assoc {
            Associativity::Left => Some(false),
            Associativity::Right => Some(true),
            Associativity::Nonassoc | Associativity::Unknown => None,
        }
    }
}

/// Walk each state's (already sorted) action list and resolve every
/// same-lookahead collision, recording a diagnostic for genuine (i.e.
/// precedence-unresolvable or reduce/reduce) conflicts.
#[tracing::instrument(level = "debug", skip(g))]
pub fn resolve_conflicts(g: &mut Grammar) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for state_idx in 0..g.states.len() {
        let statenum = g.states[state_idx].statenum.0;
        let mut actions = std::mem::take(&mut g.states[state_idx].actions);
        let mut i = 0;
        while i < actions.len() {
            let mut j = i + 1;
            while j < actions.len() && actions[j].lookahead == actions[i].lookahead {
                j += 1;
            }
            if j - i > 1 {
                resolve_group(g, &mut actions[i..j], statenum, &mut diagnostics);
            }
            i = j;
        }
        g.states[state_idx].actions = actions;
    }

    diagnostics
}

fn resolve_group(g: &Grammar, group: &mut [Action], statenum: u32, diagnostics: &mut Vec<Diagnostic>) {
    // Within a lookahead group the live candidates are at most one Shift and
    // any number of Reduce (genuine ambiguity) entries; sort_key already put
    // Shift first.
    let shift_idx = group.iter().position(|a| a.kind == ActionKind::Shift);
    let reduce_idxs: Vec<usize> = group
        .iter()
        .enumerate()
        .filter(|(_, a)| a.kind == ActionKind::Reduce)
        .map(|(i, _)| i)
        .collect();

    if reduce_idxs.len() > 1 {
        // Reduce/reduce: earliest rule (lowest i_rule) wins, matching §4.A's
        // two-wave numbering intent that earlier-declared rules take
        // priority.
        let winner = *reduce_idxs
            .iter()
            .min_by_key(|&&i| rule_i_rule(g, &group[i]))
            .unwrap();
        for &i in &reduce_idxs {
            if i != winner {
                let terminal = g.symbols[group[i].lookahead.index()].name.clone();
                diagnostics.push(Diagnostic::ReduceReduceConflict { state: statenum, terminal });
                demote(&mut group[i], ActionKind::RrConflict);
            }
        }
    }

    if let (Some(si), Some(&ri)) = (shift_idx, reduce_idxs.first()) {
        if reduce_idxs.len() == 1 {
            let shift_symbol = group[si].lookahead;
            let shift_prec = g.symbols[shift_symbol.index()].precedence;
            let rule_id = match group[ri].payload {
                ActionPayload::Reduce(r) => r,
                _ => unreachable!(),
            };
            let rule = g.rule(rule_id);
            let prec_assoc = rule
                .prec_sym
                .map(|p| (g.symbols[p.index()].precedence, g.symbols[p.index()].associativity));

            match shift_wins(shift_prec, prec_assoc) {
                Some(true) => demote(&mut group[ri], ActionKind::RdResolved),
                Some(false) => demote(&mut group[si], ActionKind::ShResolved),
                None => {
                    let terminal = g.symbols[shift_symbol.index()].name.clone();
                    diagnostics.push(Diagnostic::ShiftReduceConflict { state: statenum, terminal });
                    demote(&mut group[ri], ActionKind::SrConflict);
                }
            }
        }
    }
}

fn rule_i_rule(g: &Grammar, a: &Action) -> u32 {
    match a.payload {
        ActionPayload::Reduce(r) | ActionPayload::ShiftReduce(r) => g.rule(r).i_rule.0,
        _ => u32::MAX,
    }
}

fn demote(a: &mut Action, new_kind: ActionKind) {
    let old_payload = std::mem::replace(&mut a.payload, ActionPayload::None);
    a.payload = ActionPayload::Superseded(Box::new(old_payload));
    a.kind = new_kind;
}
