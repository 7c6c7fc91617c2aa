//! Stage D: canonical LR(0) state construction with basis deduplication and
//! backward-plink recording.
//!
//! The reference design recurses to build successors; this repository uses
//! an explicit worklist instead (same algorithm, avoids unbounded recursion
//! depth on large grammars — see DESIGN.md).

use std::collections::{HashMap, VecDeque};

use crate::action::{Action, ActionKind, ActionPayload};
use crate::ids::{ConfigId, RuleId, StateId, EOF_SYMBOL, START_STATE};
use crate::error::BuildError;
use crate::grammar::Grammar;
use crate::state::{hash_basis, State};
use crate::symbol::SymbolKind;

struct Lr0Builder {
    state_by_hash: HashMap<u64, Vec<StateId>>,
    queue: VecDeque<StateId>,
    action_counter: u32,
}

impl Lr0Builder {
    fn next_action_index(&mut self) -> u32 {
        let i = self.action_counter;
        self.action_counter += 1;
        i
    }
}

/// FIRST(tail · lookahead) where `tail` is the symbols after the dot in
/// `rule`, contributed statically; returns `(contribution, tail_is_lambda)`.
/// When `tail_is_lambda` is true the caller must also install a backward
/// plink, since the true contribution includes whatever the source item's
/// follow-set eventually becomes (not yet known during stage D).
fn tail_first(g: &Grammar, tail: &[crate::ids::SymbolId]) -> (crate::sets::TermSet, bool) {
    let mut set = crate::sets::TermSet::new();
    for &sym_id in tail {
        match g.symbols[sym_id.index()].kind {
            SymbolKind::Terminal => {
                set.insert(sym_id.index());
                return (set, false);
            }
            SymbolKind::Multiterminal => {
                for &c in g.symbols[sym_id.index()].constituents.iter() {
                    set.insert(c.index());
                }
                return (set, false);
            }
            SymbolKind::Nonterminal => {
                let first = g.symbols[sym_id.index()].first.clone();
                set.union_from(&first);
                if !g.symbols[sym_id.index()].lambda {
                    return (set, false);
                }
            }
        }
    }
    (set, true)
}

/// Build the closure of `state_id`'s basis into its `closure` field,
/// allocating new configs for every item added by the nonterminal-expansion
/// rule (§4.D.1).
fn close_state(g: &mut Grammar, state_id: StateId) {
    let basis = g.states[state_id.index()].basis.clone();
    let mut closure = basis.clone();
    let mut intern: HashMap<(RuleId, u32), ConfigId> = closure
        .iter()
        .map(|&cid| {
            let c = g.config(cid);
            ((c.rule, c.dot), cid)
        })
        .collect();

    let mut queue: VecDeque<ConfigId> = closure.iter().copied().collect();
    while let Some(cid) = queue.pop_front() {
        let (rule_id, dot) = {
            let c = g.config(cid);
            (c.rule, c.dot)
        };
        let rule = g.rule(rule_id);
        if dot as usize >= rule.len() {
            continue;
        }
        let y = rule.rhs[dot as usize];
        if g.symbols[y.index()].kind != SymbolKind::Nonterminal {
            continue;
        }
        let tail: Vec<_> = rule.rhs[(dot as usize + 1)..].to_vec();
        let (contribution, tail_is_lambda) = tail_first(g, &tail);
        let sub_rules = g.symbols[y.index()].rules.clone();
        for r_prime in sub_rules {
            let key = (r_prime, 0u32);
            let target = if let Some(&existing) = intern.get(&key) {
                existing
            } else {
                let new_id = g.alloc_config(r_prime, 0);
                intern.insert(key, new_id);
                closure.push(new_id);
                queue.push_back(new_id);
                new_id
            };
            {
                let t = g.config_mut(target);
                t.follow.union_from(&contribution);
            }
            if tail_is_lambda {
                let t = g.config_mut(target);
                if !t.bplp.contains(&cid) {
                    t.bplp.push(cid);
                }
            }
        }
    }

    g.states[state_id.index()].closure = closure;
}

/// Build the complete canonical LR(0) collection, seeded from the augmented
/// start rules (every rule whose LHS is the start symbol).
#[tracing::instrument(level = "debug", skip(g))]
pub fn build(g: &mut Grammar) -> Result<(), BuildError> {
    let start_symbol = g.start_symbol.ok_or(BuildError::Invariant(
        "start symbol must be set before state construction".into(),
    ))?;

    let start_rules = g.symbols[start_symbol.index()].rules.clone();
    if start_rules.is_empty() {
        return Err(BuildError::NoRules);
    }

    let mut basis = Vec::new();
    for r in start_rules {
        let cid = g.alloc_config(r, 0);
        g.config_mut(cid).follow.insert(EOF_SYMBOL.index());
        basis.push((r, 0u32, cid));
    }
    basis.sort_by_key(|&(r, d, _)| (r.0, d));
    let basis_ids: Vec<ConfigId> = basis.iter().map(|&(_, _, c)| c).collect();

    let mut builder = Lr0Builder {
        state_by_hash: HashMap::new(),
        queue: VecDeque::new(),
        action_counter: 0,
    };

    let start_state = State::new(START_STATE, basis_ids.clone());
    g.states.push(start_state);
    let start_key: Vec<(RuleId, u32)> = basis.iter().map(|&(r, d, _)| (r, d)).collect();
    builder
        .state_by_hash
        .entry(hash_basis(&start_key))
        .or_default()
        .push(START_STATE);
    builder.queue.push_back(START_STATE);

    while let Some(sid) = builder.queue.pop_front() {
        close_state(g, sid);
        build_successors(g, &mut builder, sid)?;
    }

    Ok(())
}

fn basis_key(g: &Grammar, ids: &[ConfigId]) -> Vec<(RuleId, u32)> {
    let mut key: Vec<(RuleId, u32)> = ids
        .iter()
        .map(|&cid| {
            let c = g.config(cid);
            (c.rule, c.dot)
        })
        .collect();
    key.sort();
    key
}

fn find_equivalent_state(g: &Grammar, builder: &Lr0Builder, key: &[(RuleId, u32)]) -> Option<StateId> {
    let h = hash_basis(key);
    let candidates = builder.state_by_hash.get(&h)?;
    for &sid in candidates {
        let other_key = basis_key(g, &g.states[sid.index()].basis);
        if other_key == key {
            return Some(sid);
        }
    }
    None
}

/// §4.D.3: group complete-dot-not-at-end items by the symbol after the dot,
/// form each successor's basis, dedup against existing states, and emit a
/// Shift action per transition (one per constituent, for a Multiterminal).
fn build_successors(g: &mut Grammar, builder: &mut Lr0Builder, sid: StateId) -> Result<(), BuildError> {
    let closure = g.states[sid.index()].closure.clone();

    let mut groups: Vec<(crate::ids::SymbolId, Vec<ConfigId>)> = Vec::new();
    for &cid in &closure {
        let c = g.config(cid);
        let rule = g.rule(c.rule);
        if c.dot as usize >= rule.len() {
            continue;
        }
        let x = rule.rhs[c.dot as usize];
        if let Some(group) = groups.iter_mut().find(|(gx, _)| same_symbol(g, *gx, x)) {
            group.1.push(cid);
        } else {
            groups.push((x, vec![cid]));
        }
    }

    for (x, items) in groups {
        let mut new_basis: Vec<(RuleId, u32, ConfigId)> = Vec::new();
        for item_cid in &items {
            let (rule_id, dot) = {
                let c = g.config(*item_cid);
                (c.rule, c.dot)
            };
            let new_cid = g.alloc_config(rule_id, dot + 1);
            g.config_mut(new_cid).bplp.push(*item_cid);
            new_basis.push((rule_id, dot + 1, new_cid));
        }
        new_basis.sort_by_key(|&(r, d, _)| (r.0, d));
        let key: Vec<(RuleId, u32)> = new_basis.iter().map(|&(r, d, _)| (r, d)).collect();

        let target = if let Some(existing) = find_equivalent_state(g, builder, &key) {
            let existing_basis = g.states[existing.index()].basis.clone();
            for (i, &(_, _, new_cid)) in new_basis.iter().enumerate() {
                let incoming_bplp = g.config(new_cid).bplp.clone();
                let existing_cid = existing_basis[i];
                for src in incoming_bplp {
                    let t = g.config_mut(existing_cid);
                    if !t.bplp.contains(&src) {
                        t.bplp.push(src);
                    }
                }
                g.config_freelist.push(new_cid);
            }
            existing
        } else {
            let new_state_id = StateId(g.states.len() as u32);
            let basis_ids: Vec<ConfigId> = new_basis.iter().map(|&(_, _, c)| c).collect();
            g.states.push(State::new(new_state_id, basis_ids));
            builder
                .state_by_hash
                .entry(hash_basis(&key))
                .or_default()
                .push(new_state_id);
            builder.queue.push_back(new_state_id);
            new_state_id
        };

        // A Multiterminal is a grammar-text convenience, not a real
        // lookahead: the runtime only ever sees one of its constituents, so
        // the shift action is recorded once per constituent, all targeting
        // the same successor state.
        let lookaheads: Vec<crate::ids::SymbolId> = if g.symbols[x.index()].kind == SymbolKind::Multiterminal {
            g.symbols[x.index()].constituents.clone()
        } else {
            vec![x]
        };
        for look in lookaheads {
            let idx = builder.next_action_index();
            g.states[sid.index()].actions.push(Action::new(
                look,
                ActionKind::Shift,
                ActionPayload::Shift(target),
                idx,
            ));
            g.symbols[look.index()].used = true;
        }
    }

    Ok(())
}

/// Two Multiterminals are equal iff their constituent lists are elementwise
/// identical; otherwise compare by symbol identity.
fn same_symbol(g: &Grammar, a: crate::ids::SymbolId, b: crate::ids::SymbolId) -> bool {
    if a == b {
        return true;
    }
    let sa = &g.symbols[a.index()];
    let sb = &g.symbols[b.index()];
    sa.kind == SymbolKind::Multiterminal
        && sb.kind == SymbolKind::Multiterminal
        && sa.constituents == sb.constituents
}
