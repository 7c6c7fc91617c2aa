//! Stage H: state resorting.
//!
//! States 1..n (state 0 — the initial state — is pinned) are reordered by
//! descending action-set size so that the offset packer in [`crate::pack`]
//! sees the busiest, hardest-to-place rows first. Trailing auto-reduce
//! states need no row at all in the packed table, so they are pushed to the
//! end and excluded from `nxstate`.

use std::cmp::Reverse;

use crate::action::{ActionKind, ActionPayload};
use crate::grammar::Grammar;
use crate::ids::StateId;

fn count_actions(g: &mut Grammar) {
    for state in g.states.iter_mut() {
        let mut n_tkn = 0u32;
        let mut n_nt = 0u32;
        for a in &state.actions {
            if !a.is_live() {
                continue;
            }
            if (a.lookahead.index()) < g.nterminal {
                n_tkn += 1;
            } else {
                n_nt += 1;
            }
        }
        state.n_tkn_act = n_tkn;
        state.n_nt_act = n_nt;
    }
}

/// `-r`: keep states in construction order. Still needed to populate
/// `n_tkn_act`/`n_nt_act`/`nxstate` so [`crate::pack`] has something to pack.
#[tracing::instrument(level = "debug", skip(g))]
pub fn run_identity(g: &mut Grammar) {
    count_actions(g);
    g.nxstate = g.states.len();
}

/// Reorder `g.states`, fix up every `statenum` and `Shift` target to match,
/// and set `g.nxstate`.
#[tracing::instrument(level = "debug", skip(g))]
pub fn run(g: &mut Grammar) {
    count_actions(g);

    let n = g.states.len();
    if n == 0 {
        return;
    }

    let mut rest: Vec<usize> = (1..n).collect();
    rest.sort_by_key(|&i| {
        let s = &g.states[i];
        (Reverse(s.n_nt_act), Reverse(s.n_tkn_act), Reverse(i))
    });

    // Trailing auto-reduce states need no explicit row; walk the proposed
    // order from the back and count how many can be trimmed.
    let mut trim = 0usize;
    for &i in rest.iter().rev() {
        if g.states[i].auto_reduce {
            trim += 1;
        } else {
            break;
        }
    }
    let (kept, trailing) = rest.split_at(rest.len() - trim);

    let mut new_order: Vec<usize> = Vec::with_capacity(n);
    new_order.push(0);
    new_order.extend_from_slice(kept);
    new_order.extend_from_slice(trailing);

    let mut remap = vec![StateId(0); n];
    for (new_idx, &old_idx) in new_order.iter().enumerate() {
        remap[old_idx] = StateId(new_idx as u32);
    }

    let mut new_states = Vec::with_capacity(n);
    for &old_idx in &new_order {
        let mut state = g.states[old_idx].clone();
        state.statenum = remap[old_idx];
        for a in state.actions.iter_mut() {
            if a.kind == ActionKind::Shift {
                if let ActionPayload::Shift(target) = a.payload {
                    a.payload = ActionPayload::Shift(remap[target.index()]);
                }
            }
        }
        new_states.push(state);
    }
    g.states = new_states;
    g.nxstate = n - trim;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(rules: Vec<(&str, Vec<&str>)>, start: &str) -> Grammar {
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
        g.resolve_precedence();
        crate::first::run(&mut g);
        crate::lr0::build(&mut g).unwrap();
        crate::follow::run(&mut g);
        crate::synth::synthesize_actions(&mut g);
        crate::synth::resolve_conflicts(&mut g);
        crate::compress::run(&mut g);
        run(&mut g);
        g
    }

    #[test]
    fn start_state_stays_pinned_at_zero() {
        let g = pipeline(
            vec![("e", vec!["e", "Plus", "e"]), ("e", vec!["Id"])],
            "e",
        );
        assert_eq!(g.states[0].statenum, StateId(0));
    }

    #[test]
    fn nxstate_excludes_trailing_auto_reduce_states() {
        let g = pipeline(vec![("e", vec!["Id"])], "e");
        assert!(g.nxstate <= g.states.len());
        // The lone post-shift state reduces unconditionally.
        assert!(g.states[g.nxstate..].iter().all(|s| s.auto_reduce));
    }

    #[test]
    fn shift_targets_are_remapped_consistently() {
        let g = pipeline(
            vec![("e", vec!["e", "Plus", "e"]), ("e", vec!["Id"])],
            "e",
        );
        for state in &g.states {
            for a in &state.actions {
                if let ActionPayload::Shift(target) = &a.payload {
                    assert_eq!(g.states[target.index()].statenum, *target);
                }
            }
        }
    }
}
