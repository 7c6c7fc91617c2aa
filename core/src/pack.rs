//! Stage I: offset packing.
//!
//! Every kept state contributes up to two sparse rows — one over terminal
//! lookaheads, one over nonterminal lookaheads (gotos) — keyed by raw symbol
//! index. Rows are packed into one shared linear array by scanning
//! candidate base offsets: an offset fits if every entry either lands on an
//! empty slot or one already holding the same `(symbol, value)` pair (the
//! dedup case, letting two rows that agree on an entry share it). The first
//! fitting offset wins; if none fits within the table built so far, the
//! offset that appends past the end always fits, which guarantees
//! termination.

use crate::encode::Encoding;
use crate::grammar::Grammar;
use crate::state::NO_OFFSET;

const EMPTY: i32 = -1;

pub struct PackedTables {
    pub action: Vec<i32>,
    /// Parallel "check" array: the symbol index that legitimately owns each
    /// slot, so a runtime probe at `offset + symbol` can confirm the hit
    /// before trusting `action[..]` (safety padding relies on this, not on
    /// bounds checking alone).
    pub lookahead: Vec<i32>,
    pub encoding: Encoding,
}

struct Row {
    entries: Vec<(usize, i32)>,
    state_idx: usize,
    is_terminal_axis: bool,
    /// Every raw symbol index a runtime probe against this row's state can
    /// present as a lookahead -- not just the symbols this row has a live
    /// action for. An offset is only safe if no symbol in this range that
    /// the row itself is silent on already has a foreign entry planted at
    /// `offset + symbol` (§4.I.1/§4.I.2); otherwise a probe for that
    /// symbol would read the foreign row's action instead of falling
    /// through to this state's own default.
    axis: std::ops::Range<usize>,
}

fn build_rows(g: &Grammar, encoding: &Encoding) -> Vec<Row> {
    let mut rows = Vec::new();
    for state_idx in 0..g.nxstate {
        let mut tkn = Vec::new();
        let mut nt = Vec::new();
        for a in &g.states[state_idx].actions {
            if !a.is_live() {
                continue;
            }
            let sym = a.lookahead.index();
            let val = encoding.encode(g, a);
            if sym < g.nterminal {
                tkn.push((sym, val));
            } else {
                nt.push((sym, val));
            }
        }
        if !tkn.is_empty() {
            rows.push(Row { entries: tkn, state_idx, is_terminal_axis: true, axis: 0..g.nterminal });
        }
        if !nt.is_empty() {
            rows.push(Row { entries: nt, state_idx, is_terminal_axis: false, axis: g.nterminal..g.nsymbol() });
        }
    }
    // Pack the biggest rows first; they are the hardest to find a hole for.
    rows.sort_by_key(|r| std::cmp::Reverse(r.entries.len()));
    rows
}

fn fits(lookahead: &[i32], action: &[i32], row: &Row, offset: usize) -> bool {
    for &(sym, val) in &row.entries {
        let pos = offset + sym;
        if pos < lookahead.len() && lookahead[pos] != EMPTY {
            if lookahead[pos] != sym as i32 || action[pos] != val {
                return false;
            }
        }
    }
    // Reverse collision scan (§4.I.1/§4.I.2): every symbol this row stays
    // silent on must land on an empty slot, or a probe for it would
    // wrongly pick up whichever other row already claimed that slot.
    for sym in row.axis.clone() {
        if row.entries.iter().any(|&(s, _)| s == sym) {
            continue;
        }
        let pos = offset + sym;
        if pos < lookahead.len() && lookahead[pos] != EMPTY {
            return false;
        }
    }
    true
}

fn place(lookahead: &mut Vec<i32>, action: &mut Vec<i32>, row: &[(usize, i32)], offset: usize, no_action: i32) {
    let max_pos = row.iter().map(|&(sym, _)| offset + sym).max().unwrap_or(offset);
    if lookahead.len() <= max_pos {
        lookahead.resize(max_pos + 1, EMPTY);
        action.resize(max_pos + 1, no_action);
    }
    for &(sym, val) in row {
        if lookahead[offset + sym] == EMPTY {
            lookahead[offset + sym] = sym as i32;
            action[offset + sym] = val;
        }
    }
}

fn find_offset(lookahead: &[i32], action: &[i32], row: &Row) -> usize {
    let table_len = lookahead.len();
    for offset in 0..=table_len {
        if fits(lookahead, action, row, offset) {
            return offset;
        }
    }
    table_len
}

/// Run the packer, writing `i_tkn_ofst` / `i_nt_ofst` back onto each state.
#[tracing::instrument(level = "debug", skip(g))]
pub fn run(g: &mut Grammar) -> PackedTables {
    let encoding = Encoding::new(g.nxstate, g.rules.len());
    let rows = build_rows(g, &encoding);

    let mut lookahead: Vec<i32> = Vec::new();
    let mut action: Vec<i32> = Vec::new();

    for row in &rows {
        let offset = find_offset(&lookahead, &action, row);
        place(&mut lookahead, &mut action, &row.entries, offset, encoding.no_action);
        let ofst = offset as i64;
        if row.is_terminal_axis {
            g.states[row.state_idx].i_tkn_ofst = ofst;
        } else {
            g.states[row.state_idx].i_nt_ofst = ofst;
        }
    }

    // Terminal-row safety padding: append `nterminal` sentinel slots so a
    // computed `offset + symbol` that lands past every real row's extent
    // still reads a defined (and always-rejecting) check value.
    let pad = g.nterminal.max(1);
    lookahead.extend(std::iter::repeat(EMPTY).take(pad));
    action.extend(std::iter::repeat(encoding.no_action).take(pad));

    PackedTables { action, lookahead, encoding }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Associativity;

    fn pipeline(rules: Vec<(&str, Vec<&str>)>, start: &str, precedence: Vec<(&str, Associativity)>) -> Grammar {
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
        crate::compress::run(&mut g);
        crate::resort::run(&mut g);
        g
    }

    #[test]
    fn every_kept_state_with_live_terminal_actions_gets_a_resolvable_offset() {
        let mut g = pipeline(
            vec![
                ("e", vec!["e", "Plus", "e"]),
                ("e", vec!["e", "Star", "e"]),
                ("e", vec!["Id"]),
            ],
            "e",
            vec![("Plus", Associativity::Left), ("Star", Associativity::Left)],
        );
        let tables = run(&mut g);
        for state_idx in 0..g.nxstate {
            let state = &g.states[state_idx];
            for a in &state.actions {
                if !a.is_live() {
                    continue;
                }
                let sym = a.lookahead.index();
                let ofst = if sym < g.nterminal { state.i_tkn_ofst } else { state.i_nt_ofst };
                assert_ne!(ofst, NO_OFFSET);
                let pos = (ofst as usize) + sym;
                assert_eq!(tables.lookahead[pos], sym as i32);
                assert_eq!(tables.action[pos], tables.encoding.encode(&g, a));
            }
        }
    }

    #[test]
    fn padding_extends_past_the_last_real_row() {
        let mut g = pipeline(vec![("e", vec!["Id"])], "e", vec![]);
        let tables = run(&mut g);
        assert!(tables.action.len() >= g.nterminal);
    }

    /// Two unrelated rows must never share a slot outside their own
    /// entries, even when that slot happens to be empty from the
    /// candidate row's own point of view: a runtime probe against the
    /// second row for the first row's symbol must not read the first
    /// row's action (§4.I.1/§4.I.2).
    #[test]
    fn offset_is_rejected_if_it_would_alias_a_foreign_rows_slot() {
        let row_a = Row { entries: vec![(2, 100)], state_idx: 0, is_terminal_axis: true, axis: 0..5 };
        let row_b = Row { entries: vec![(0, 200)], state_idx: 1, is_terminal_axis: true, axis: 0..5 };

        let mut lookahead: Vec<i32> = Vec::new();
        let mut action: Vec<i32> = Vec::new();

        let offset_a = find_offset(&lookahead, &action, &row_a);
        place(&mut lookahead, &mut action, &row_a.entries, offset_a, -1);

        // Offset 0 satisfies row_b's own entry (slot 0 is still empty) but
        // would leave row_b's axis symbol 2 sitting on row_a's slot.
        assert!(!fits(&lookahead, &action, &row_b, 0));

        let offset_b = find_offset(&lookahead, &action, &row_b);
        assert_ne!(offset_b, 0, "packer must not reuse an offset that aliases a foreign row's slot");
        place(&mut lookahead, &mut action, &row_b.entries, offset_b, -1);

        // A probe against row_b for symbol 2 (row_b has no action for it)
        // must not resolve to row_a's action.
        let probe = offset_b + 2;
        let aliases_row_a = probe < lookahead.len() && lookahead[probe] == 2 && action[probe] == 100;
        assert!(!aliases_row_a);
    }
}
