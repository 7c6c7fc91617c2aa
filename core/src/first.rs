//! Stage C: lambda (nullability) and FIRST-set fixed-point analysis.
//!
//! Grounded on the teacher's `first_sets`/fixed-point shape (iterate until a
//! full pass makes no `added` progress), generalized to operate over the
//! index arenas instead of `BTreeMap`.

use crate::grammar::Grammar;
use crate::symbol::SymbolKind;

/// Phase 1: `lambda(A) ⇔ ∃ rule A → α such that every symbol in α is
/// lambda` (the empty RHS trivially qualifies).
pub fn compute_lambda(g: &mut Grammar) {
    loop {
        let mut progress = false;
        for rule in g.rules.iter() {
            if g.symbols[rule.lhs.index()].lambda {
                continue;
            }
            let all_lambda = rule.rhs.iter().all(|&s| match g.symbols[s.index()].kind {
                SymbolKind::Nonterminal => g.symbols[s.index()].lambda,
                _ => false,
            });
            if all_lambda {
                g.symbols[rule.lhs.index()].lambda = true;
                progress = true;
            }
        }
        if !progress {
            break;
        }
    }
}

/// Phase 2: for each rule, walk the RHS left to right adding FIRST
/// contributions and stopping at the first non-lambda symbol.
pub fn compute_first(g: &mut Grammar) {
    loop {
        let mut progress = false;
        for rule in g.rules.iter() {
            let lhs = rule.lhs;
            for &sym_id in rule.rhs.iter() {
                let kind = g.symbols[sym_id.index()].kind;
                match kind {
                    SymbolKind::Terminal => {
                        let grew = g.symbols[lhs.index()].first.insert(sym_id.index());
                        progress |= grew;
                        break;
                    }
                    SymbolKind::Multiterminal => {
                        let constituents = g.symbols[sym_id.index()].constituents.clone();
                        for c in constituents {
                            let grew = g.symbols[lhs.index()].first.insert(c.index());
                            progress |= grew;
                        }
                        break;
                    }
                    SymbolKind::Nonterminal => {
                        if sym_id == lhs && !g.symbols[lhs.index()].lambda {
                            // Self-reference: skip without contributing
                            // unless self is already lambda.
                            break;
                        }
                        let rhs_first = g.symbols[sym_id.index()].first.clone();
                        let grew = g.symbols[lhs.index()].first.union_from(&rhs_first);
                        progress |= grew;
                        if !g.symbols[sym_id.index()].lambda {
                            break;
                        }
                    }
                }
            }
        }
        if !progress {
            break;
        }
    }
}

pub fn run(g: &mut Grammar) {
    compute_lambda(g);
    compute_first(g);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    /// S -> A B
    /// A -> 'a'
    /// A ->            (lambda)
    /// B -> 'b'
    fn grammar_with_optional_a() -> Grammar {
        let mut g = Grammar::new();
        let s = g.intern("s");
        let a = g.intern("a");
        let b = g.intern("b");
        let ta = g.intern("A");
        let tb = g.intern("B");
        g.start_symbol = Some(s);
        g.add_rule(s, vec![a, b]);
        g.add_rule(a, vec![ta]);
        g.add_rule(a, vec![]);
        g.add_rule(b, vec![tb]);
        g.sort_and_renumber_symbols();
        g
    }

    #[test]
    fn lambda_fixed_point_matches_definition() {
        let mut g = grammar_with_optional_a();
        compute_lambda(&mut g);
        let a = g.symbol_by_name("a").unwrap();
        let b = g.symbol_by_name("b").unwrap();
        let s = g.symbol_by_name("s").unwrap();
        assert!(g.symbol(a).lambda);
        assert!(!g.symbol(b).lambda);
        assert!(!g.symbol(s).lambda); // S needs both A and B; B is not lambda
    }

    #[test]
    fn first_set_includes_terminal_that_can_begin_derivation_and_nothing_else() {
        let mut g = grammar_with_optional_a();
        run(&mut g);
        let s = g.symbol_by_name("s").unwrap();
        let ta = g.symbol_by_name("A").unwrap();
        let tb = g.symbol_by_name("B").unwrap();
        // FIRST(S) = FIRST(A) ∪ (FIRST(B) because A is nullable) = {A, B}
        assert!(g.symbol(s).first.contains(ta.index()));
        assert!(g.symbol(s).first.contains(tb.index()));
        assert_eq!(g.symbol(s).first.len(), 2);
    }

    #[test]
    fn self_referencing_rule_does_not_loop_forever() {
        // e ::= e Plus e | Id
        let mut g = Grammar::new();
        let e = g.intern("e");
        let plus = g.intern("Plus");
        let id = g.intern("Id");
        g.start_symbol = Some(e);
        g.add_rule(e, vec![e, plus, e]);
        g.add_rule(e, vec![id]);
        g.sort_and_renumber_symbols();
        run(&mut g);
        assert!(g.symbol(e).first.contains(id.index()));
        assert_eq!(g.symbol(e).first.len(), 1);
    }
}
