//! Stage A (symbol & rule registry) and stage B (precedence resolution).
//!
//! Grounded on the teacher crate's `Grammar<T, N, A>` (interning by name,
//! per-LHS rule chains) generalized from generic type parameters to the
//! index-arena design the spec's "cyclic object graph" note calls for.

use std::collections::HashMap;

use crate::config::Config;
use crate::ids::{ConfigId, RuleId, SymbolId};
use crate::rule::Rule;
use crate::state::State;
use crate::symbol::{Associativity, Symbol, SymbolKind};

/// Name reserved for the synthetic "no lookahead survives to look at" -- the
/// error-free placeholder `$`, pre-interned per §3.
pub const ERROR_SYMBOL_NAME: &str = "error";
/// Synthetic lookahead used by a defaulted reduce (§3, §4.G).
pub const DEFAULT_SYMBOL_NAME: &str = "{default}";
/// The end-of-input terminal, pinned to symbol index 0 by
/// [`Grammar::sort_and_renumber_symbols`], per §6. A leading `{` makes the
/// name unreachable from grammar text (§6b requires identifiers to start
/// with a letter or `_`), so no user terminal can ever collide with it.
pub const EOF_SYMBOL_NAME: &str = "{eof}";

#[derive(Debug, Default, Clone)]
pub struct Grammar {
    pub symbols: Vec<Symbol>,
    pub rules: Vec<Rule>,
    pub configs: Vec<Config>,
    pub states: Vec<State>,
    /// Recycled `ConfigId`s from basis-dedup during state construction
    /// (§5, "freelist").
    pub config_freelist: Vec<ConfigId>,

    name_to_symbol: HashMap<String, SymbolId>,
    pub start_symbol: Option<SymbolId>,
    /// The grammar author's own start symbol, set once in
    /// [`crate::builder::Builder::finish_with`] before `start_symbol` is
    /// overwritten with the synthetic `{start}` augmenting symbol. Needed
    /// only by [`crate::analyze`]'s start-symbol-on-rhs check.
    pub user_start_symbol: Option<SymbolId>,
    pub wildcard: Option<SymbolId>,
    pub error_symbol: Option<SymbolId>,
    pub default_symbol: Option<SymbolId>,
    pub eof_symbol: Option<SymbolId>,
    pub nterminal: usize,
    /// Number of states that still need a row in the packed action table
    /// after trailing auto-reduce states are trimmed (§4.H). Zero until
    /// [`crate::resort::run`] has executed.
    pub nxstate: usize,

    prec_counter: i32,
    sorted: bool,
}

impl Grammar {
    pub fn new() -> Self {
        let mut g = Grammar::default();
        // `{eof}` and `error` are pre-interned so the core can always
        // address the end-of-input terminal and rule text can reference
        // `error`.
        g.eof_symbol = Some(g.intern(EOF_SYMBOL_NAME));
        g.intern(ERROR_SYMBOL_NAME);
        g
    }

    /// The only way symbols are created (§4.A). Kind is inferred from the
    /// first character unless `name` is one of the synthetic terminals.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.name_to_symbol.get(name) {
            return id;
        }
        let id = SymbolId(self.symbols.len() as u32);
        let kind = if name == DEFAULT_SYMBOL_NAME || name == EOF_SYMBOL_NAME {
            SymbolKind::Terminal
        } else {
            Symbol::infer_kind(name)
        };
        self.symbols.push(Symbol::new(name, id, kind));
        self.name_to_symbol.insert(name.to_string(), id);
        id
    }

    /// Explicitly register a multiterminal (`%token_class`); `intern` never
    /// infers this kind on its own.
    pub fn intern_multiterminal(&mut self, name: &str, constituents: Vec<SymbolId>) -> SymbolId {
        let id = self.intern(name);
        let sym = &mut self.symbols[id.index()];
        sym.kind = SymbolKind::Multiterminal;
        sym.constituents = constituents;
        id
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn symbol_by_name(&self, name: &str) -> Option<SymbolId> {
        self.name_to_symbol.get(name).copied()
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub fn rule_mut(&mut self, id: RuleId) -> &mut Rule {
        &mut self.rules[id.index()]
    }

    /// Append a new production in parse order; returns its (pre-renumbering)
    /// `RuleId`, which equals `index` until [`Grammar::number_rules`] runs.
    pub fn add_rule(&mut self, lhs: SymbolId, rhs: Vec<SymbolId>) -> RuleId {
        let index = self.rules.len() as u32;
        let id = RuleId(index);
        self.symbol_mut(lhs).rules.push(id);
        self.rules.push(Rule::new(index, lhs, rhs));
        id
    }

    /// `%left` / `%right` / `%nonassoc`: bump the precedence counter once per
    /// call, then stamp it (with associativity) on every named terminal.
    pub fn declare_precedence_band(&mut self, assoc: Associativity, terminals: &[SymbolId]) {
        self.prec_counter += 1;
        for &t in terminals {
            let sym = self.symbol_mut(t);
            sym.precedence = self.prec_counter;
            sym.associativity = assoc;
        }
    }

    /// Stage A's post-parse sort: the end-of-input terminal first (pinned to
    /// index 0 per §6), then the rest of the terminals, then nonterminals,
    /// then multiterminals, with `{default}` placed just before the
    /// multiterminal block so it gets the largest non-multiterminal index.
    /// Dense indices are reassigned afterward.
    ///
    /// Open question (§9.1, carried forward unmodified): the ASCII-case
    /// comparison used to group terminals before nonterminals is exactly the
    /// reference design's; this repository's grammar dialect requires ASCII
    /// identifiers (§6b), which sidesteps the multibyte ambiguity without
    /// "fixing" the underlying sort key.
    pub fn sort_and_renumber_symbols(&mut self) {
        if self.eof_symbol.is_none() {
            self.eof_symbol = Some(self.intern(EOF_SYMBOL_NAME));
        }
        if self.default_symbol.is_none() {
            self.default_symbol = Some(self.intern(DEFAULT_SYMBOL_NAME));
        }
        let eof_id = self.eof_symbol.unwrap();
        let default_id = self.default_symbol.unwrap();

        let mut order: Vec<SymbolId> = (0..self.symbols.len() as u32).map(SymbolId).collect();
        order.sort_by_key(|&id| {
            let sym = self.symbol(id);
            let band = if id == eof_id {
                0
            } else {
                match sym.kind {
                    SymbolKind::Terminal if id != default_id => 1,
                    SymbolKind::Nonterminal => 2,
                    SymbolKind::Terminal if id == default_id => 3,
                    _ => 4, // Multiterminal
                }
            };
            (band, sym.name.clone())
        });

        let mut remap = vec![SymbolId(0); self.symbols.len()];
        for (new_index, &old_id) in order.iter().enumerate() {
            remap[old_id.index()] = SymbolId(new_index as u32);
        }

        let mut new_symbols = vec![self.symbols[0].clone(); self.symbols.len()];
        for (new_index, &old_id) in order.iter().enumerate() {
            let mut sym = self.symbols[old_id.index()].clone();
            sym.id = SymbolId(new_index as u32);
            sym.constituents = sym.constituents.iter().map(|&c| remap[c.index()]).collect();
            sym.fallback = sym.fallback.map(|f| remap[f.index()]);
            sym.rules.clear(); // rebuilt below from the (unmoved) rule arena
            new_symbols[new_index] = sym;
        }
        self.symbols = new_symbols;

        for rule in self.rules.iter_mut() {
            rule.lhs = remap[rule.lhs.index()];
            for r in rule.rhs.iter_mut() {
                *r = remap[r.index()];
            }
            if let Some(p) = rule.prec_sym {
                rule.prec_sym = Some(remap[p.index()]);
            }
        }
        for (rid, rule) in self.rules.iter().enumerate() {
            self.symbols[rule.lhs.index()].rules.push(RuleId(rid as u32));
        }

        self.name_to_symbol = self
            .symbols
            .iter()
            .map(|s| (s.name.clone(), s.id))
            .collect();

        self.nterminal = self
            .symbols
            .iter()
            .position(|s| s.kind == SymbolKind::Nonterminal)
            .unwrap_or(self.symbols.len());

        if let Some(start) = self.start_symbol {
            self.start_symbol = Some(remap[start.index()]);
        }
        if let Some(w) = self.wildcard {
            self.wildcard = Some(remap[w.index()]);
        }
        if let Some(e) = self.error_symbol {
            self.error_symbol = Some(remap[e.index()]);
        }
        self.default_symbol = Some(remap[default_id.index()]);
        self.eof_symbol = Some(remap[eof_id.index()]);
        self.error_symbol = self.error_symbol.or_else(|| self.symbol_by_name(ERROR_SYMBOL_NAME));

        self.sorted = true;
    }

    /// Two-wave numbering (§4.A): rules with user action code first, in
    /// parse order, then the rest, in parse order.
    pub fn number_rules(&mut self) {
        let mut with_action: Vec<u32> = Vec::new();
        let mut without_action: Vec<u32> = Vec::new();
        for (i, r) in self.rules.iter().enumerate() {
            if r.action_code.is_some() {
                with_action.push(i as u32);
            } else {
                without_action.push(i as u32);
            }
        }
        let mut i_rule = vec![0u32; self.rules.len()];
        let mut next = 0u32;
        for idx in with_action.into_iter().chain(without_action) {
            i_rule[idx as usize] = next;
            next += 1;
        }
        for (idx, rule) in self.rules.iter_mut().enumerate() {
            rule.i_rule = RuleId(i_rule[idx]);
        }
    }

    /// Stage B: for each rule with no explicit precedence symbol, scan the
    /// RHS left to right and inherit from the first symbol with a defined
    /// precedence (for a Multiterminal, scan its constituents left to
    /// right).
    pub fn resolve_precedence(&mut self) {
        for rule in self.rules.iter_mut() {
            if rule.has_explicit_prec {
                continue;
            }
            'rhs: for &sym_id in rule.rhs.iter() {
                let sym = &self.symbols[sym_id.index()];
                match sym.kind {
                    SymbolKind::Multiterminal => {
                        for &c in sym.constituents.iter() {
                            let csym = &self.symbols[c.index()];
                            if csym.precedence >= 0 {
                                rule.prec_sym = Some(c);
                                break 'rhs;
                            }
                        }
                    }
                    _ => {
                        if sym.precedence >= 0 {
                            rule.prec_sym = Some(sym_id);
                            break 'rhs;
                        }
                    }
                }
            }
        }
    }

    pub fn nsymbol(&self) -> usize {
        self.symbols.len()
    }

    pub fn alloc_config(&mut self, rule: RuleId, dot: u32) -> ConfigId {
        if let Some(id) = self.config_freelist.pop() {
            self.configs[id.index()] = Config::new(rule, dot);
            id
        } else {
            let id = ConfigId(self.configs.len() as u32);
            self.configs.push(Config::new(rule, dot));
            id
        }
    }

    pub fn config(&self, id: ConfigId) -> &Config {
        &self.configs[id.index()]
    }

    pub fn config_mut(&mut self, id: ConfigId) -> &mut Config {
        &mut self.configs[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_grammar() -> Grammar {
        // S ::= E
        // E ::= E Plus E
        // E ::= Id
        let mut g = Grammar::new();
        let s = g.intern("s");
        let e = g.intern("e");
        let plus = g.intern("Plus");
        let id = g.intern("Id");
        g.start_symbol = Some(s);
        g.add_rule(s, vec![e]);
        g.add_rule(e, vec![e, plus, e]);
        g.add_rule(e, vec![id]);
        g
    }

    #[test]
    fn symbol_numbering_groups_terminals_then_nonterminals() {
        let mut g = toy_grammar();
        g.sort_and_renumber_symbols();

        for (i, sym) in g.symbols.iter().enumerate() {
            if i < g.nterminal {
                assert_eq!(sym.kind, SymbolKind::Terminal, "{}", sym.name);
            }
        }
        let plus = g.symbol_by_name("Plus").unwrap();
        let id = g.symbol_by_name("Id").unwrap();
        let s = g.symbol_by_name("s").unwrap();
        let e = g.symbol_by_name("e").unwrap();
        assert!(plus.index() < g.nterminal);
        assert!(id.index() < g.nterminal);
        assert!(s.index() >= g.nterminal);
        assert!(e.index() >= g.nterminal);
    }

    #[test]
    fn two_wave_rule_numbering_puts_action_rules_first() {
        let mut g = toy_grammar();
        g.rules[2].action_code = Some("x".into()); // E ::= Id
        g.number_rules();
        assert_eq!(g.rules[2].i_rule.0, 0);
        // the other two rules keep relative parse order after the action rule
        assert_eq!(g.rules[0].i_rule.0, 1);
        assert_eq!(g.rules[1].i_rule.0, 2);
    }

    #[test]
    fn precedence_inherits_from_first_defined_rhs_symbol() {
        let mut g = toy_grammar();
        let plus = g.symbol_by_name("Plus").unwrap();
        g.declare_precedence_band(Associativity::Left, &[plus]);
        g.resolve_precedence();
        let e_plus_e = &g.rules[1];
        assert_eq!(e_plus_e.prec_sym, Some(plus));
    }
}
