//! The `State` entity (§3) and its bookkeeping fields. Construction lives in
//! [`crate::lr0`]; later stages (F–I) mutate the fields below in place.

use crate::action::Action;
use crate::ids::{ConfigId, RuleId, StateId};

/// Sentinel for "this state has no row in this axis" (§6).
pub const NO_OFFSET: i64 = -2_147_483_647;

#[derive(Debug, Clone)]
pub struct State {
    pub statenum: StateId,
    /// Basis configurations, sorted by `(rule.index, dot)` — this is the
    /// state's identity (§4.D.2).
    pub basis: Vec<ConfigId>,
    /// Closure: basis plus every item added by the nonterminal-expansion
    /// rule.
    pub closure: Vec<ConfigId>,
    pub actions: Vec<Action>,
    pub n_tkn_act: u32,
    pub n_nt_act: u32,
    pub i_tkn_ofst: i64,
    pub i_nt_ofst: i64,
    pub default_reduce: Option<RuleId>,
    pub auto_reduce: bool,
}

impl State {
    pub fn new(statenum: StateId, basis: Vec<ConfigId>) -> Self {
        State {
            statenum,
            basis,
            closure: Vec::new(),
            actions: Vec::new(),
            n_tkn_act: 0,
            n_nt_act: 0,
            i_tkn_ofst: NO_OFFSET,
            i_nt_ofst: NO_OFFSET,
            default_reduce: None,
            auto_reduce: false,
        }
    }
}

/// `h = 0; for each basis item (r, d): h = h*571 + r.index*37 + d` (§4.J).
pub fn hash_basis(items: &[(RuleId, u32)]) -> u64 {
    let mut h: u64 = 0;
    for &(r, d) in items {
        h = h
            .wrapping_mul(571)
            .wrapping_add((r.0 as u64).wrapping_mul(37))
            .wrapping_add(d as u64);
    }
    h
}
