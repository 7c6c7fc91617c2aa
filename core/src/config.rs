//! Configurations (items) and propagation links (§3, §4.D, §4.E).

use crate::ids::{ConfigId, RuleId};
use crate::sets::TermSet;

/// `Incomplete` / `Complete` status used during successor construction
/// (§4.D) and follow-set propagation (§4.E); see §4.K.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Incomplete,
    Complete,
}

/// A rule plus a dot position, plus the LR(1) lookahead accumulated by
/// propagation.
#[derive(Debug, Clone)]
pub struct Config {
    pub rule: RuleId,
    pub dot: u32,
    pub follow: TermSet,
    /// Backward links: "whenever the source's follow-set grows, union it
    /// into mine." Populated during state construction (§4.D).
    pub bplp: Vec<ConfigId>,
    /// Forward links, derived from `bplp` by [`crate::follow::propagate`].
    pub fplp: Vec<ConfigId>,
    pub status: Status,
}

impl Config {
    pub fn new(rule: RuleId, dot: u32) -> Self {
        Config {
            rule,
            dot,
            follow: TermSet::new(),
            bplp: Vec::new(),
            fplp: Vec::new(),
            status: Status::Incomplete,
        }
    }
}
