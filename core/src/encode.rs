//! §6c: the integer encoding of a table action.
//!
//! One namespace, partitioned by value range, so the generated runtime can
//! tell which case it is with a handful of comparisons instead of a tagged
//! union:
//!
//! ```text
//! 0                      .. minShiftReduce-1   Shift to state N
//! minShiftReduce         .. errAction-1        Shift then reduce rule (N - minShiftReduce)
//! errAction                                    Error
//! accAction                                    Accept
//! noAction                                     No entry (never a valid code, only a sentinel)
//! minReduce              .. maxAction          Reduce rule (N - minReduce)
//! ```

use crate::action::{Action, ActionKind, ActionPayload};
use crate::grammar::Grammar;

#[derive(Debug, Clone, Copy)]
pub struct Encoding {
    pub min_shift_reduce: i32,
    pub err_action: i32,
    pub acc_action: i32,
    pub no_action: i32,
    pub min_reduce: i32,
    pub max_action: i32,
}

impl Encoding {
    pub fn new(nstate: usize, nrule: usize) -> Self {
        let min_shift_reduce = nstate as i32;
        let err_action = min_shift_reduce + nrule as i32;
        let acc_action = err_action + 1;
        let no_action = acc_action + 1;
        let min_reduce = no_action + 1;
        Encoding {
            min_shift_reduce,
            err_action,
            acc_action,
            no_action,
            min_reduce,
            max_action: min_reduce + nrule as i32 - 1,
        }
    }

    /// Encode one live action. Panics on a non-live action; callers must
    /// filter those out before reaching the packer.
    pub fn encode(&self, g: &Grammar, a: &Action) -> i32 {
        debug_assert!(a.is_live(), "attempted to encode a superseded action");
        match a.kind {
            ActionKind::Shift => match a.payload {
                ActionPayload::Shift(s) => s.0 as i32,
                _ => unreachable!("Shift action without a Shift payload"),
            },
            ActionKind::ShiftReduce => match a.payload {
                ActionPayload::ShiftReduce(r) => self.min_shift_reduce + g.rule(r).i_rule.0 as i32,
                _ => unreachable!("ShiftReduce action without a ShiftReduce payload"),
            },
            ActionKind::Reduce => match a.payload {
                ActionPayload::Reduce(r) => self.min_reduce + g.rule(r).i_rule.0 as i32,
                _ => unreachable!("Reduce action without a Reduce payload"),
            },
            ActionKind::Accept => self.acc_action,
            ActionKind::Error => self.err_action,
            ActionKind::NotUsed
            | ActionKind::SsConflict
            | ActionKind::SrConflict
            | ActionKind::RrConflict
            | ActionKind::ShResolved
            | ActionKind::RdResolved => unreachable!("non-live action reached the encoder"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_contiguous_and_ordered() {
        let e = Encoding::new(10, 4);
        assert_eq!(e.min_shift_reduce, 10);
        assert_eq!(e.err_action, 14);
        assert_eq!(e.acc_action, 15);
        assert_eq!(e.no_action, 16);
        assert_eq!(e.min_reduce, 17);
        assert_eq!(e.max_action, 20);
    }
}
