//! The `.out` human-readable report: one block per state listing its
//! configurations and actions, plus a summary line. Grounded on the same
//! state/action records the emitter reads, so the report and the generated
//! parser can never disagree about what a state does.

use std::fmt::Write as _;

use gramforge_core::action::ActionKind;
use gramforge_core::diagnostic::Diagnostic;
use gramforge_core::grammar::Grammar;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// `-b`: print only the basis configurations, not the full closure.
    pub basis_only: bool,
    /// `-p`: include conflicts the precedence resolver already settled.
    pub show_resolved_conflicts: bool,
    /// `-s`: append the statistics summary line.
    pub statistics: bool,
}

fn config_text(g: &Grammar, cfg_id: gramforge_core::ids::ConfigId) -> String {
    let cfg = g.config(cfg_id);
    let rule = g.rule(cfg.rule);
    let mut parts: Vec<String> = rule.rhs.iter().map(|&s| g.symbol(s).name.clone()).collect();
    parts.insert(cfg.dot as usize, ".".to_string());
    format!("{} ::= {}", g.symbol(rule.lhs).name, parts.join(" "))
}

fn action_text(g: &Grammar, a: &gramforge_core::action::Action, opts: &ReportOptions) -> Option<String> {
    let lookahead = &g.symbol(a.lookahead).name;
    let body = match (&a.kind, &a.payload) {
        (ActionKind::Shift, gramforge_core::action::ActionPayload::Shift(s)) => format!("shift {s}"),
        (ActionKind::ShiftReduce, gramforge_core::action::ActionPayload::ShiftReduce(r)) => {
            format!("shift-reduce rule {}", g.rule(*r).i_rule)
        }
        (ActionKind::Reduce, gramforge_core::action::ActionPayload::Reduce(r)) => {
            format!("reduce rule {}", g.rule(*r).i_rule)
        }
        (ActionKind::Accept, _) => "accept".to_string(),
        (ActionKind::Error, _) => "error".to_string(),
        (ActionKind::SrConflict, _) | (ActionKind::RrConflict, _) | (ActionKind::SsConflict, _) => {
            format!("** unresolved conflict ({:?}) **", a.kind)
        }
        (ActionKind::ShResolved, _) | (ActionKind::RdResolved, _) => {
            if !opts.show_resolved_conflicts {
                return None;
            }
            format!("(resolved {:?})", a.kind)
        }
        (ActionKind::NotUsed, _) => return None,
        _ => return None,
    };
    Some(format!("    {lookahead} {body}"))
}

pub fn render(g: &Grammar, diagnostics: &[Diagnostic], opts: &ReportOptions) -> String {
    let mut out = String::new();
    for (idx, state) in g.states[..g.nxstate].iter().enumerate() {
        writeln!(out, "State {idx}:").unwrap();
        let items = if opts.basis_only { &state.basis } else { &state.closure };
        for &cfg_id in items {
            writeln!(out, "    {}", config_text(g, cfg_id)).unwrap();
        }
        for a in &state.actions {
            if let Some(line) = action_text(g, a, opts) {
                writeln!(out, "{line}").unwrap();
            }
        }
        if let Some(r) = state.default_reduce {
            writeln!(out, "    {{default}} reduce rule {}", g.rule(r).i_rule).unwrap();
        }
        writeln!(out).unwrap();
    }

    if !diagnostics.is_empty() {
        writeln!(out, "Diagnostics:").unwrap();
        for d in diagnostics {
            writeln!(out, "  {d}").unwrap();
        }
        writeln!(out).unwrap();
    }

    if opts.statistics {
        let conflict_count = g.states[..g.nxstate]
            .iter()
            .flat_map(|s| s.actions.iter())
            .filter(|a| matches!(a.kind, ActionKind::SrConflict | ActionKind::RrConflict | ActionKind::SsConflict))
            .count();
        writeln!(
            out,
            "{} terminals, {} nonterminals, {} rules, {} states, {} conflicts",
            g.nterminal,
            g.nsymbol() - g.nterminal,
            g.rules.len(),
            g.nxstate,
            conflict_count
        )
        .unwrap();
    }

    out
}
