//! Stage E: follow-set propagation.
//!
//! §4.D left every config with a `bplp` list ("whenever this source's follow
//! grows, union it into mine"). This stage inverts those edges into `fplp`
//! ("whenever my follow grows, push it to these targets") and then runs the
//! union to a fixed point, same shape as [`crate::first::compute_first`]'s
//! progress loop.

use crate::grammar::Grammar;
use crate::ids::ConfigId;

/// Build `fplp` from every config's `bplp` (§4.E.1): for each `(target,
/// source)` edge recorded during state construction, push `target` onto
/// `source.fplp`.
fn invert_plinks(g: &mut Grammar) {
    let mut edges: Vec<(ConfigId, ConfigId)> = Vec::new();
    for (i, config) in g.configs.iter().enumerate() {
        let target = ConfigId(i as u32);
        for &source in &config.bplp {
            edges.push((source, target));
        }
    }
    for (source, target) in edges {
        let fplp = &mut g.configs[source.index()].fplp;
        if !fplp.contains(&target) {
            fplp.push(target);
        }
    }
}

/// Union every config's follow-set into each of its `fplp` targets, looping
/// until a full pass makes no progress (§4.E.2).
fn propagate(g: &mut Grammar) {
    loop {
        let mut progress = false;
        for i in 0..g.configs.len() {
            let source_follow = g.configs[i].follow.clone();
            let targets = g.configs[i].fplp.clone();
            for target in targets {
                let grew = g.configs[target.index()].follow.union_from(&source_follow);
                progress |= grew;
            }
        }
        if !progress {
            break;
        }
    }
}

#[tracing::instrument(level = "debug", skip(g))]
pub fn run(g: &mut Grammar) {
    invert_plinks(g);
    propagate(g);
}
