// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stack traversals shared by the trees.

use alloc::vec::Vec;

use crate::node::Hierarchy;
use crate::scratch::{Candidate, Scratch};

/// What a pruning predicate decided for a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Visit {
    /// Nothing under the node can match.
    Skip,
    /// Some entries may match; test children, or the entries of a leaf.
    Descend,
    /// Take the node's whole range without visiting its children.
    Whole,
}

/// Depth-first bounds-pruned traversal.
///
/// `classify` sees every reached non-empty node's bounds. `emit` receives the entry
/// indices of each leaf reached through [`Visit::Descend`] (flag `false`) and of each node
/// answered with [`Visit::Whole`] (flag `true`).
pub(crate) fn walk<B: Copy>(
    h: &Hierarchy<B>,
    stack: &mut Vec<u32>,
    mut classify: impl FnMut(&B) -> Visit,
    mut emit: impl FnMut(&[u32], bool),
) {
    stack.clear();
    stack.push(h.root);
    while let Some(id) = stack.pop() {
        let node = h.node(id);
        if node.is_empty() {
            continue;
        }
        match classify(&node.bounds()) {
            Visit::Skip => {}
            Visit::Whole => emit(h.slice(node), true),
            Visit::Descend => {
                if node.is_leaf() {
                    emit(h.slice(node), false);
                } else {
                    stack.extend(node.children().rev());
                }
            }
        }
    }
}

/// Greedy approximate nearest-neighbor search.
///
/// Descends into the child with the smallest `child_key` until the node is a leaf or holds
/// at most `count` entries, remembering the skipped siblings. The reached node's entries
/// are gathered, then siblings are taken whole, most recent and nearest first, until
/// `count` distinct values are among the candidates. `same_value` decides whether two
/// entries carry equal values; only the nearest entry of each value is kept.
///
/// The candidates are sorted by distance then entry index, deduplicated, and truncated to
/// `count`; the result is left in `scratch.candidates`.
///
/// Entries across a partition boundary from the descent path can be missed.
pub(crate) fn greedy_nearest<B: Copy>(
    h: &Hierarchy<B>,
    count: usize,
    scratch: &mut Scratch,
    child_key: impl Fn(&B) -> f64,
    entry_distance: impl Fn(u32) -> f64,
    same_value: impl Fn(u32, u32) -> bool,
) {
    let Scratch {
        stack,
        candidates,
        seen,
        ..
    } = scratch;
    stack.clear();
    candidates.clear();
    seen.clear();
    if count == 0 {
        return;
    }

    let mut current = h.root;
    loop {
        let node = h.node(current);
        if node.is_leaf() || node.len() <= count {
            break;
        }
        let mut chosen: Option<(f64, u32)> = None;
        for child in node.children() {
            let key = child_key(&h.node(child).bounds());
            if chosen.is_none_or(|(best, _)| key < best) {
                chosen = Some((key, child));
            }
        }
        let Some((_, next)) = chosen else {
            break;
        };
        // Farthest sibling lands at the bottom so the nearest pops first.
        let mark = stack.len();
        stack.extend(node.children().filter(|&c| c != next));
        stack[mark..].sort_unstable_by(|&a, &b| {
            child_key(&h.node(b).bounds()).total_cmp(&child_key(&h.node(a).bounds()))
        });
        current = next;
    }

    // `seen` holds one entry per distinct value gathered so far, capped at `count`.
    let gather = |candidates: &mut Vec<Candidate>, seen: &mut Vec<u32>, id: u32| {
        for &i in h.slice(h.node(id)) {
            candidates.push(Candidate::new(entry_distance(i), i));
            if seen.len() < count && !seen.iter().any(|&s| same_value(s, i)) {
                seen.push(i);
            }
        }
    };
    gather(candidates, seen, current);
    while seen.len() < count {
        let Some(id) = stack.pop() else {
            break;
        };
        gather(candidates, seen, id);
    }

    candidates.sort_unstable();
    let mut kept = 0;
    for read in 0..candidates.len() {
        if kept == count {
            break;
        }
        let c = candidates[read];
        if !candidates[..kept].iter().any(|k| same_value(k.id, c.id)) {
            candidates[kept] = c;
            kept += 1;
        }
    }
    candidates.truncate(kept);
}
