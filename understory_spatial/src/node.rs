// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entries, nodes, and the flat node arena shared by all trees.
//!
//! Entries are stored once, in source order, and never move. Trees reorder a separate
//! index array so that every node covers one contiguous slice `[start, start + count)`
//! of it. Children of a node sit next to each other in the arena.

use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use crate::bounds::Bounds;
use crate::error::BuildError;

/// A value paired with its geometric key.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<V, G> {
    /// The caller's value, returned by queries.
    pub value: V,
    /// Point or box the value was indexed under.
    pub geometry: G,
}

/// A node of a built tree.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Node<B> {
    bounds: B,
    start: u32,
    count: u32,
    first_child: u32,
    child_count: u32,
}

impl<B: Copy> Node<B> {
    pub(crate) const fn leaf(bounds: B, start: u32, count: u32) -> Self {
        Self {
            bounds,
            start,
            count,
            first_child: 0,
            child_count: 0,
        }
    }

    pub(crate) const fn internal(
        bounds: B,
        start: u32,
        count: u32,
        first_child: u32,
        child_count: u32,
    ) -> Self {
        Self {
            bounds,
            start,
            count,
            first_child,
            child_count,
        }
    }

    /// Box enclosing every entry under this node.
    pub fn bounds(&self) -> B {
        self.bounds
    }

    /// True if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.child_count == 0
    }

    /// Number of entries under this node.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// True if no entries lie under this node.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Slice of the index array covered by this node.
    pub fn range(&self) -> Range<usize> {
        let start = self.start as usize;
        start..start + self.count as usize
    }

    pub(crate) fn children(&self) -> Range<u32> {
        self.first_child..self.first_child + self.child_count
    }

    pub(crate) fn set_bounds(&mut self, bounds: B) {
        self.bounds = bounds;
    }
}

/// Node arena plus the index permutation it partitions.
#[derive(Clone, Debug)]
pub(crate) struct Hierarchy<B> {
    pub(crate) nodes: Vec<Node<B>>,
    pub(crate) indices: Vec<u32>,
    pub(crate) root: u32,
}

impl<B: Copy> Hierarchy<B> {
    /// A single empty leaf.
    pub(crate) fn empty(bounds: B) -> Self {
        Self {
            nodes: vec![Node::leaf(bounds, 0, 0)],
            indices: Vec::new(),
            root: 0,
        }
    }

    pub(crate) fn root(&self) -> &Node<B> {
        &self.nodes[self.root as usize]
    }

    #[inline]
    pub(crate) fn node(&self, id: u32) -> &Node<B> {
        &self.nodes[id as usize]
    }

    /// Entry indices under `node`.
    #[inline]
    pub(crate) fn slice(&self, node: &Node<B>) -> &[u32] {
        &self.indices[node.range()]
    }

    /// Number of levels from the root to the deepest leaf, counting both.
    pub(crate) fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 1_usize)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for child in self.node(id).children() {
                stack.push((child, depth + 1));
            }
        }
        deepest
    }

    /// Index-array ranges of every leaf, in traversal order.
    pub(crate) fn leaf_ranges(&self) -> Vec<Range<usize>> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if node.is_leaf() {
                out.push(node.range());
            } else {
                stack.extend(node.children().rev());
            }
        }
        out
    }
}

/// Project every source element, rejecting invalid geometry.
///
/// Returns the entries in source order and the union of their boxes.
pub(crate) fn collect_entries<V, G, B, P, F>(
    source: impl IntoIterator<Item = V>,
    project: P,
    to_bounds: F,
) -> Result<(Vec<Entry<V, G>>, Option<B>), BuildError>
where
    B: Bounds,
    P: Fn(&V) -> G,
    F: Fn(&G) -> B,
{
    let source = source.into_iter();
    let mut entries = Vec::with_capacity(source.size_hint().0);
    let mut data: Option<B> = None;
    for (index, value) in source.enumerate() {
        let geometry = project(&value);
        let b = to_bounds(&geometry);
        if !b.is_valid() {
            return Err(BuildError::InvalidGeometry { index });
        }
        data = Some(match data {
            Some(d) => d.union(&b),
            None => b,
        });
        entries.push(Entry { value, geometry });
    }
    if u32::try_from(entries.len()).is_err() {
        return Err(BuildError::TooManyElements(entries.len()));
    }
    Ok((entries, data))
}

/// Root boundary: the data bounds grown by the caller's override, padded.
pub(crate) fn resolve_boundary<B: Bounds>(data: Option<B>, boundary: Option<B>) -> B {
    let b = match (data, boundary) {
        (Some(d), Some(o)) => d.union(&o),
        (Some(d), None) => d,
        (None, Some(o)) => o,
        (None, None) => B::origin(),
    };
    b.padded()
}

/// Convert an arena or array position to the stored 32-bit form.
///
/// Callers have already checked the element count against `u32::MAX`; node counts are
/// bounded by twice the element count plus one.
#[inline]
#[allow(
    clippy::cast_possible_truncation,
    reason = "Positions are bounded by the element count, which is checked to fit in u32."
)]
pub(crate) const fn pos(i: usize) -> u32 {
    i as u32
}

#[cfg(test)]
impl<B: Bounds> Hierarchy<B> {
    /// Check the partition and containment invariants of a built tree.
    pub(crate) fn assert_invariants(&self, len: usize, entry_inside: impl Fn(&B, u32) -> bool) {
        // The index array is a permutation of 0..len.
        let mut seen = vec![false; len];
        assert_eq!(self.indices.len(), len, "index array covers every entry");
        for &i in &self.indices {
            assert!(!seen[i as usize], "index {i} appears twice");
            seen[i as usize] = true;
        }

        // Leaf ranges tile 0..len without gaps or overlap.
        let mut ranges = self.leaf_ranges();
        ranges.sort_by_key(|r| r.start);
        let mut next = 0;
        for r in ranges.iter().filter(|r| !r.is_empty()) {
            assert_eq!(r.start, next, "leaf ranges leave a gap or overlap");
            next = r.end;
        }
        assert_eq!(next, len, "leaf ranges cover every entry");

        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            for &i in self.slice(node) {
                assert!(
                    entry_inside(&node.bounds(), i),
                    "entry {i} escapes node {id} bounds {:?}",
                    node.bounds()
                );
            }
            if node.is_leaf() {
                continue;
            }
            let mut cursor = node.range().start;
            let mut total = 0;
            for child_id in node.children() {
                let child = self.node(child_id);
                assert_eq!(child.range().start, cursor, "children are contiguous");
                assert!(
                    node.bounds().contains(&child.bounds()),
                    "child {child_id} escapes parent {id}"
                );
                cursor = child.range().end;
                total += child.len();
                stack.push(child_id);
            }
            assert_eq!(total, node.len(), "child counts sum to the parent count");
        }
    }
}
