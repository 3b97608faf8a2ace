// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reusable traversal scratch space.
//!
//! Every query needs a node stack and, for nearest-neighbor search, a candidate list and
//! heaps. [`Scratch`] bundles them so callers issuing many queries can keep the
//! allocations alive between calls. [`ScratchPool`] hands out scratch sets behind a guard
//! that clears and returns them when it goes out of scope, on every exit path.
//!
//! A scratch set must not be shared by concurrent queries; use one pool (or one
//! [`Scratch`]) per thread. Trees themselves are read-only and can be shared freely.

use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::cmp::{Ordering, Reverse};
use core::fmt;
use core::mem;
use core::ops::{Deref, DerefMut};

/// A candidate entry or node keyed by squared distance.
///
/// Ordered by distance with `total_cmp`, then by id, so heap and sort orders are
/// deterministic even for ties.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Candidate {
    pub(crate) distance: f64,
    pub(crate) id: u32,
}

impl Candidate {
    pub(crate) const fn new(distance: f64, id: u32) -> Self {
        Self { distance, id }
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.id.cmp(&other.id))
    }
}

/// Containers borrowed by a single query.
#[derive(Default)]
pub struct Scratch {
    pub(crate) stack: Vec<u32>,
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) frontier: BinaryHeap<Reverse<Candidate>>,
    pub(crate) best: BinaryHeap<Candidate>,
    pub(crate) seen: Vec<u32>,
}

impl Scratch {
    /// Create an empty scratch set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty every container, keeping the allocations.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.candidates.clear();
        self.frontier.clear();
        self.best.clear();
        self.seen.clear();
    }
}

impl fmt::Debug for Scratch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scratch")
            .field("stack_capacity", &self.stack.capacity())
            .field("candidates_capacity", &self.candidates.capacity())
            .finish_non_exhaustive()
    }
}

/// Single-threaded pool of [`Scratch`] sets.
#[derive(Default)]
pub struct ScratchPool {
    free: RefCell<Vec<Scratch>>,
}

impl ScratchPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a scratch set until the returned guard is dropped.
    pub fn acquire(&self) -> PooledScratch<'_> {
        let scratch = self.free.borrow_mut().pop().unwrap_or_default();
        PooledScratch {
            pool: self,
            scratch,
        }
    }

    /// Number of scratch sets waiting to be reused.
    pub fn idle(&self) -> usize {
        self.free.borrow().len()
    }
}

impl fmt::Debug for ScratchPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchPool")
            .field("idle", &self.idle())
            .finish()
    }
}

/// Scoped handle to a pooled [`Scratch`]; returns it to the pool on drop.
pub struct PooledScratch<'a> {
    pool: &'a ScratchPool,
    scratch: Scratch,
}

impl Deref for PooledScratch<'_> {
    type Target = Scratch;

    fn deref(&self) -> &Scratch {
        &self.scratch
    }
}

impl DerefMut for PooledScratch<'_> {
    fn deref_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }
}

impl Drop for PooledScratch<'_> {
    fn drop(&mut self) {
        let mut scratch = mem::take(&mut self.scratch);
        scratch.clear();
        self.pool.free.borrow_mut().push(scratch);
    }
}

impl fmt::Debug for PooledScratch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledScratch").field(&self.scratch).finish()
    }
}
