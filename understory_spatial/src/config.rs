// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build-time configuration for the trees.

use crate::bounds::Bounds;
use crate::error::BuildError;

/// Default maximum number of elements stored directly in a leaf.
pub const DEFAULT_BUCKET_SIZE: usize = 12;

/// Default number of children aggregated per internal node of the bulk-loaded tree.
pub const DEFAULT_BRANCH_FACTOR: usize = 4;

/// Configuration shared by the quadrant and axis-split trees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TreeConfig<B> {
    /// Maximum element count of a leaf before it is subdivided.
    pub bucket_size: usize,
    /// Optional global boundary.
    ///
    /// It is unioned with the bounds of the data, so it can only grow the root; for an
    /// empty input it becomes the tree's boundary as-is.
    pub boundary: Option<B>,
}

impl<B> Default for TreeConfig<B> {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
            boundary: None,
        }
    }
}

impl<B: Bounds> TreeConfig<B> {
    /// Set the leaf bucket size.
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Set the global boundary override.
    pub fn with_boundary(mut self, boundary: B) -> Self {
        self.boundary = Some(boundary);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        validate_common(self.bucket_size, self.boundary.as_ref())
    }
}

/// Configuration for the bulk-loaded bounding-volume tree.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BulkLoadConfig<B> {
    /// Number of elements packed into each leaf.
    pub bucket_size: usize,
    /// Number of children aggregated per internal node.
    pub branch_factor: usize,
    /// Optional global boundary; also the quantization frame for the Morton keys.
    ///
    /// Unioned with the bounds of the data, as in [`TreeConfig::boundary`].
    pub boundary: Option<B>,
}

impl<B> Default for BulkLoadConfig<B> {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
            branch_factor: DEFAULT_BRANCH_FACTOR,
            boundary: None,
        }
    }
}

impl<B: Bounds> BulkLoadConfig<B> {
    /// Set the leaf bucket size.
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Set the branch factor.
    pub fn with_branch_factor(mut self, branch_factor: usize) -> Self {
        self.branch_factor = branch_factor;
        self
    }

    /// Set the global boundary override.
    pub fn with_boundary(mut self, boundary: B) -> Self {
        self.boundary = Some(boundary);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        if self.branch_factor < 2 {
            return Err(BuildError::BranchFactorTooSmall(self.branch_factor));
        }
        validate_common(self.bucket_size, self.boundary.as_ref())
    }
}

/// How the axis-split tree partitions a node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum KdBuild {
    /// Exact median on round-robin axes; both halves get the same count.
    #[default]
    Balanced,
    /// Cut at the node's center on the current axis; sides may differ in size.
    Unbalanced,
}

fn validate_common<B: Bounds>(bucket_size: usize, boundary: Option<&B>) -> Result<(), BuildError> {
    if bucket_size == 0 {
        return Err(BuildError::ZeroBucketSize);
    }
    if boundary.is_some_and(|b| !b.is_valid()) {
        return Err(BuildError::InvalidBoundary);
    }
    Ok(())
}
