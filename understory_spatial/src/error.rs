// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction errors.
//!
//! Queries never fail; only building a tree checks preconditions.

use thiserror::Error;

/// Why a tree could not be built.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Leaves must be allowed to hold at least one element.
    #[error("bucket size must be at least 1")]
    ZeroBucketSize,
    /// Internal nodes of the bulk-loaded tree need at least two children.
    #[error("branch factor must be at least 2, got {0}")]
    BranchFactorTooSmall(usize),
    /// The boundary override is inverted or has non-finite coordinates.
    #[error("boundary override is inverted or not finite")]
    InvalidBoundary,
    /// An element projected to an inverted box or a non-finite coordinate.
    #[error("element {index} has non-finite or inverted geometry")]
    InvalidGeometry {
        /// Position of the offending element in the source sequence.
        index: usize,
    },
    /// The index array stores 32-bit positions.
    #[error("{0} elements exceed the 32-bit index space")]
    TooManyElements(usize),
}
