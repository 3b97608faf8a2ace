// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Morton (Z-order) keys and the linear-time sort used by the bulk loader.
//!
//! Each axis of an element's center is quantized relative to the tree boundary
//! (16 bits per axis in 2D, 10 in 3D) and the bits are interleaved. The sort key puts the
//! interleaved code in the high bits and the concatenated quantized axes in the low bits,
//! so the order is total even for elements sharing a Morton cell. Keys are then ordered
//! with an LSB-first radix sort over 8-bit digits.

use alloc::vec::Vec;

use crate::bounds::Bounds;
use crate::types::Scalar;

/// Map `v` from `[lo, hi]` onto `[0, 2^bits - 1]`, clamping outside values.
#[allow(
    clippy::cast_possible_truncation,
    reason = "The value is clamped to [0, 2^bits - 1] first, which fits in u32."
)]
pub(crate) fn quantize(v: f64, lo: f64, hi: f64, bits: u32) -> u32 {
    let extent = hi - lo;
    if extent <= 0.0 || extent.is_nan() {
        return 0;
    }
    let max = f64::from((1_u32 << bits) - 1);
    ((v - lo) / extent * max).clamp(0.0, max) as u32
}

/// Spread the low 16 bits of `v` to the even bit positions.
pub(crate) fn part1by1(v: u32) -> u64 {
    let mut x = u64::from(v & 0xffff);
    x = (x | (x << 8)) & 0x00ff_00ff;
    x = (x | (x << 4)) & 0x0f0f_0f0f;
    x = (x | (x << 2)) & 0x3333_3333;
    x = (x | (x << 1)) & 0x5555_5555;
    x
}

/// Spread the low 10 bits of `v` to every third bit position.
pub(crate) fn part1by2(v: u32) -> u64 {
    let mut x = u64::from(v & 0x3ff);
    x = (x | (x << 16)) & 0xff00_00ff;
    x = (x | (x << 8)) & 0x0300_f00f;
    x = (x | (x << 4)) & 0x030c_30c3;
    x = (x | (x << 2)) & 0x0924_9249;
    x
}

/// 2D Morton code; `x` occupies the even bits.
pub(crate) fn interleave2(x: u32, y: u32) -> u64 {
    part1by1(x) | (part1by1(y) << 1)
}

/// 3D Morton code; `x` occupies bits `0, 3, 6, ...`.
pub(crate) fn interleave3(x: u32, y: u32, z: u32) -> u64 {
    part1by2(x) | (part1by2(y) << 1) | (part1by2(z) << 2)
}

/// Sort key of a point inside `frame`.
pub(crate) fn sort_key<B: Bounds>(center: &B::Point, frame: &B) -> u64 {
    let bits = B::MORTON_BITS;
    let mut q = [0_u32; 3];
    for (axis, slot) in q.iter_mut().enumerate().take(B::DIM) {
        *slot = quantize(
            <B::Scalar as Scalar>::widen(B::coord(center, axis)),
            <B::Scalar as Scalar>::widen(frame.lo(axis)),
            <B::Scalar as Scalar>::widen(frame.hi(axis)),
            bits,
        );
    }
    let morton = if B::DIM == 2 {
        interleave2(q[0], q[1])
    } else {
        interleave3(q[0], q[1], q[2])
    };
    let mut raw = 0_u64;
    let mut shift = 0;
    for &c in q.iter().take(B::DIM) {
        raw = (raw << bits) | u64::from(c);
        shift += bits;
    }
    (morton << shift) | raw
}

#[inline]
#[allow(
    clippy::cast_possible_truncation,
    reason = "Masked to eight bits before the cast."
)]
fn digit(key: u64, shift: u32) -> usize {
    ((key >> shift) & 0xff) as usize
}

/// Stable LSB-first radix sort of `(key, payload)` pairs over 8-bit digits.
///
/// Passes in which every key shares the same digit are skipped.
pub(crate) fn radix_sort(items: &mut [(u64, u32)]) {
    let len = items.len();
    if len < 2 {
        return;
    }
    let mut buffer: Vec<(u64, u32)> = items.to_vec();
    let mut in_items = true;
    for pass in 0..8_u32 {
        let shift = pass * 8;
        let (src, dst): (&[(u64, u32)], &mut [(u64, u32)]) = if in_items {
            (&*items, &mut buffer[..])
        } else {
            (&buffer[..], &mut *items)
        };
        let mut counts = [0_usize; 256];
        for &(key, _) in src {
            counts[digit(key, shift)] += 1;
        }
        if counts.contains(&len) {
            continue;
        }
        let mut offsets = [0_usize; 256];
        let mut total = 0;
        for (offset, count) in offsets.iter_mut().zip(counts) {
            *offset = total;
            total += count;
        }
        for &item in src {
            let d = digit(item.0, shift);
            dst[offsets[d]] = item;
            offsets[d] += 1;
        }
        in_items = !in_items;
    }
    if !in_items {
        items.copy_from_slice(&buffer);
    }
}
