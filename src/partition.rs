// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Splits a population into one contiguous range per worker.
//!
//! Every range has the same size, `ceil(len / workers)`, except that
//! the ranges are clamped to the end of the population.  This means
//! the last range may be short, and when the division is lopsided the
//! trailing ranges may be empty: 5 cells over 4 workers is `[0,2)`,
//! `[2,4)`, `[4,5)`, `[5,5)`.

use std::ops::Range;

/// Computes `workers` contiguous, disjoint ranges covering `0..len`.
/// A worker count of zero is treated as one.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let size = (len + workers - 1) / workers;
    (0..workers)
        .map(|i| {
            let start = (i * size).min(len);
            let end = ((i + 1) * size).min(len);
            start..end
        })
        .collect()
}

/// Hands out a mutable slice of `items` for every range.  The ranges
/// must be contiguous and start at zero, as `partition` produces them.
pub fn split<'a, T>(
    items: &'a mut [T],
    ranges: &[Range<usize>],
) -> Vec<(Range<usize>, &'a mut [T])> {
    let mut rest = items;
    let mut offset = 0;
    let mut parts = Vec::with_capacity(ranges.len());
    for range in ranges {
        assert_eq!(range.start, offset, "partitions must be contiguous");
        let current = rest;
        let (head, tail) = current.split_at_mut(range.end - range.start);
        parts.push((range.clone(), head));
        rest = tail;
        offset = range.end;
    }
    parts
}
