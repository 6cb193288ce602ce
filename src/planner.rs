//! I/O planning: turns the byte ranges a read needs into a minimal set of
//! coalesced backend reads, merging gaps smaller than `io_size_merge` and
//! refusing to grow a merged read past `io_size_max` (`spec.md` §4.3).
//!
//! The same coalescing rule drives both cursors the format needs: the
//! index-read cursor, which decides which compressed LUT groups to fetch for
//! a requested chunk range, and the data-read cursor, which decides which
//! compressed chunk byte ranges to fetch once their offsets are known.

use std::ops::Range;

use crate::defaults::{IO_SIZE_MAX, IO_SIZE_MERGE, LUT_CHUNK_ELEMENT_COUNT};

/// One physical read this planner wants performed, together with which
/// logical items (LUT group indices, or chunk indices) it satisfies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRead {
    pub byte_range: Range<u64>,
    /// Indices, in ascending order, of the logical items covered by this read.
    pub items: Vec<u64>,
}

/// Coalesce a sequence of `(index, byte_range)` pairs, given in ascending
/// index and non-decreasing byte range order, into as few reads as
/// possible. Adjacent ranges separated by a gap no larger than
/// `io_size_merge` are merged into a single read; a merge that would grow
/// the read past `io_size_max` is rejected and starts a new read instead.
pub fn plan_reads(items: impl IntoIterator<Item = (u64, Range<u64>)>) -> Vec<PlannedRead> {
    let mut out: Vec<PlannedRead> = Vec::new();
    for (index, range) in items {
        if range.start == range.end {
            continue;
        }
        if let Some(last) = out.last_mut() {
            let gap = range.start.saturating_sub(last.byte_range.end);
            let merged_end = last.byte_range.end.max(range.end);
            let merged_len = merged_end.saturating_sub(last.byte_range.start);
            if range.start >= last.byte_range.start && gap <= IO_SIZE_MERGE && merged_len <= IO_SIZE_MAX {
                last.byte_range.end = merged_end;
                last.items.push(index);
                continue;
            }
        }
        out.push(PlannedRead {
            byte_range: range,
            items: vec![index],
        });
    }
    out
}

/// The range of LUT group indices that together cover every chunk in
/// `chunk_range`.
pub fn groups_for_chunk_range(chunk_range: Range<u64>) -> Range<u64> {
    if chunk_range.is_empty() {
        return 0..0;
    }
    let first_group = chunk_range.start / LUT_CHUNK_ELEMENT_COUNT;
    let last_group = (chunk_range.end - 1) / LUT_CHUNK_ELEMENT_COUNT;
    first_group..(last_group + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_reads_separated_by_a_small_gap() {
        let items = vec![(0u64, 0u64..100), (1, 100 + IO_SIZE_MERGE..200 + IO_SIZE_MERGE)];
        let planned = plan_reads(items);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].items, vec![0, 1]);
    }

    #[test]
    fn does_not_merge_across_a_large_gap() {
        let items = vec![(0u64, 0u64..100), (1, 100 + IO_SIZE_MERGE + 1..200 + IO_SIZE_MERGE + 1)];
        let planned = plan_reads(items);
        assert_eq!(planned.len(), 2);
    }

    #[test]
    fn splits_a_merge_that_would_exceed_io_size_max() {
        let items = vec![(0u64, 0u64..IO_SIZE_MAX), (1, IO_SIZE_MAX..IO_SIZE_MAX + 10)];
        let planned = plan_reads(items);
        assert_eq!(planned.len(), 2);
    }

    #[test]
    fn groups_for_chunk_range_spans_full_groups() {
        let n = LUT_CHUNK_ELEMENT_COUNT;
        assert_eq!(groups_for_chunk_range(0..1), 0..1);
        assert_eq!(groups_for_chunk_range(0..n), 0..1);
        assert_eq!(groups_for_chunk_range(0..n + 1), 0..2);
        assert_eq!(groups_for_chunk_range(n..n + 1), 1..2);
    }

    #[test]
    fn empty_range_yields_no_groups() {
        assert_eq!(groups_for_chunk_range(5..5), 0..0);
    }
}
