//! Contiguous partitioning of the visit table for parallel builds.

use std::ops::Range;

/// Splits `len` items into at most `partitions` contiguous index ranges.
///
/// Ranges cover `0..len` in order with no gaps or overlap. When `len` does
/// not divide evenly, the leading ranges each take one extra item. Fewer
/// ranges come back when there are not enough items to fill them.
#[must_use]
pub fn partition_ranges(len: usize, partitions: usize) -> Vec<Range<usize>> {
    if len == 0 || partitions == 0 {
        return Vec::new();
    }
    let parts = partitions.min(len);
    let base = len / parts;
    let extra = len % parts;

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for index in 0..parts {
        let size = base + usize::from(index < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(ranges: &[Range<usize>], len: usize) {
        let mut expected_start = 0;
        for range in ranges {
            assert_eq!(range.start, expected_start, "gap or overlap in {ranges:?}");
            assert!(range.end > range.start, "empty range in {ranges:?}");
            expected_start = range.end;
        }
        assert_eq!(expected_start, len, "ranges {ranges:?} do not cover {len}");
    }

    #[test]
    fn even_split() {
        let ranges = partition_ranges(100, 4);
        assert_eq!(ranges.len(), 4);
        assert!(ranges.iter().all(|r| r.len() == 25));
        assert_covers(&ranges, 100);
    }

    #[test]
    fn remainder_spreads_over_leading_ranges() {
        let ranges = partition_ranges(10, 3);
        assert_eq!(ranges, vec![0..4, 4..7, 7..10]);
        assert_covers(&ranges, 10);
    }

    #[test]
    fn more_partitions_than_items() {
        let ranges = partition_ranges(3, 8);
        assert_eq!(ranges.len(), 3);
        assert!(ranges.iter().all(|r| r.len() == 1));
        assert_covers(&ranges, 3);
    }

    #[test]
    fn single_partition_takes_everything() {
        assert_eq!(partition_ranges(7, 1), vec![0..7]);
    }

    #[test]
    fn empty_input_yields_no_ranges() {
        assert!(partition_ranges(0, 4).is_empty());
        assert!(partition_ranges(5, 0).is_empty());
    }
}
