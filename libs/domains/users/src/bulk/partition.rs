use std::ops::Range;

/// How many batches to cut a workload of `n` items into.
///
/// One batch per `batch_size` items, capped by `max_parallelism`, never
/// fewer than one batch for a non-empty workload.
pub fn batch_count(n: usize, batch_size: usize, max_parallelism: usize) -> usize {
    if n == 0 {
        return 0;
    }
    (n / batch_size.max(1)).min(max_parallelism.max(1)).max(1)
}

/// Cut `0..n` into `batches` contiguous, disjoint, near-equal ranges.
///
/// The first `n % batches` ranges get one extra item; together the ranges
/// cover `0..n` exactly. Requests for more batches than items collapse to
/// one range per item.
pub fn partition(n: usize, batches: usize) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new();
    }

    let batches = batches.clamp(1, n);
    let base = n / batches;
    let remainder = n % batches;

    let mut ranges = Vec::with_capacity(batches);
    let mut start = 0;
    for i in 0..batches {
        let len = base + usize::from(i < remainder);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}
