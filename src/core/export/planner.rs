//! Partition count planning

/// Below this many documents the index is read as a single, unsliced scroll
pub const MIN_SLICED_DOCUMENTS: u64 = 10_000;

/// Target number of documents per slice
pub const DOCUMENTS_PER_SLICE: u64 = 250_000;

/// Slice count used when the document count is unknown
const UNKNOWN_COUNT_SLICES: usize = 4;

/// Default worker cap: twice the available parallelism
pub fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_mul(2)
}

/// Number of partitions to export an index with
///
/// `doc_count` is `None` when the count query failed. A result of 1 means the
/// index is read without a slice clause.
pub fn plan_slices(doc_count: Option<u64>, max_workers: Option<usize>) -> usize {
    let max_workers = max_workers.unwrap_or_else(default_max_workers).max(1);

    let doc_count = match doc_count {
        None | Some(0) => return UNKNOWN_COUNT_SLICES.min(max_workers),
        Some(count) => count,
    };

    if doc_count < MIN_SLICED_DOCUMENTS {
        return 1;
    }

    let raw = usize::try_from(doc_count / DOCUMENTS_PER_SLICE)
        .unwrap_or(usize::MAX)
        .max(2);
    bucket(raw.min(max_workers))
}

/// Round up to 8, 16 or 32, then to a multiple of 8; small counts are kept
fn bucket(count: usize) -> usize {
    match count {
        0..=4 => count,
        5..=8 => 8,
        9..=16 => 16,
        17..=32 => 32,
        _ => count.div_ceil(8) * 8,
    }
}
