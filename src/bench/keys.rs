/// Zero-padded sequential key of exactly `size` bytes. Indices wider than
/// the requested size extend it rather than truncate.
#[must_use]
pub(crate) fn sequential_key(index: u64, size: usize) -> String {
    format!("{:0width$}", index, width = size)
}

/// The fixed key used when every operation targets the same key.
#[must_use]
pub(crate) fn same_key(size: usize) -> String {
    "a".repeat(size)
}
