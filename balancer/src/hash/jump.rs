/// Lamping and Veach's jump hash: places `key` in one of `num_buckets`
/// buckets without any lookup table.
///
/// Growing from N to N+1 buckets moves roughly 1/(N+1) of the keys, and only
/// into the new bucket. The arithmetic follows dgryski/go-jump, including the
/// float division, so bucket numbers agree with that implementation.
///
/// https://arxiv.org/abs/1406.2294
pub fn jump_consistent_hash(key: u64, num_buckets: i32) -> i32 {
    assert!(num_buckets > 0, "num_buckets must be positive");

    let mut k = key;
    let mut b: i64 = -1;
    let mut j: i64 = 0;

    while j < i64::from(num_buckets) {
        b = j;
        k = k.wrapping_mul(2862933555777941757).wrapping_add(1);
        j = ((b + 1) as f64 * (f64::from(1u32 << 31) / ((k >> 33) + 1) as f64)) as i64;
    }

    b as i32
}

/// Slot in `0..len` for `key`. Lengths past `i32::MAX` are clamped, so every
/// slot beyond that is unreachable. Callers guard `len == 0`.
pub(crate) fn jump_index(key: u64, len: usize) -> usize {
    let buckets = i32::try_from(len).unwrap_or(i32::MAX);
    jump_consistent_hash(key, buckets) as usize
}
