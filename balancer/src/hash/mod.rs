mod double_jump;
mod jump;

pub use double_jump::DoubleJumpHash;
pub use jump::jump_consistent_hash;

use std::hash::Hasher;

use fnv::FnvHasher;

/// 64-bit FNV-1a over the concatenation of `fragments`.
///
/// Fragments are fed back to back with no separator, so `["ab", "c"]` and
/// `["a", "bc"]` hash the same. No fragments hashes the empty string.
pub fn hash_key(fragments: &[&str]) -> u64 {
    let mut hasher = FnvHasher::default();
    for fragment in fragments {
        hasher.write(fragment.as_bytes());
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[], 0xcbf29ce484222325)]
    #[case(&["a"], 0xaf63dc4c8601ec8c)]
    #[case(&["foobar"], 0x85944171f73967e8)]
    fn fnv1a_reference_vectors(#[case] fragments: &[&str], #[case] expected: u64) {
        assert_eq!(hash_key(fragments), expected);
    }

    #[test]
    fn fragments_are_concatenated() {
        assert_eq!(hash_key(&["192.168", ".1.100"]), hash_key(&["192.168.1.100"]));
        assert_eq!(hash_key(&["", "x", ""]), hash_key(&["x"]));
    }
}
