//! Content hashing via xxh3.

use xxhash_rust::xxh3::xxh3_64;

/// Compute the xxh3 64-bit hash of template content, as 16 hex chars.
#[inline]
pub fn hash_content(content: &[u8]) -> String {
    format!("{:016x}", xxh3_64(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_hash() {
        let data = b"{{ greeting }}";
        assert_eq!(hash_content(data), hash_content(data));
    }

    #[test]
    fn fixed_width_hex() {
        assert_eq!(hash_content(b"").len(), 16);
        assert_eq!(hash_content(b"x").len(), 16);
    }

    #[test]
    fn different_content_different_hash() {
        assert_ne!(hash_content(b"{{ a }}"), hash_content(b"{{ b }}"));
    }
}
