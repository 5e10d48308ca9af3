//! Fixed XMSS and WOTS+ parameters together with the derived byte sizes.
//!
//! These values are not open for configuration: every key, signature, and
//! address produced by this crate uses n = 32 and w = 16. The tree height and
//! the hash function are the only per-key choices, and both are carried in the
//! [`Descriptor`](crate::descriptor::Descriptor).

/// Hash output length in bytes.
pub const XMSS_N: usize = 32;

/// Winternitz parameter.
pub const WOTS_W: usize = 16;

/* WOTS parameters. */
pub const WOTS_LOGW: usize = 4;
pub const WOTS_LEN1: usize = 8 * XMSS_N / WOTS_LOGW;
pub const WOTS_LEN2: usize = 3;

pub const WOTS_LEN: usize = WOTS_LEN1 + WOTS_LEN2;
pub const WOTS_BYTES: usize = WOTS_LEN * XMSS_N;

/// Byte length of the checksum before it is split into base-w digits.
pub const WOTS_CSUM_BYTES: usize = (WOTS_LEN2 * WOTS_LOGW + 7) / 8;

/// Length of the user supplied seed.
pub const XMSS_SEED_BYTES: usize = 48;

/// Width of the big-endian signature index.
pub const XMSS_INDEX_BYTES: usize = 4;

/// Length of the packed descriptor.
pub const DESCRIPTOR_BYTES: usize = 2;

/// `descriptor || seed`.
pub const EXTENDED_SEED_BYTES: usize = DESCRIPTOR_BYTES + XMSS_SEED_BYTES;

/// `root || pub_seed`.
pub const XMSS_PK_BYTES: usize = 2 * XMSS_N;

/// `descriptor || root || pub_seed`.
pub const EXTENDED_PK_BYTES: usize = DESCRIPTOR_BYTES + XMSS_PK_BYTES;

/// `idx || sk_seed || sk_prf || pub_seed || root`.
pub const XMSS_SK_BYTES: usize = XMSS_INDEX_BYTES + 4 * XMSS_N;

/// Bytes of the public-key hash carried in an address.
pub const ADDRESS_HASH_BYTES: usize = 32;

/// Bytes of the trailing address checksum.
pub const ADDRESS_CHECKSUM_BYTES: usize = 4;

/// `descriptor || sha256(epk) || checksum`.
pub const ADDRESS_BYTES: usize = DESCRIPTOR_BYTES + ADDRESS_HASH_BYTES + ADDRESS_CHECKSUM_BYTES;

/// Signature bytes that do not depend on the tree height: `idx || R || wots_sig`.
pub const XMSS_SIG_FIXED_BYTES: usize = XMSS_INDEX_BYTES + XMSS_N + WOTS_BYTES;

/// Smallest supported tree height.
pub const MIN_HEIGHT: u8 = 2;

/// Largest height that fits in the descriptor's 4-bit `height / 2` field.
pub const MAX_HEIGHT: u8 = 30;

/// Default BDS parameter `k` for the fast traversal.
pub const BDS_K: u32 = 2;

/// Byte length of a signature for a tree of the given height.
pub const fn signature_bytes(height: u8) -> usize {
    XMSS_SIG_FIXED_BYTES + height as usize * XMSS_N
}

/// Returns `true` when `height` can be carried by a descriptor.
pub const fn is_valid_height(height: u8) -> bool {
    height >= MIN_HEIGHT && height <= MAX_HEIGHT && height % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_sizes() {
        assert_eq!(WOTS_LEN1, 64);
        assert_eq!(WOTS_LEN, 67);
        assert_eq!(WOTS_BYTES, 2144);
        assert_eq!(WOTS_CSUM_BYTES, 2);
        assert_eq!(EXTENDED_PK_BYTES, 66);
        assert_eq!(XMSS_SK_BYTES, 132);
        assert_eq!(ADDRESS_BYTES, 38);
        assert_eq!(signature_bytes(6), 2372);
    }

    #[test]
    fn test_valid_heights() {
        let valid: Vec<u8> = (0..=u8::MAX).filter(|&h| is_valid_height(h)).collect();
        assert_eq!(valid, (1..=15).map(|h| 2 * h).collect::<Vec<u8>>());
    }
}
