//! # Hash Abstraction
//!
//! Every hash used by XMSS is built from one keyed construction,
//!
//! ```text
//! core_hash(type, KEY, M) = HASH(toByte(type, 32) || KEY || M)
//! ```
//!
//! where `HASH` is SHA2-256, SHAKE-128 or SHAKE-256 with a 32-byte output. The
//! `type` prefix separates the four uses:
//!
//! | type | function | use                                   |
//! |------|----------|---------------------------------------|
//! | 0    | `F`      | one step of a WOTS+ chain             |
//! | 1    | `H`      | merging two nodes of an (L-)tree      |
//! | 2    | `H_msg`  | randomized message digest             |
//! | 3    | `PRF`    | key, bitmask, and secret derivation   |
//!
//! `F` and `H` are the bitmasked variants: the key and the bitmasks are drawn
//! from `PRF(PUB_SEED, ADRS)` with the `keyAndMask` word of the address set to
//! 0, 1 (and 2 for `H`).
//!
//! The hash function is a property of the key's descriptor and cannot change
//! after key generation.

use crate::params::XMSS_N;
use crate::utils::to_padded_bytes;
use crate::wots_plus::adrs::Adrs;
use crate::Error;
use zeroize::Zeroizing;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

mod sha2;
mod shake;

const HASH_PADDING_F: u32 = 0;
const HASH_PADDING_H: u32 = 1;
const HASH_PADDING_HASH: u32 = 2;
const HASH_PADDING_PRF: u32 = 3;

/// Hash functions a key may be built on. The discriminant is the 4-bit code
/// stored in the descriptor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum HashFunction {
    Sha2_256 = 0,
    Shake128 = 1,
    Shake256 = 2,
}

impl TryFrom<u8> for HashFunction {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(HashFunction::Sha2_256),
            1 => Ok(HashFunction::Shake128),
            2 => Ok(HashFunction::Shake256),
            _ => Err(Error::UnsupportedHashFunction(code)),
        }
    }
}

/// SHA2-256 of `data`.
pub fn sha2_256(data: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    sha2::sha256(&mut output, &[data]);
    output
}

/// SHAKE-128 of `data`, squeezed to `out_len` bytes.
pub fn shake128(out_len: usize, data: &[u8]) -> Vec<u8> {
    let mut output = vec![0u8; out_len];
    shake::shake128(&mut output, &[data]);
    output
}

/// SHAKE-256 of `data`, squeezed to `out_len` bytes.
pub fn shake256(out_len: usize, data: &[u8]) -> Vec<u8> {
    let mut output = vec![0u8; out_len];
    shake::shake256(&mut output, &[data]);
    output
}

/// Expands a key seed into `SK_SEED || SK_PRF || PUB_SEED` with SHAKE-256,
/// whichever hash function the key itself uses.
pub(crate) fn expand_key_seed(seed: &[u8]) -> Zeroizing<[u8; 3 * XMSS_N]> {
    let mut material = Zeroizing::new([0u8; 3 * XMSS_N]);
    shake::shake256(&mut material[..], &[seed]);
    material
}

/// Dispatches the XMSS keyed hashes to the hash function chosen for a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct XmssHasher {
    hash_function: HashFunction,
}

impl XmssHasher {
    pub(crate) fn new(hash_function: HashFunction) -> Self {
        Self { hash_function }
    }

    /// `out = HASH(toByte(hash_type, n) || key || input)`.
    fn core_hash(&self, output: &mut [u8; XMSS_N], hash_type: u32, key: &[u8], input: &[u8]) {
        let prefix = to_padded_bytes(hash_type);
        let parts = [prefix.as_ref(), key, input];
        match self.hash_function {
            HashFunction::Sha2_256 => sha2::sha256(output, &parts),
            HashFunction::Shake128 => shake::shake128(output, &parts),
            HashFunction::Shake256 => shake::shake256(output, &parts),
        }
    }

    /// PRF(KEY, M) for a 32-byte input `M`.
    pub(crate) fn prf(&self, output: &mut [u8; XMSS_N], input: &[u8; 32], key: &[u8]) {
        self.core_hash(output, HASH_PADDING_PRF, key, input);
    }

    /// H_msg(KEY, M), keyed with `R || root || toByte(idx, n)`.
    pub(crate) fn h_msg(&self, output: &mut [u8; XMSS_N], key: &[u8; 3 * XMSS_N], message: &[u8]) {
        self.core_hash(output, HASH_PADDING_HASH, key, message);
    }

    /// Bitmasked chain function F, applied in place.
    pub(crate) fn hash_f(&self, inout: &mut [u8; XMSS_N], pub_seed: &[u8], adrs: &mut Adrs) {
        let mut key = [0u8; XMSS_N];
        let mut bitmask = [0u8; XMSS_N];

        adrs.set_key_and_mask(0);
        self.prf(&mut key, adrs.as_bytes(), pub_seed);
        adrs.set_key_and_mask(1);
        self.prf(&mut bitmask, adrs.as_bytes(), pub_seed);

        for (b, m) in bitmask.iter_mut().zip(inout.iter()) {
            *b ^= m;
        }
        self.core_hash(inout, HASH_PADDING_F, &key, &bitmask);
    }

    /// Bitmasked tree hash H over `left || right`.
    pub(crate) fn hash_h(
        &self,
        output: &mut [u8; XMSS_N],
        left: &[u8; XMSS_N],
        right: &[u8; XMSS_N],
        pub_seed: &[u8],
        adrs: &mut Adrs,
    ) {
        let mut key = [0u8; XMSS_N];
        let mut bitmask_l = [0u8; XMSS_N];
        let mut bitmask_r = [0u8; XMSS_N];

        adrs.set_key_and_mask(0);
        self.prf(&mut key, adrs.as_bytes(), pub_seed);
        // MSB order: the left bitmask first
        adrs.set_key_and_mask(1);
        self.prf(&mut bitmask_l, adrs.as_bytes(), pub_seed);
        adrs.set_key_and_mask(2);
        self.prf(&mut bitmask_r, adrs.as_bytes(), pub_seed);

        let mut buf = [0u8; 2 * XMSS_N];
        for i in 0..XMSS_N {
            buf[i] = left[i] ^ bitmask_l[i];
            buf[XMSS_N + i] = right[i] ^ bitmask_r[i];
        }
        self.core_hash(output, HASH_PADDING_H, &key, &buf);
    }
}
