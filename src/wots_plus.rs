//! # Winternitz One-Time Signature Scheme Plus (W-OTS+)
//!
//! This module implements the W-OTS+ scheme used at every leaf of an XMSS
//! tree, with n = 32 and w = 16, i.e. 67 hash chains of length 16.
//!
//! Each leaf owns one key pair, derived from the XMSS secret seed and the
//! leaf index through a [`Adrs`] of type [`AdrsType::Ots`]:
//!
//! ```text
//! leaf_seed  = PRF(SK_SEED, ADRS(ots = i))
//! sk[j]      = PRF(leaf_seed, toByte(j, 32))
//! pk[j]      = F^15(sk[j])
//! ```
//!
//! Every call of the chain function is bound to its leaf, chain, and position
//! by the address, following the WOTS-T construction.
//!
//! ## Important Note
//!
//! A W-OTS+ key must sign exactly one digest. The owning
//! [`Xmss`](crate::xmss::Xmss) instance guarantees this by consuming leaf
//! indices strictly in order; this module does not track usage itself.

use crate::hash::{HashFunction, XmssHasher};
use crate::params::{
    WOTS_BYTES, WOTS_CSUM_BYTES, WOTS_LEN, WOTS_LEN1, WOTS_LEN2, WOTS_LOGW, WOTS_W, XMSS_N,
};
use crate::utils::to_padded_bytes;
use crate::wots_plus::adrs::{Adrs, AdrsType};
use crate::{Error, Result};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

pub mod adrs;

/// The 67 chain values of a key or signature.
pub type WotsChains = [[u8; XMSS_N]; WOTS_LEN];

/// Encapsulates the W-OTS+ operations for one public seed and hash function.
#[derive(Clone, Debug)]
pub struct WotsPlus {
    hasher: XmssHasher,
    pub_seed: [u8; XMSS_N],
}

impl WotsPlus {
    /// Creates a new `WotsPlus` instance with the specified hash function and
    /// public seed. The public seed keys every chain step, so it must be the
    /// one published in the XMSS public key.
    pub fn new(hash_function: HashFunction, pub_seed: &[u8; XMSS_N]) -> Self {
        Self::with_hasher(XmssHasher::new(hash_function), pub_seed)
    }

    pub(crate) fn with_hasher(hasher: XmssHasher, pub_seed: &[u8; XMSS_N]) -> Self {
        Self {
            hasher,
            pub_seed: *pub_seed,
        }
    }

    pub(crate) fn hasher(&self) -> &XmssHasher {
        &self.hasher
    }

    pub(crate) fn pub_seed(&self) -> &[u8; XMSS_N] {
        &self.pub_seed
    }

    /// Generates the uncompressed W-OTS+ public key of leaf `leaf_idx`.
    ///
    /// # Arguments
    ///
    /// * `sk_seed` - The XMSS secret seed all leaf keys are derived from.
    /// * `leaf_idx` - The OTS index of the leaf.
    pub fn keygen(&self, sk_seed: &[u8; XMSS_N], leaf_idx: u32) -> WotsChains {
        let mut adrs = Self::ots_adrs(leaf_idx);
        let chains = self.expand_seed(sk_seed, &mut adrs);

        let mut pk = [[0u8; XMSS_N]; WOTS_LEN];
        for (i, (out, sk)) in pk.iter_mut().zip(chains.iter()).enumerate() {
            adrs.set_chain_addr(i as u32);
            *out = *sk;
            self.gen_chain(out, 0, WOTS_W - 1, &mut adrs);
        }
        pk
    }

    /// Signs an n-byte digest with the key of leaf `leaf_idx`.
    ///
    /// # Returns
    ///
    /// The 67 intermediate chain values, chain `i` advanced by the `i`-th
    /// base-w digit of `digest || checksum`.
    pub fn sign(&self, digest: &[u8; XMSS_N], sk_seed: &[u8; XMSS_N], leaf_idx: u32) -> WotsChains {
        let steps = Self::chain_lengths(digest);
        let mut adrs = Self::ots_adrs(leaf_idx);
        let chains = self.expand_seed(sk_seed, &mut adrs);

        let mut sig = [[0u8; XMSS_N]; WOTS_LEN];
        for (i, out) in sig.iter_mut().enumerate() {
            adrs.set_chain_addr(i as u32);
            *out = chains[i];
            self.gen_chain(out, 0, steps[i] as usize, &mut adrs);
        }
        sig
    }

    /// Computes the public key implied by a signature over `digest`.
    ///
    /// The signature is given as raw bytes; anything other than
    /// [`WOTS_BYTES`] bytes is rejected before hashing.
    pub fn pk_from_sig(
        &self,
        signature: &[u8],
        digest: &[u8; XMSS_N],
        leaf_idx: u32,
    ) -> Result<WotsChains> {
        if signature.len() != WOTS_BYTES {
            return Err(Error::MalformedSignature(format!(
                "W-OTS+ signature must be {} bytes, found {}",
                WOTS_BYTES,
                signature.len()
            )));
        }

        let lengths = Self::chain_lengths(digest);
        let mut adrs = Self::ots_adrs(leaf_idx);

        let mut pk = [[0u8; XMSS_N]; WOTS_LEN];
        for (i, (out, chunk)) in pk
            .iter_mut()
            .zip(signature.chunks_exact(XMSS_N))
            .enumerate()
        {
            adrs.set_chain_addr(i as u32);
            out.copy_from_slice(chunk);
            let start = lengths[i] as usize;
            self.gen_chain(out, start, WOTS_W - 1 - start, &mut adrs);
        }
        Ok(pk)
    }

    /// Verifies a stand-alone W-OTS+ signature against an uncompressed public
    /// key. Inside XMSS the recovered key is checked through the Merkle root
    /// instead.
    pub fn verify(
        &self,
        signature: &[u8],
        digest: &[u8; XMSS_N],
        pk: &WotsChains,
        leaf_idx: u32,
    ) -> bool {
        match self.pk_from_sig(signature, digest, leaf_idx) {
            Ok(calculated) => calculated
                .iter()
                .flatten()
                .copied()
                .collect::<Vec<u8>>()
                .ct_eq(&pk.iter().flatten().copied().collect::<Vec<u8>>())
                .into(),
            Err(_) => false,
        }
    }

    /// Derives the per-leaf seed, `PRF(SK_SEED, ADRS)` with chain, hash, and
    /// keyAndMask words cleared.
    fn leaf_seed(&self, sk_seed: &[u8; XMSS_N], adrs: &mut Adrs) -> Zeroizing<[u8; XMSS_N]> {
        adrs.set_chain_addr(0);
        adrs.set_hash_addr(0);
        adrs.set_key_and_mask(0);
        let mut seed = Zeroizing::new([0u8; XMSS_N]);
        self.hasher.prf(&mut seed, adrs.as_bytes(), sk_seed);
        seed
    }

    /// Expands the leaf seed into the 67 secret chain starts.
    fn expand_seed(&self, sk_seed: &[u8; XMSS_N], adrs: &mut Adrs) -> Zeroizing<WotsChains> {
        let seed = self.leaf_seed(sk_seed, adrs);
        let mut chains = Zeroizing::new([[0u8; XMSS_N]; WOTS_LEN]);
        for (i, chain) in chains.iter_mut().enumerate() {
            self.hasher.prf(chain, &to_padded_bytes(i as u32), &seed[..]);
        }
        chains
    }

    fn ots_adrs(leaf_idx: u32) -> Adrs {
        let mut adrs = Adrs::from(AdrsType::Ots);
        adrs.set_ots_addr(leaf_idx);
        adrs
    }

    /// Computes the chaining function.
    ///
    /// Interprets `inout` as the start-th value of the chain and advances it
    /// `steps` times, never past position `w - 1`.
    /// `adrs` has to contain the address of the chain.
    fn gen_chain(&self, inout: &mut [u8; XMSS_N], start: usize, steps: usize, adrs: &mut Adrs) {
        for i in start..(start + steps) {
            if i >= WOTS_W {
                break;
            }
            adrs.set_hash_addr(i as u32);
            self.hasher.hash_f(inout, &self.pub_seed, adrs);
        }
    }

    /// Converts an array of bytes into integers in base `w`.
    fn base_w(output: &mut [u32], input: &[u8]) {
        let mut bits = 0;
        let mut total: u8 = 0;
        let mut input_index = 0;

        for out in output.iter_mut() {
            if bits == 0 {
                total = input[input_index];
                input_index += 1;
                bits += 8;
            }

            bits -= WOTS_LOGW;
            *out = ((total >> bits) & ((WOTS_W - 1) as u8)) as u32;
        }
    }

    /// Computes the WOTS+ checksum over a message (in base_w).
    fn wots_checksum(csum_base_w: &mut [u32], msg_base_w: &[u32]) {
        let mut csum: u32 = msg_base_w
            .iter()
            .take(WOTS_LEN1)
            .map(|&d| (WOTS_W as u32) - 1 - d)
            .sum();

        // Make sure expected empty zero bits are the least significant bits.
        csum <<= 8 - ((WOTS_LEN2 * WOTS_LOGW) % 8);

        let csum_bytes = csum.to_be_bytes();
        Self::base_w(csum_base_w, &csum_bytes[4 - WOTS_CSUM_BYTES..]);
    }

    /// Takes a digest and derives the matching chain lengths.
    fn chain_lengths(digest: &[u8; XMSS_N]) -> [u32; WOTS_LEN] {
        let mut lengths = [0_u32; WOTS_LEN];
        Self::base_w(&mut lengths[..WOTS_LEN1], digest);
        let (msg, csum) = lengths.split_at_mut(WOTS_LEN1);
        Self::wots_checksum(csum, msg);
        lengths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::OsRng;

    fn flatten(chains: &WotsChains) -> Vec<u8> {
        chains.iter().flatten().copied().collect()
    }

    #[test]
    fn test_wots_plus() {
        let mut pub_seed = [0; XMSS_N];
        let mut sk_seed = [0; XMSS_N];
        let mut digest = [0; XMSS_N];
        OsRng.fill_bytes(&mut pub_seed);
        OsRng.fill_bytes(&mut sk_seed);
        OsRng.fill_bytes(&mut digest);
        let leaf_idx = OsRng.gen_range(0..1024);

        for hf in [
            HashFunction::Sha2_256,
            HashFunction::Shake128,
            HashFunction::Shake256,
        ] {
            let wp = WotsPlus::new(hf, &pub_seed);
            let pk = wp.keygen(&sk_seed, leaf_idx);

            let signature = flatten(&wp.sign(&digest, &sk_seed, leaf_idx));
            assert!(wp.verify(&signature, &digest, &pk, leaf_idx));
            assert_eq!(wp.pk_from_sig(&signature, &digest, leaf_idx).unwrap(), pk);

            let mut fake_signature = signature.clone();
            fake_signature[0] ^= 1;
            assert!(!wp.verify(&fake_signature, &digest, &pk, leaf_idx));

            let mut fake_digest = digest;
            fake_digest[XMSS_N - 1] ^= 0x10;
            assert!(!wp.verify(&signature, &fake_digest, &pk, leaf_idx));

            assert!(!wp.verify(&signature, &digest, &pk, leaf_idx + 1));
        }
    }

    #[test]
    fn test_keygen_is_deterministic() {
        let pub_seed = [3u8; XMSS_N];
        let sk_seed = [5u8; XMSS_N];
        let wp = WotsPlus::new(HashFunction::Shake128, &pub_seed);
        assert_eq!(wp.keygen(&sk_seed, 7), wp.keygen(&sk_seed, 7));
        assert_ne!(wp.keygen(&sk_seed, 7), wp.keygen(&sk_seed, 8));
    }

    #[test]
    fn test_malformed_signature_length() {
        let wp = WotsPlus::new(HashFunction::Sha2_256, &[0u8; XMSS_N]);
        let digest = [0u8; XMSS_N];
        assert!(matches!(
            wp.pk_from_sig(&[0u8; WOTS_BYTES - 1], &digest, 0),
            Err(Error::MalformedSignature(_))
        ));
        let pk = wp.keygen(&[0u8; XMSS_N], 0);
        assert!(!wp.verify(&[0u8; WOTS_BYTES + XMSS_N], &digest, &pk, 0));
    }

    #[test]
    fn test_chain_lengths_checksum() {
        // all-zero digits: checksum 64 * 15 = 960 = 0x3c0
        let lengths = WotsPlus::chain_lengths(&[0u8; XMSS_N]);
        assert!(lengths[..WOTS_LEN1].iter().all(|&d| d == 0));
        assert_eq!(lengths[WOTS_LEN1..], [3, 12, 0]);

        // all-fifteen digits: checksum 0
        let lengths = WotsPlus::chain_lengths(&[0xffu8; XMSS_N]);
        assert!(lengths[..WOTS_LEN1].iter().all(|&d| d == 15));
        assert_eq!(lengths[WOTS_LEN1..], [0, 0, 0]);
    }

    #[test]
    fn test_base_w_nibbles() {
        let mut out = [0u32; 4];
        WotsPlus::base_w(&mut out, &[0x12, 0x34]);
        assert_eq!(out, [1, 2, 3, 4]);
    }
}
