//! # XMSS Signer and Verifier
//!
//! An [`Xmss`] instance owns the secret key material of one tree and the
//! index of the next unused leaf. Every call to [`Xmss::sign`] consumes one
//! leaf, so a key signs at most `2^h` messages:
//!
//! ```text
//! Fresh (index 0) --sign--> Active --sign--> ... --> Exhausted (index 2^h)
//! ```
//!
//! Signing:
//!
//! ```text
//! R      = PRF(SK_PRF, toByte(idx, 32))
//! digest = H_msg(R || root || toByte(idx, 32), message)
//! sig    = idx (4) || R (32) || WOTS+(digest) (67 * 32) || auth path (h * 32)
//! ```
//!
//! Verification is stateless: it only needs the message, the signature bytes,
//! and the 66-byte extended public key `descriptor || root || PUB_SEED`.
//!
//! ## Example
//!
//! ```
//! use qrl_xmss::{HashFunction, Xmss, XmssSeed};
//!
//! let seed = XmssSeed::from([0u8; 48]);
//! let mut xmss = Xmss::fast(&seed, 4, HashFunction::Shake128).unwrap();
//! let signature = xmss.sign(b"hello").unwrap().to_bytes();
//! assert!(Xmss::verify(b"hello", &signature, xmss.extended_pk().as_ref()));
//! ```
//!
//! ## Important Note
//!
//! The index is held in memory only. Persisting it before a signature leaves
//! the process is the caller's duty; restoring an older index from a stored
//! seed reuses one-time keys.

use crate::address::{address_of, Address};
use crate::descriptor::Descriptor;
use crate::hash::{expand_key_seed, HashFunction, XmssHasher};
use crate::params::{
    is_valid_height, signature_bytes, BDS_K, DESCRIPTOR_BYTES, EXTENDED_PK_BYTES,
    EXTENDED_SEED_BYTES, WOTS_BYTES, XMSS_INDEX_BYTES, XMSS_N, XMSS_SEED_BYTES,
    WOTS_LEN, XMSS_SIG_FIXED_BYTES, XMSS_SK_BYTES,
};
use crate::tree::{
    l_tree, root_from_auth_path, Traversal, TraversalStrategy, TreeContext, TreeTraversal,
};
use crate::utils::{array_struct, bytes_to_u32, to_padded_bytes, u32_to_bytes};
use crate::wots_plus::{WotsChains, WotsPlus};
use crate::{Error, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use rayon::prelude::*;
use subtle::ConstantTimeEq;
use tracing::{debug, trace};
use zeroize::Zeroizing;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

array_struct!(secret XmssSeed, XMSS_SEED_BYTES);

impl XmssSeed {
    /// A fresh seed from the operating system's randomness source.
    pub fn random() -> Self {
        let mut seed = [0u8; XMSS_SEED_BYTES];
        OsRng.fill_bytes(&mut seed);
        Self(seed)
    }
}

array_struct!(secret ExtendedSeed, EXTENDED_SEED_BYTES);

impl ExtendedSeed {
    pub fn new(descriptor: &Descriptor, seed: &XmssSeed) -> Self {
        let mut bytes = [0u8; EXTENDED_SEED_BYTES];
        bytes[..DESCRIPTOR_BYTES].copy_from_slice(&descriptor.to_bytes());
        bytes[DESCRIPTOR_BYTES..].copy_from_slice(seed.as_ref());
        Self(bytes)
    }

    pub fn descriptor(&self) -> Result<Descriptor> {
        Descriptor::from_bytes(&self.0[..DESCRIPTOR_BYTES])
    }

    pub fn seed(&self) -> XmssSeed {
        let mut seed = [0u8; XMSS_SEED_BYTES];
        seed.copy_from_slice(&self.0[DESCRIPTOR_BYTES..]);
        XmssSeed(seed)
    }
}

array_struct!(ExtendedPublicKey, EXTENDED_PK_BYTES);

impl ExtendedPublicKey {
    pub fn descriptor(&self) -> Result<Descriptor> {
        Descriptor::from_bytes(&self.0[..DESCRIPTOR_BYTES])
    }

    pub fn root(&self) -> &[u8] {
        &self.0[DESCRIPTOR_BYTES..DESCRIPTOR_BYTES + XMSS_N]
    }

    pub fn pub_seed(&self) -> &[u8] {
        &self.0[DESCRIPTOR_BYTES + XMSS_N..]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// A decoded XMSS signature. Its authentication path always has a valid
/// tree height: values only come from signing or from
/// [`XmssSignature::from_bytes`], which deserialization goes through.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(Serialize, Deserialize),
    serde(try_from = "Vec<u8>", into = "Vec<u8>")
)]
pub struct XmssSignature {
    index: u32,
    randomness: [u8; XMSS_N],
    wots_signature: WotsChains,
    auth_path: Vec<[u8; XMSS_N]>,
}

impl XmssSignature {
    /// Index of the leaf that produced the signature.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The message randomizer `R`.
    pub fn randomness(&self) -> &[u8; XMSS_N] {
        &self.randomness
    }

    pub fn wots_signature(&self) -> &WotsChains {
        &self.wots_signature
    }

    pub fn auth_path(&self) -> &[[u8; XMSS_N]] {
        &self.auth_path
    }

    /// Height of the tree the signature was made with.
    pub fn height(&self) -> u8 {
        self.auth_path.len() as u8
    }

    /// Length of [`to_bytes`](Self::to_bytes).
    pub fn encoded_len(&self) -> usize {
        signature_bytes(self.height())
    }

    /// `index || R || wots_sig || auth_path`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        bytes.extend_from_slice(&u32_to_bytes(self.index));
        bytes.extend_from_slice(&self.randomness);
        self.wots_signature
            .iter()
            .chain(self.auth_path.iter())
            .for_each(|node| bytes.extend_from_slice(node));
        bytes
    }

    /// Parses a signature, deriving the tree height from its length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let height = height_from_signature_len(bytes.len())?;

        let index = bytes_to_u32(&bytes[..XMSS_INDEX_BYTES])
            .ok_or_else(|| Error::MalformedSignature("truncated index".to_string()))?;
        let mut randomness = [0u8; XMSS_N];
        randomness.copy_from_slice(&bytes[XMSS_INDEX_BYTES..XMSS_INDEX_BYTES + XMSS_N]);

        let wots_start = XMSS_INDEX_BYTES + XMSS_N;
        let mut wots_signature = [[0u8; XMSS_N]; WOTS_LEN];
        for (chain, chunk) in wots_signature
            .iter_mut()
            .zip(bytes[wots_start..wots_start + WOTS_BYTES].chunks_exact(XMSS_N))
        {
            chain.copy_from_slice(chunk);
        }

        let auth_path: Vec<[u8; XMSS_N]> = bytes[XMSS_SIG_FIXED_BYTES..]
            .chunks_exact(XMSS_N)
            .map(|chunk| {
                let mut node = [0u8; XMSS_N];
                node.copy_from_slice(chunk);
                node
            })
            .collect();
        debug_assert_eq!(auth_path.len(), height as usize);

        Ok(Self {
            index,
            randomness,
            wots_signature,
            auth_path,
        })
    }
}

impl TryFrom<&[u8]> for XmssSignature {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl TryFrom<Vec<u8>> for XmssSignature {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes(&bytes)
    }
}

impl From<XmssSignature> for Vec<u8> {
    fn from(signature: XmssSignature) -> Self {
        signature.to_bytes()
    }
}

/// Recovers the tree height from a signature length, `2180 + 32 * h`.
///
/// # Errors
///
/// [`Error::MalformedSignature`] when no valid height has that length.
pub fn height_from_signature_len(len: usize) -> Result<u8> {
    let malformed = || {
        Error::MalformedSignature(format!(
            "{} bytes is not the length of any XMSS signature",
            len
        ))
    };
    if len < XMSS_SIG_FIXED_BYTES || (len - XMSS_SIG_FIXED_BYTES) % XMSS_N != 0 {
        return Err(malformed());
    }
    let height = (len - XMSS_SIG_FIXED_BYTES) / XMSS_N;
    if height > u8::MAX as usize || !is_valid_height(height as u8) {
        return Err(malformed());
    }
    Ok(height as u8)
}

/// `H_msg(R || root || toByte(idx, 32), message)`.
fn message_digest(
    hasher: &XmssHasher,
    randomness: &[u8; XMSS_N],
    root: &[u8],
    index: u32,
    message: &[u8],
) -> [u8; XMSS_N] {
    let mut key = [0u8; 3 * XMSS_N];
    key[..XMSS_N].copy_from_slice(randomness);
    key[XMSS_N..2 * XMSS_N].copy_from_slice(root);
    key[2 * XMSS_N..].copy_from_slice(&to_padded_bytes(index));

    let mut digest = [0u8; XMSS_N];
    hasher.h_msg(&mut digest, &key, message);
    digest
}

/// A stateful XMSS key pair.
pub struct Xmss {
    descriptor: Descriptor,
    strategy: TraversalStrategy,
    seed: XmssSeed,
    sk_prf: Zeroizing<[u8; XMSS_N]>,
    pub_seed: [u8; XMSS_N],
    ctx: TreeContext,
    traversal: Traversal,
    index: u32,
}

impl core::fmt::Debug for Xmss {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Xmss")
            .field("descriptor", &self.descriptor)
            .field("strategy", &self.strategy)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl Xmss {
    /// Generates a key pair from a 48-byte seed.
    ///
    /// # Arguments
    ///
    /// * `seed` - Secret seed; the same seed and parameters always give the
    ///   same key.
    /// * `height` - Tree height, even and within `2..=30`.
    /// * `hash_function` - Hash function for every tree hash.
    /// * `strategy` - How authentication paths are computed.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHeight`] or [`Error::InvalidBdsParameter`]; nothing is
    /// hashed before the parameters are validated.
    pub fn new(
        seed: &XmssSeed,
        height: u8,
        hash_function: HashFunction,
        strategy: TraversalStrategy,
    ) -> Result<Self> {
        let descriptor = Descriptor::new(hash_function, height)?;
        strategy.validate(height)?;

        let material = expand_key_seed(seed.as_ref());
        let mut sk_seed = Zeroizing::new([0u8; XMSS_N]);
        let mut sk_prf = Zeroizing::new([0u8; XMSS_N]);
        let mut pub_seed = [0u8; XMSS_N];
        sk_seed.copy_from_slice(&material[..XMSS_N]);
        sk_prf.copy_from_slice(&material[XMSS_N..2 * XMSS_N]);
        pub_seed.copy_from_slice(&material[2 * XMSS_N..]);

        let ctx = TreeContext::new(hash_function, &sk_seed, &pub_seed, height);
        let traversal = Traversal::build(&ctx, strategy)?;
        debug!(height, ?hash_function, ?strategy, "XMSS key generated");

        Ok(Self {
            descriptor,
            strategy,
            seed: seed.clone(),
            sk_prf,
            pub_seed,
            ctx,
            traversal,
            index: 0,
        })
    }

    /// SHAKE-128 key that recomputes the tree for every signature.
    pub fn basic(seed: &XmssSeed, height: u8) -> Result<Self> {
        Self::new(seed, height, HashFunction::Shake128, TraversalStrategy::Basic)
    }

    /// Key using the BDS traversal with the default `k`.
    pub fn fast(seed: &XmssSeed, height: u8, hash_function: HashFunction) -> Result<Self> {
        Self::new(
            seed,
            height,
            hash_function,
            TraversalStrategy::Fast { k: BDS_K },
        )
    }

    /// Rebuilds a key from `descriptor || seed`.
    pub fn from_extended_seed(extended_seed: &[u8], strategy: TraversalStrategy) -> Result<Self> {
        let extended_seed = ExtendedSeed::try_from(extended_seed)?;
        let descriptor = extended_seed.descriptor()?;
        Self::new(
            &extended_seed.seed(),
            descriptor.height(),
            descriptor.hash_function(),
            strategy,
        )
    }

    pub fn height(&self) -> u8 {
        self.descriptor.height()
    }

    pub fn hash_function(&self) -> HashFunction {
        self.descriptor.hash_function()
    }

    pub fn strategy(&self) -> TraversalStrategy {
        self.strategy
    }

    /// Index of the next leaf to be used.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn remaining_signatures(&self) -> u64 {
        self.ctx.leaf_count() - self.index as u64
    }

    pub fn descriptor(&self) -> Descriptor {
        self.descriptor
    }

    pub fn root(&self) -> &[u8; XMSS_N] {
        self.traversal.root()
    }

    pub fn pub_seed(&self) -> &[u8; XMSS_N] {
        &self.pub_seed
    }

    /// `descriptor || root || PUB_SEED`.
    pub fn extended_pk(&self) -> ExtendedPublicKey {
        let mut epk = [0u8; EXTENDED_PK_BYTES];
        epk[..DESCRIPTOR_BYTES].copy_from_slice(&self.descriptor.to_bytes());
        epk[DESCRIPTOR_BYTES..DESCRIPTOR_BYTES + XMSS_N].copy_from_slice(self.root());
        epk[DESCRIPTOR_BYTES + XMSS_N..].copy_from_slice(&self.pub_seed);
        ExtendedPublicKey(epk)
    }

    /// `idx || SK_SEED || SK_PRF || PUB_SEED || root`, reflecting the current index.
    pub fn secret_key_bytes(&self) -> Zeroizing<[u8; XMSS_SK_BYTES]> {
        let mut sk = Zeroizing::new([0u8; XMSS_SK_BYTES]);
        let index_bytes = u32_to_bytes(self.index);
        let parts: [&[u8]; 5] = [
            &index_bytes,
            self.ctx.sk_seed(),
            &self.sk_prf[..],
            &self.pub_seed,
            self.root(),
        ];
        let mut offset = 0;
        for part in parts {
            sk[offset..offset + part.len()].copy_from_slice(part);
            offset += part.len();
        }
        sk
    }

    pub fn seed(&self) -> &XmssSeed {
        &self.seed
    }

    pub fn extended_seed(&self) -> ExtendedSeed {
        ExtendedSeed::new(&self.descriptor, &self.seed)
    }

    pub fn address(&self) -> Address {
        address_of(&self.descriptor, self.extended_pk().as_ref())
    }

    pub fn signature_len(&self) -> usize {
        signature_bytes(self.height())
    }

    /// Signs `message` with the next unused leaf and advances the index.
    ///
    /// # Errors
    ///
    /// [`Error::ExhaustedKey`] once all `2^h` leaves are used.
    pub fn sign(&mut self, message: &[u8]) -> Result<XmssSignature> {
        if self.index as u64 >= self.ctx.leaf_count() {
            return Err(Error::ExhaustedKey {
                height: self.height(),
            });
        }
        let index = self.index;
        let hasher = self.ctx.wots().hasher();

        let mut randomness = [0u8; XMSS_N];
        hasher.prf(&mut randomness, &to_padded_bytes(index), &self.sk_prf[..]);
        let digest = message_digest(hasher, &randomness, self.traversal.root(), index, message);

        let wots_signature = self.ctx.wots().sign(&digest, self.ctx.sk_seed(), index);
        let auth_path = self.traversal.next_auth_path(&self.ctx, index);
        self.index += 1;
        trace!(index, remaining = self.remaining_signatures(), "message signed");

        Ok(XmssSignature {
            index,
            randomness,
            wots_signature,
            auth_path,
        })
    }

    /// Skips leaves up to `new_index` without signing.
    ///
    /// # Errors
    ///
    /// [`Error::IndexRegression`] when `new_index` is below the current index,
    /// [`Error::IndexOutOfRange`] when it exceeds `2^h`.
    pub fn advance_index(&mut self, new_index: u32) -> Result<()> {
        if new_index < self.index {
            return Err(Error::IndexRegression {
                current: self.index,
                requested: new_index,
            });
        }
        let capacity = self.ctx.leaf_count();
        if new_index as u64 > capacity {
            return Err(Error::IndexOutOfRange {
                index: new_index,
                max: capacity as u32,
            });
        }
        self.traversal.advance(&self.ctx, self.index, new_index);
        debug!(from = self.index, to = new_index, "index advanced");
        self.index = new_index;
        Ok(())
    }

    /// Checks `signature` over `message` against a 66-byte extended public key.
    /// Malformed inputs are reported as `false`.
    pub fn verify(message: &[u8], signature: &[u8], extended_pk: &[u8]) -> bool {
        match Self::try_verify(message, signature, extended_pk) {
            Ok(valid) => valid,
            Err(e) => {
                debug!(error = %e, "signature rejected");
                false
            }
        }
    }

    /// Like [`verify`](Self::verify), but structural problems with the
    /// signature or key are returned as errors. A well-formed signature that
    /// does not match gives `Ok(false)`.
    pub fn try_verify(message: &[u8], signature: &[u8], extended_pk: &[u8]) -> Result<bool> {
        let descriptor = Descriptor::from_extended_pk(extended_pk)?;
        let height = height_from_signature_len(signature.len())?;
        if height != descriptor.height() {
            return Err(Error::MalformedSignature(format!(
                "signature is for height {}, key has height {}",
                height,
                descriptor.height()
            )));
        }

        let parsed = XmssSignature::from_bytes(signature)?;
        let index = parsed.index;
        if index as u64 >= 1u64 << height {
            return Err(Error::MalformedSignature(format!(
                "index {} outside a tree of height {}",
                index, height
            )));
        }

        let root = &extended_pk[DESCRIPTOR_BYTES..DESCRIPTOR_BYTES + XMSS_N];
        let mut pub_seed = [0u8; XMSS_N];
        pub_seed.copy_from_slice(&extended_pk[DESCRIPTOR_BYTES + XMSS_N..]);
        let wots = WotsPlus::new(descriptor.hash_function(), &pub_seed);

        let digest = message_digest(wots.hasher(), &parsed.randomness, root, index, message);

        let wots_start = XMSS_INDEX_BYTES + XMSS_N;
        let mut wots_pk =
            wots.pk_from_sig(&signature[wots_start..wots_start + WOTS_BYTES], &digest, index)?;
        let leaf = l_tree(&wots, &mut wots_pk, index);

        let computed = root_from_auth_path(&wots, &leaf, index, &parsed.auth_path);
        Ok(computed[..].ct_eq(root).into())
    }

    /// Verifies `(message, signature, extended_pk)` triples in parallel.
    pub fn verify_batch(items: &[(&[u8], &[u8], &[u8])]) -> Vec<bool> {
        items
            .par_iter()
            .map(|(message, signature, extended_pk)| Self::verify(message, signature, extended_pk))
            .collect()
    }
}
