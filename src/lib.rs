//! XMSS, the eXtended Merkle Signature Scheme, with n = 32 and w = 16 over
//! SHA2-256, SHAKE-128, or SHAKE-256, plus the 2-byte key descriptor and the
//! checksummed address format derived from extended public keys.
//!
//! Signing is stateful: an [`Xmss`] key hands out each of its `2^h` one-time
//! leaves exactly once. Verification needs only the extended public key.

mod error;
mod hash;
mod tree;
mod utils;

pub mod address;
pub mod descriptor;
pub mod params;
pub mod wots_plus;
pub mod xmss;

pub use crate::address::{address_is_valid, derive_address, Address};
pub use crate::descriptor::{AddressFormat, Descriptor, SignatureType};
pub use crate::error::{Error, Result};
pub use crate::hash::{sha2_256, shake128, shake256, HashFunction};
pub use crate::tree::TraversalStrategy;
pub use crate::xmss::{
    height_from_signature_len, ExtendedPublicKey, ExtendedSeed, Xmss, XmssSeed, XmssSignature,
};
