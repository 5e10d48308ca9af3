//! # Key Descriptor
//!
//! A 2-byte tag at the front of every extended public key, extended seed, and
//! address. It records the choices that are not fixed by the parameter set:
//!
//! ```text
//! byte 0 = signature_type << 4 | hash_function
//! byte 1 = address_format << 4 | height / 2
//! ```
//!
//! Halving the height is why only even heights from 2 to 30 can be described.

use crate::hash::HashFunction;
use crate::params::{is_valid_height, DESCRIPTOR_BYTES, EXTENDED_PK_BYTES};
use crate::{Error, Result};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Signature scheme family. Only plain XMSS is defined.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum SignatureType {
    Xmss = 0,
}

impl TryFrom<u8> for SignatureType {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(SignatureType::Xmss),
            _ => Err(Error::UnsupportedSignatureType(code)),
        }
    }
}

/// How addresses are derived from the extended public key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum AddressFormat {
    /// SHA2-256 of the key followed by a checksum from a second SHA2-256.
    Sha256_2x = 0,
}

impl TryFrom<u8> for AddressFormat {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(AddressFormat::Sha256_2x),
            _ => Err(Error::UnsupportedAddressFormat(code)),
        }
    }
}

/// Hash function, signature type, tree height, and address format of a key.
///
/// Serialized as its two encoded bytes, so deserialization rejects exactly
/// what [`Descriptor::from_bytes`] rejects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(Serialize, Deserialize),
    serde(try_from = "[u8; 2]", into = "[u8; 2]")
)]
pub struct Descriptor {
    hash_function: HashFunction,
    signature_type: SignatureType,
    height: u8,
    address_format: AddressFormat,
}

impl Descriptor {
    /// Descriptor of an XMSS key with SHA256_2X addresses.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHeight`] unless `height` is even and within `2..=30`.
    pub fn new(hash_function: HashFunction, height: u8) -> Result<Self> {
        if !is_valid_height(height) {
            return Err(Error::InvalidHeight(height));
        }
        Ok(Self {
            hash_function,
            signature_type: SignatureType::Xmss,
            height,
            address_format: AddressFormat::Sha256_2x,
        })
    }

    pub fn hash_function(&self) -> HashFunction {
        self.hash_function
    }

    pub fn signature_type(&self) -> SignatureType {
        self.signature_type
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn address_format(&self) -> AddressFormat {
        self.address_format
    }

    pub fn to_bytes(&self) -> [u8; DESCRIPTOR_BYTES] {
        [
            (self.signature_type as u8) << 4 | (self.hash_function as u8),
            (self.address_format as u8) << 4 | (self.height >> 1),
        ]
    }

    /// Decodes a descriptor, rejecting unknown codes and a zero height.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != DESCRIPTOR_BYTES {
            return Err(Error::BadLength(DESCRIPTOR_BYTES, bytes.len()));
        }
        let hash_function = HashFunction::try_from(bytes[0] & 0x0f)?;
        let signature_type = SignatureType::try_from(bytes[0] >> 4)?;
        let address_format = AddressFormat::try_from(bytes[1] >> 4)?;
        let height = (bytes[1] & 0x0f) << 1;
        if !is_valid_height(height) {
            return Err(Error::InvalidHeight(height));
        }

        Ok(Self {
            hash_function,
            signature_type,
            height,
            address_format,
        })
    }

    /// Reads the descriptor at the front of an extended public key.
    pub fn from_extended_pk(extended_pk: &[u8]) -> Result<Self> {
        if extended_pk.len() != EXTENDED_PK_BYTES {
            return Err(Error::MalformedPublicKey(format!(
                "expected {} bytes, found {}",
                EXTENDED_PK_BYTES,
                extended_pk.len()
            )));
        }
        Self::from_bytes(&extended_pk[..DESCRIPTOR_BYTES])
    }
}

impl TryFrom<[u8; DESCRIPTOR_BYTES]> for Descriptor {
    type Error = Error;

    fn try_from(bytes: [u8; DESCRIPTOR_BYTES]) -> Result<Self> {
        Self::from_bytes(&bytes)
    }
}

impl From<Descriptor> for [u8; DESCRIPTOR_BYTES] {
    fn from(descriptor: Descriptor) -> Self {
        descriptor.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_round_trip() {
        for hf in [
            HashFunction::Sha2_256,
            HashFunction::Shake128,
            HashFunction::Shake256,
        ] {
            for height in (2..=30).step_by(2) {
                let descriptor = Descriptor::new(hf, height).unwrap();
                let bytes = descriptor.to_bytes();
                assert_eq!(Descriptor::from_bytes(&bytes).unwrap(), descriptor);
            }
        }
    }

    #[test]
    fn test_descriptor_layout() {
        let descriptor = Descriptor::new(HashFunction::Shake128, 4).unwrap();
        assert_eq!(descriptor.to_bytes(), [0x01, 0x02]);

        let descriptor = Descriptor::new(HashFunction::Shake256, 30).unwrap();
        assert_eq!(descriptor.to_bytes(), [0x02, 0x0f]);
    }

    #[test]
    fn test_descriptor_rejects() {
        assert_eq!(
            Descriptor::new(HashFunction::Sha2_256, 7),
            Err(Error::InvalidHeight(7))
        );
        assert_eq!(
            Descriptor::new(HashFunction::Sha2_256, 0),
            Err(Error::InvalidHeight(0))
        );
        assert_eq!(
            Descriptor::new(HashFunction::Sha2_256, 32),
            Err(Error::InvalidHeight(32))
        );
        assert_eq!(
            Descriptor::from_bytes(&[0x03, 0x02]),
            Err(Error::UnsupportedHashFunction(3))
        );
        assert_eq!(
            Descriptor::from_bytes(&[0x11, 0x02]),
            Err(Error::UnsupportedSignatureType(1))
        );
        assert_eq!(
            Descriptor::from_bytes(&[0x01, 0x12]),
            Err(Error::UnsupportedAddressFormat(1))
        );
        assert_eq!(
            Descriptor::from_bytes(&[0x01, 0x00]),
            Err(Error::InvalidHeight(0))
        );
        assert_eq!(
            Descriptor::from_bytes(&[0x01]),
            Err(Error::BadLength(2, 1))
        );
    }

    #[test]
    fn test_from_extended_pk() {
        let mut epk = [0u8; EXTENDED_PK_BYTES];
        epk[0] = 0x02;
        epk[1] = 0x03;
        let descriptor = Descriptor::from_extended_pk(&epk).unwrap();
        assert_eq!(descriptor.hash_function(), HashFunction::Shake256);
        assert_eq!(descriptor.height(), 6);

        assert!(matches!(
            Descriptor::from_extended_pk(&epk[..48]),
            Err(Error::MalformedPublicKey(_))
        ));
    }

    #[cfg(feature = "serialization")]
    #[test]
    fn test_serde_goes_through_codec() {
        let descriptor = Descriptor::new(HashFunction::Shake128, 6).unwrap();
        let json = serde_json::to_string(&descriptor).unwrap();
        assert_eq!(json, "[1,3]");
        assert_eq!(serde_json::from_str::<Descriptor>(&json).unwrap(), descriptor);

        // height nibble 0, address format 2, hash code 3, signature type 1
        for bad in ["[1,0]", "[1,32]", "[3,2]", "[17,2]", "[1]", "[1,2,0]"] {
            assert!(serde_json::from_str::<Descriptor>(bad).is_err(), "{bad}");
        }

        let fields = r#"{"hash_function":"Shake128","signature_type":"Xmss","height":7,"address_format":"Sha256_2x"}"#;
        assert!(serde_json::from_str::<Descriptor>(fields).is_err());
    }
}
