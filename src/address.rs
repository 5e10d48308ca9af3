//! Addresses derived from extended public keys.
//!
//! ```text
//! address = descriptor (2) || SHA-256(epk) (32) || checksum (4)
//! checksum = last 4 bytes of SHA-256(SHA-256(epk))
//! ```

use crate::descriptor::{AddressFormat, Descriptor};
use crate::hash::sha2_256;
use crate::params::{ADDRESS_BYTES, ADDRESS_CHECKSUM_BYTES, ADDRESS_HASH_BYTES, DESCRIPTOR_BYTES};
use crate::utils::array_struct;
use crate::{Error, Result};
use subtle::ConstantTimeEq;
use tracing::debug;

array_struct!(checked Address, ADDRESS_BYTES);

impl Address {
    /// Parses and fully validates an address. `TryFrom` and deserialization
    /// go through here as well.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ADDRESS_BYTES {
            return Err(Error::MalformedAddress(format!(
                "expected {} bytes, found {}",
                ADDRESS_BYTES,
                bytes.len()
            )));
        }
        Descriptor::from_bytes(&bytes[..DESCRIPTOR_BYTES])
            .map_err(|e| Error::MalformedAddress(e.to_string()))?;

        let hash = &bytes[DESCRIPTOR_BYTES..DESCRIPTOR_BYTES + ADDRESS_HASH_BYTES];
        let checksum = &bytes[DESCRIPTOR_BYTES + ADDRESS_HASH_BYTES..];
        if !bool::from(address_checksum(hash)[..].ct_eq(checksum)) {
            return Err(Error::MalformedAddress("checksum mismatch".to_string()));
        }

        let mut array = [0u8; ADDRESS_BYTES];
        array.copy_from_slice(bytes);
        Ok(Address(array))
    }

    /// The descriptor of the key this address was derived from.
    pub fn descriptor(&self) -> Result<Descriptor> {
        Descriptor::from_bytes(&self.0[..DESCRIPTOR_BYTES])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn address_checksum(hash: &[u8]) -> [u8; ADDRESS_CHECKSUM_BYTES] {
    let digest = sha2_256(hash);
    let mut checksum = [0u8; ADDRESS_CHECKSUM_BYTES];
    checksum.copy_from_slice(&digest[digest.len() - ADDRESS_CHECKSUM_BYTES..]);
    checksum
}

/// Derives the address of a 66-byte extended public key.
///
/// # Errors
///
/// [`Error::MalformedPublicKey`] for a key of the wrong size, or any
/// descriptor decoding error.
pub fn derive_address(extended_pk: &[u8]) -> Result<Address> {
    let descriptor = Descriptor::from_extended_pk(extended_pk)?;
    Ok(address_of(&descriptor, extended_pk))
}

/// Address of a key whose descriptor is already decoded.
pub(crate) fn address_of(descriptor: &Descriptor, extended_pk: &[u8]) -> Address {
    let hash = match descriptor.address_format() {
        AddressFormat::Sha256_2x => sha2_256(extended_pk),
    };

    let mut address = [0u8; ADDRESS_BYTES];
    address[..DESCRIPTOR_BYTES].copy_from_slice(&descriptor.to_bytes());
    address[DESCRIPTOR_BYTES..DESCRIPTOR_BYTES + ADDRESS_HASH_BYTES].copy_from_slice(&hash);
    address[DESCRIPTOR_BYTES + ADDRESS_HASH_BYTES..].copy_from_slice(&address_checksum(&hash));
    Address(address)
}

/// Returns `true` when `bytes` has the address length, a decodable descriptor,
/// and a matching checksum.
pub fn address_is_valid(bytes: &[u8]) -> bool {
    match Address::from_bytes(bytes) {
        Ok(_) => true,
        Err(e) => {
            debug!(error = %e, "address rejected");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::EXTENDED_PK_BYTES;

    const SHAKE128_H4_PK: &str = "0102c25188b585f731c128e2b457069eafd1e3fa3961605af8c58a1aec4d82ac316d3191da3442686282b3d5160f25cf162a517fd2131f83fbf2698a58f9c46afc5d";
    const SHAKE128_H4_ADDRESS: &str =
        "010274764b521b002b55c57fa182142310c0bd6f2be9b3d673bf2e7f731e86da45ed70fa3b21";

    #[test]
    fn test_derive_address_vector() {
        let epk = hex::decode(SHAKE128_H4_PK).unwrap();
        let address = derive_address(&epk).unwrap();
        assert_eq!(address.to_hex(), SHAKE128_H4_ADDRESS);
        assert_eq!(address.to_string(), SHAKE128_H4_ADDRESS);
        assert_eq!(address.descriptor().unwrap().height(), 4);
        assert!(address_is_valid(address.as_ref()));
    }

    #[test]
    fn test_address_validation() {
        let address = hex::decode(SHAKE128_H4_ADDRESS).unwrap();
        assert!(address_is_valid(&address));
        assert!(!address_is_valid(&address[..ADDRESS_BYTES - 1]));

        for position in [0, 1, 10, ADDRESS_BYTES - 1] {
            let mut corrupted = address.clone();
            corrupted[position] ^= 0x40;
            assert!(!address_is_valid(&corrupted), "byte {position}");
        }

        assert!(matches!(
            Address::from_bytes(&address[1..]),
            Err(Error::MalformedAddress(_))
        ));
    }

    #[test]
    fn test_try_from_checks_checksum() {
        let mut address = hex::decode(SHAKE128_H4_ADDRESS).unwrap();
        assert!(Address::try_from(&address[..]).is_ok());

        address[ADDRESS_BYTES - 1] ^= 1;
        assert_eq!(
            Address::try_from(&address[..]),
            Err(Error::MalformedAddress("checksum mismatch".to_string()))
        );
        assert!(Address::try_from(address).is_err());
    }

    #[cfg(feature = "serialization")]
    #[test]
    fn test_deserialize_checks_checksum() {
        let address = Address::from_bytes(&hex::decode(SHAKE128_H4_ADDRESS).unwrap()).unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), address);

        let mut bytes: Vec<u8> = serde_json::from_str(&json).unwrap();
        bytes[10] ^= 0x40;
        let corrupted = serde_json::to_string(&bytes).unwrap();
        assert!(serde_json::from_str::<Address>(&corrupted).is_err());

        let short = serde_json::to_string(&bytes[1..]).unwrap();
        assert!(serde_json::from_str::<Address>(&short).is_err());
    }

    #[test]
    fn test_derive_address_rejects_bad_keys() {
        assert!(matches!(
            derive_address(&[0u8; EXTENDED_PK_BYTES - 1]),
            Err(Error::MalformedPublicKey(_))
        ));

        let mut epk = hex::decode(SHAKE128_H4_PK).unwrap();
        epk[0] = 0x05;
        assert_eq!(derive_address(&epk), Err(Error::UnsupportedHashFunction(5)));
    }
}
