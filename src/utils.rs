use crate::params::XMSS_N;

pub(crate) fn u32_to_bytes(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

pub(crate) fn bytes_to_u32(bytes: &[u8]) -> Option<u32> {
    bytes.try_into().ok().map(u32::from_be_bytes)
}

pub(crate) fn set_u32_at(array: &mut [u8], value: u32, start_index: usize) {
    array[start_index..start_index + 4].copy_from_slice(&u32_to_bytes(value));
}

/// Big-endian `value` left-padded with zeros to `XMSS_N` bytes, i.e. `toByte(value, n)`.
pub(crate) fn to_padded_bytes(value: u32) -> [u8; XMSS_N] {
    let mut out = [0u8; XMSS_N];
    set_u32_at(&mut out, value, XMSS_N - 4);
    out
}

macro_rules! array_struct {
    (@traits $type: ident) => {
        impl AsRef<[u8]> for $type {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl PartialEq for $type {
            fn eq(&self, other: &Self) -> bool {
                subtle::ConstantTimeEq::ct_eq(self.0.as_ref(), other.0.as_ref()).into()
            }
        }

        impl Eq for $type {}
    };
    (@hex_debug $type: ident) => {
        impl core::fmt::Debug for $type {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}({})", stringify!($type), hex::encode(self.0))
            }
        }
    };
    (@common $type: ident, $size: expr) => {
        /// Holds data as a fixed-size `u8` array.
        /// Serialization is provided via the `serialization` feature.
        #[derive(Clone, zeroize::Zeroize)]
        #[cfg_attr(
            feature = "serialization",
            derive(serde::Serialize, serde::Deserialize)
        )]
        pub struct $type(
            #[cfg_attr(feature = "serialization", serde(with = "serde_big_array::BigArray"))]
            pub(crate) [u8; $size],
        );

        $crate::utils::array_struct!(@traits $type);

        impl From<[u8; $size]> for $type {
            fn from(value: [u8; $size]) -> Self {
                Self(value)
            }
        }

        impl TryFrom<&[u8]> for $type {
            type Error = $crate::Error;
            fn try_from(data: &[u8]) -> core::result::Result<$type, $crate::Error> {
                if data.len() != $size {
                    Err($crate::Error::BadLength($size, data.len()))
                } else {
                    let mut array = [0u8; $size];
                    array.copy_from_slice(data);
                    Ok($type(array))
                }
            }
        }
    };
    ($type: ident, $size: expr) => {
        $crate::utils::array_struct!(@common $type, $size);
        $crate::utils::array_struct!(@hex_debug $type);
    };
    (secret $type: ident, $size: expr) => {
        $crate::utils::array_struct!(@common $type, $size);

        impl Drop for $type {
            fn drop(&mut self) {
                zeroize::Zeroize::zeroize(&mut self.0);
            }
        }

        impl core::fmt::Debug for $type {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}(..)", stringify!($type))
            }
        }
    };
    // Every way in, `TryFrom` and deserialization included, goes through the
    // type's own `from_bytes`.
    (checked $type: ident, $size: expr) => {
        /// Holds data as a fixed-size `u8` array that passed `from_bytes`.
        /// Serialization is provided via the `serialization` feature.
        #[derive(Clone, zeroize::Zeroize)]
        #[cfg_attr(
            feature = "serialization",
            derive(serde::Serialize, serde::Deserialize),
            serde(try_from = "Vec<u8>", into = "Vec<u8>")
        )]
        pub struct $type(pub(crate) [u8; $size]);

        $crate::utils::array_struct!(@traits $type);
        $crate::utils::array_struct!(@hex_debug $type);

        impl TryFrom<&[u8]> for $type {
            type Error = $crate::Error;
            fn try_from(data: &[u8]) -> core::result::Result<$type, $crate::Error> {
                $type::from_bytes(data)
            }
        }

        impl TryFrom<Vec<u8>> for $type {
            type Error = $crate::Error;
            fn try_from(data: Vec<u8>) -> core::result::Result<$type, $crate::Error> {
                $type::from_bytes(&data)
            }
        }

        impl From<$type> for Vec<u8> {
            fn from(value: $type) -> Self {
                value.0.to_vec()
            }
        }
    };
}

pub(crate) use array_struct;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_padded_bytes() {
        let out = to_padded_bytes(0x0102_0304);
        assert!(out[..XMSS_N - 4].iter().all(|&b| b == 0));
        assert_eq!(out[XMSS_N - 4..], [1, 2, 3, 4]);
    }

    #[test]
    fn test_bytes_to_u32() {
        assert_eq!(bytes_to_u32(&[0, 0, 1, 0]), Some(256));
        assert_eq!(bytes_to_u32(&[0, 1, 0]), None);
    }
}
