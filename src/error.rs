use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid length: expected {0} bytes, found {1} bytes")]
    BadLength(usize, usize),
    #[error("Invalid tree height {0}: expected an even height between 2 and 30")]
    InvalidHeight(u8),
    #[error("Invalid BDS parameters: height {height} with k = {k} (need h > k >= 2 and h - k even)")]
    InvalidBdsParameter { height: u8, k: u32 },
    #[error("Unsupported hash function code {0}")]
    UnsupportedHashFunction(u8),
    #[error("Unsupported signature type code {0}")]
    UnsupportedSignatureType(u8),
    #[error("Unsupported address format code {0}")]
    UnsupportedAddressFormat(u8),
    #[error("Key exhausted: all 2^{height} one-time keys have been used")]
    ExhaustedKey { height: u8 },
    #[error("Cannot move the key index back from {current} to {requested}")]
    IndexRegression { current: u32, requested: u32 },
    #[error("Key index {index} exceeds the key capacity {max}")]
    IndexOutOfRange { index: u32, max: u32 },
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),
    #[error("Malformed address: {0}")]
    MalformedAddress(String),
    #[error("Malformed public key: {0}")]
    MalformedPublicKey(String),
}

pub type Result<T> = std::result::Result<T, Error>;
