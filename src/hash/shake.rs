use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake128, Shake256,
};

/// SHAKE-128 over the concatenation of `parts`, filling `output`.
pub(crate) fn shake128(output: &mut [u8], parts: &[&[u8]]) {
    let mut hasher = Shake128::default();
    for part in parts {
        hasher.update(part);
    }
    let mut reader = hasher.finalize_xof();
    reader.read(output);
}

/// SHAKE-256 over the concatenation of `parts`, filling `output`.
pub(crate) fn shake256(output: &mut [u8], parts: &[&[u8]]) {
    let mut hasher = Shake256::default();
    for part in parts {
        hasher.update(part);
    }
    let mut reader = hasher.finalize_xof();
    reader.read(output);
}
