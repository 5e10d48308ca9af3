use ::sha2::{Digest, Sha256};

/// SHA2-256 over the concatenation of `parts`.
pub(crate) fn sha256(output: &mut [u8], parts: &[&[u8]]) {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    output[..32].copy_from_slice(hasher.finalize().as_ref());
}
