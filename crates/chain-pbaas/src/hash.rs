use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Length of a BLAKE2b personalization string.
pub const PERSONALIZATION_LEN: usize = 16;

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// RIPEMD-160(SHA-256(data)).
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

/// SHA-256(SHA-256(data)), the transaction id and legacy sighash digest.
pub fn hash256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// BLAKE2b-256 with a 16-byte personalization string.
pub fn blake2b_256_personal(personalization: &[u8; PERSONALIZATION_LEN], data: &[u8]) -> [u8; 32] {
    let hash = blake2b_simd::Params::new()
        .hash_length(32)
        .personal(personalization)
        .hash(data);

    let mut result = [0u8; 32];
    result.copy_from_slice(hash.as_bytes());
    result
}
