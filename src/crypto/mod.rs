//! The key scheme protecting MIX headers.
//!
//! An encrypted MIX wraps a random 56 byte Blowfish session key with a
//! 320 bit RSA style public operation (Westwood's "fast" key) and stores
//! the wrapped key in front of the Blowfish encrypted header. Multi
//! precision values are little-endian throughout, matching the game's
//! own big number library.

use blowfish::{
    cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt},
    Blowfish,
};
use num_bigint::BigUint;
use rand::RngCore;

/// Size of a Blowfish session key.
pub const BLOWFISH_KEY_SIZE: usize = 56;
/// Blowfish block size.
pub const BLOWFISH_BLOCK_SIZE: usize = 8;
/// Size of one RSA ciphertext block, equal to the modulus size.
pub const CRYPT_BLOCK_SIZE: usize = 40;
/// Size of one RSA cleartext block. One byte short of the modulus so any
/// block value stays below it.
pub const PLAIN_BLOCK_SIZE: usize = CRYPT_BLOCK_SIZE - 1;
/// Size of a wrapped session key: two ciphertext blocks.
pub const WRAPPED_KEY_SIZE: usize = 2 * CRYPT_BLOCK_SIZE;

/// A 56 byte Blowfish session key.
pub type BlowfishKey = [u8; BLOWFISH_KEY_SIZE];
/// An RSA wrapped session key as stored in an encrypted MIX header.
pub type WrappedKey = [u8; WRAPPED_KEY_SIZE];

/// Exponent (e) of Westwood's "fast" key.
const EXPONENT: &[u8] = &[1, 0, 1];
/// Modulus (n) of Westwood's "fast" key.
const MODULUS: &[u8] = &[
    21, 127, 67, 170, 61, 79, 251, 209, 230, 193, 176, 248, 106, 14, 221, 171, 74, 176, 130, 102,
    250, 84, 170, 232, 162, 63, 113, 81, 214, 96, 81, 86, 228, 252, 57, 109, 8, 218, 188, 81,
];
/// Private exponent (d) of Westwood's "fast" key.
const INVERSE: &[u8] = &[
    129, 48, 137, 130, 230, 244, 251, 161, 6, 87, 223, 27, 78, 39, 88, 67, 51, 212, 180, 74, 174,
    174, 208, 219, 91, 94, 16, 84, 124, 198, 34, 196, 71, 156, 19, 153, 188, 55, 86, 10,
];

/// The error type for key wrapping and unwrapping.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The unwrapped session key failed its padding sanity check.
    #[error("Session key decryption failed the padding sanity check")]
    DecryptionFailed,
    /// Wrapped key material of the wrong length was supplied.
    #[error("Expected a wrapped key of {WRAPPED_KEY_SIZE} bytes, but got {0}")]
    WrongWrappedKeySize(usize),
}

type Result<T> = std::result::Result<T, Error>;

/// One half of an RSA style key: an exponent over the shared modulus.
#[derive(Clone, Debug)]
pub struct PKey {
    exponent: BigUint,
    modulus: BigUint,
}

impl PKey {
    /// Build a key from little-endian exponent and modulus bytes.
    pub fn from_le_bytes(exponent: &[u8], modulus: &[u8]) -> Self {
        Self {
            exponent: BigUint::from_bytes_le(exponent),
            modulus: BigUint::from_bytes_le(modulus),
        }
    }

    /// The raw operation on one block: `value ^ exponent mod modulus`,
    /// re-serialized little-endian and zero padded to `out_len`.
    fn exp_mod(&self, block: &[u8], out_len: usize) -> Vec<u8> {
        let mut out = BigUint::from_bytes_le(block)
            .modpow(&self.exponent, &self.modulus)
            .to_bytes_le();
        out.resize(out_len, 0);
        out
    }
}

/// The public and private halves of the embedded key.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public: PKey,
    pub private: PKey,
}

/// Load the embedded Westwood key pair.
pub fn key_init() -> KeyPair {
    KeyPair {
        public: PKey::from_le_bytes(EXPONENT, MODULUS),
        private: PKey::from_le_bytes(INVERSE, MODULUS),
    }
}

/// Draw a random Blowfish session key.
pub fn generate_key(rng: &mut dyn RngCore) -> BlowfishKey {
    let mut key = [0u8; BLOWFISH_KEY_SIZE];
    rng.fill_bytes(&mut key);
    key
}

/// Wrap a session key: two cleartext blocks of 39 bytes (the second zero
/// padded), each exponentiated into a 40 byte ciphertext block.
pub fn wrap_key(key: &BlowfishKey, pk: &PKey) -> WrappedKey {
    let mut padded = [0u8; 2 * PLAIN_BLOCK_SIZE];
    padded[..BLOWFISH_KEY_SIZE].copy_from_slice(key);
    let mut wrapped = [0u8; WRAPPED_KEY_SIZE];
    for (plain, crypt) in padded
        .chunks_exact(PLAIN_BLOCK_SIZE)
        .zip(wrapped.chunks_exact_mut(CRYPT_BLOCK_SIZE))
    {
        crypt.copy_from_slice(&pk.exp_mod(plain, CRYPT_BLOCK_SIZE));
    }
    wrapped
}

/// Unwrap a session key. The zero padding behind the 56 key bytes doubles
/// as an integrity check on the key used.
pub fn unwrap_key(wrapped: &[u8], pk: &PKey) -> Result<BlowfishKey> {
    if wrapped.len() != WRAPPED_KEY_SIZE {
        return Err(Error::WrongWrappedKeySize(wrapped.len()));
    }
    let plain: Vec<u8> = wrapped
        .chunks_exact(CRYPT_BLOCK_SIZE)
        .flat_map(|block| pk.exp_mod(block, PLAIN_BLOCK_SIZE))
        .collect();
    if plain[BLOWFISH_KEY_SIZE..].iter().any(|&b| b != 0) {
        return Err(Error::DecryptionFailed);
    }
    let mut key = [0u8; BLOWFISH_KEY_SIZE];
    key.copy_from_slice(&plain[..BLOWFISH_KEY_SIZE]);
    Ok(key)
}

/// Expand a session key into a Blowfish cipher state.
pub fn init_cipher(key: &BlowfishKey) -> Blowfish {
    let mut cipher = Blowfish::bc_init_state();
    cipher.bc_expand_key(key);
    cipher
}

/// Encrypt one 8 byte block in place.
pub fn encrypt_block(cipher: &Blowfish, block: &mut [u8; BLOWFISH_BLOCK_SIZE]) {
    let mut ga = GenericArray::from(*block);
    cipher.encrypt_block(&mut ga);
    block.copy_from_slice(&ga);
}

/// Decrypt one 8 byte block in place.
pub fn decrypt_block(cipher: &Blowfish, block: &mut [u8; BLOWFISH_BLOCK_SIZE]) {
    let mut ga = GenericArray::from(*block);
    cipher.decrypt_block(&mut ga);
    block.copy_from_slice(&ga);
}
