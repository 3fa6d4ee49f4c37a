use rand::RngCore;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length in bytes of a symmetric key
pub const KEY_LEN: usize = 32;

/// Errors from the credential codec
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptError {
    #[error("invalid key material")]
    InvalidKey,

    #[error("encryption failed")]
    Encrypt,

    /// Authentication tag did not verify: wrong key or tampered ciphertext
    #[error("decryption failed")]
    Decrypt,

    #[error("malformed ciphertext")]
    Malformed,

    #[error("password derivation failed: {0}")]
    Derive(String),
}

/// Symmetric key used for field encryption and token signing
#[derive(Clone, PartialEq, Eq)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    /// Derive a key from an arbitrary seed string (sha256 of the seed)
    pub fn from_seed(seed: &str) -> Self {
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&Sha256::digest(seed.as_bytes()));
        Self(bytes)
    }

    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key(..)")
    }
}

fn aead_key(key: &Key) -> Result<LessSafeKey, CryptError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key.as_bytes()).map_err(|_| CryptError::InvalidKey)?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` with AES-256-GCM under `key`.
///
/// Output is hex(nonce || ciphertext || tag); a fresh random nonce is used
/// for every call, so equal plaintexts produce different ciphertexts.
pub fn encrypt(plaintext: &str, key: &Key) -> Result<String, CryptError> {
    let sealing = aead_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.as_bytes().to_vec();
    sealing
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CryptError::Encrypt)?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&in_out);
    Ok(hex::encode(sealed))
}

/// Decrypt a value produced by [`encrypt`]. A wrong key yields
/// [`CryptError::Decrypt`], never garbage plaintext.
pub fn decrypt(ciphertext: &str, key: &Key) -> Result<String, CryptError> {
    let raw = hex::decode(ciphertext).map_err(|_| CryptError::Malformed)?;
    if raw.len() < NONCE_LEN + AES_256_GCM.tag_len() {
        return Err(CryptError::Malformed);
    }

    let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| CryptError::Malformed)?;

    let opening = aead_key(key)?;
    let mut in_out = sealed.to_vec();
    let plaintext = opening
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CryptError::Decrypt)?;

    String::from_utf8(plaintext.to_vec()).map_err(|_| CryptError::Decrypt)
}

/// Deterministic one-way digest (hex sha256), safe to store and log
pub fn digest(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}
