// Credential codec: field encryption, digests, password derivation, and the
// string safety guard used by entity constructors.

pub mod crypt;
pub mod password;
pub mod safe;

pub use crypt::{decrypt, digest, encrypt, CryptError, Key};
pub use password::{derive_password, verify_password, Argon2Config};
pub use safe::safe_str;

/// Key material and cost settings bound together for the store adapters.
///
/// Built once at startup and shared read-only; tests construct their own
/// instances with independent keys.
#[derive(Debug, Clone)]
pub struct Codec {
    key: Key,
    argon2: Argon2Config,
}

impl Codec {
    pub fn new(key: Key, argon2: Argon2Config) -> Self {
        Self { key, argon2 }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptError> {
        encrypt(plaintext, &self.key)
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptError> {
        decrypt(ciphertext, &self.key)
    }

    pub fn derive_password(&self, password: &str) -> Result<String, CryptError> {
        derive_password(password, &self.argon2)
    }
}
