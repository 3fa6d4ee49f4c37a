use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};

use super::crypt::CryptError;

/// Cost parameters for Argon2id password derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Config {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Derive a PHC-format credential string from a plaintext password.
///
/// Salt is generated per call and embedded in the output along with the
/// cost parameters, so verification needs only the derived string.
pub fn derive_password(password: &str, cfg: &Argon2Config) -> Result<String, CryptError> {
    let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
        .map_err(|e| CryptError::Derive(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CryptError::Derive(e.to_string()))
}

/// Check a plaintext password against a derived credential.
///
/// Digest comparison inside argon2 is constant-time. `Ok(false)` means the
/// password is wrong; `Err` means the stored credential is unusable.
pub fn verify_password(password: &str, derived: &str) -> Result<bool, CryptError> {
    let parsed = PasswordHash::new(derived).map_err(|_| CryptError::Malformed)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CryptError::Derive(e.to_string())),
    }
}
