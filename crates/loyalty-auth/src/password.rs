//! Argon2id password hashing

use argon2::password_hash::{
    Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use loyalty_core::AppError;
use rand_core::OsRng;
use tracing::error;

/// Hashes and checks user passwords
///
/// Hashes are PHC strings with a fresh salt each, so the parameters used
/// travel with the hash.
#[derive(Debug, Clone, Default)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> Self {
        Self::default()
    }

    /// PHC hash of `password`
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!(error = %e, "Password hashing failed");
                AppError::PasswordHash(e.to_string())
            })
    }

    /// Whether `password` matches `stored`
    ///
    /// A mismatch is `Ok(false)`; an unusable stored hash is an error.
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(stored).map_err(|e| {
            error!(error = %e, "Stored password hash is malformed");
            AppError::PasswordHash(e.to_string())
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => Err(AppError::PasswordHash(e.to_string())),
        }
    }
}
