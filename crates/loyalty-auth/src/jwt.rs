//! Signed session tokens
//!
//! Sessions are HS256 JWTs bound to the `loyalty-mart` issuer. A token
//! from another issuer is rejected even when the signature matches.

use crate::claims::{Claims, SESSION_ISSUER};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use loyalty_core::AppError;
use std::fmt;
use tracing::{debug, error, warn};

/// Issues and verifies Mart session tokens
#[derive(Clone)]
pub struct JwtService {
    session_ttl_secs: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// ```
    /// use loyalty_auth::JwtService;
    ///
    /// let jwt = JwtService::new("my-secret-key", 3600);
    /// assert_eq!(jwt.session_ttl_secs(), 3600);
    /// ```
    pub fn new(secret: &str, session_ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            session_ttl_secs,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign arbitrary claims
    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to sign session token");
            AppError::Internal(format!("Session token signing failed: {}", e))
        })
    }

    /// New session token for `login`
    pub fn issue_session(&self, login: &str) -> Result<String, AppError> {
        debug!(%login, ttl_secs = self.session_ttl_secs, "Issuing session token");
        self.sign(&Claims::for_session(login, self.session_ttl_secs))
    }

    /// Check signature, issuer and expiry of a session token
    ///
    /// Fails with `TokenExpired` for an expired session and `InvalidToken`
    /// for anything else.
    pub fn verify_session(&self, token: &str) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => {
                    warn!(error = %e, "Rejected session token");
                    AppError::InvalidToken(e.to_string())
                }
            })?
            .claims;

        // decode() allows some leeway, sessions end on time
        if claims.is_expired() {
            return Err(AppError::TokenExpired);
        }
        Ok(claims)
    }

    pub fn session_ttl_secs(&self) -> i64 {
        self.session_ttl_secs
    }
}

impl fmt::Debug for JwtService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtService")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
