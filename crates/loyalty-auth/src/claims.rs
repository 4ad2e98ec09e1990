//! Session token claims

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// Issuer written into every Mart session token
pub const SESSION_ISSUER: &str = "loyalty-mart";

/// Claims of a Mart session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Login of the session owner
    pub sub: String,

    pub iss: String,

    /// Unix timestamps
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Session of `login` lasting `ttl_secs` from now
    ///
    /// ```
    /// use loyalty_auth::Claims;
    ///
    /// let claims = Claims::for_session("alice", 60);
    /// assert_eq!(claims.login(), "alice");
    /// assert_eq!(claims.exp - claims.iat, 60);
    /// ```
    pub fn for_session(login: &str, ttl_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: login.to_string(),
            iss: SESSION_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }

    pub fn login(&self) -> &str {
        &self.sub
    }

    /// Seconds until expiry, zero once expired
    pub fn remaining_secs(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}
