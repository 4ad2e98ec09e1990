//! Actix-web session extractor
//!
//! Handlers taking an `AuthenticatedUser` only run for requests carrying a
//! valid session token, either as `Authorization: Bearer` or as the
//! `token` cookie set at login.

use crate::jwt::JwtService;
use crate::Claims;
use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use loyalty_core::AppError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "token";

/// Session cookie issued on register and login
pub fn session_cookie(token: &str, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .finish()
}

/// Extract JWT token from request
///
/// The Authorization header wins over the cookie.
fn extract_token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(token) = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    req.cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Verified identity of the caller
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Login of the authenticated user
    pub login: String,

    /// Full claims from the JWT token
    pub claims: Claims,
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(jwt_service) = req.app_data::<web::Data<Arc<JwtService>>>() else {
            warn!("JwtService not found in app data");
            return ready(Err(AppError::Unauthorized(
                "Authentication service not configured".to_string(),
            )
            .into()));
        };

        let Some(token) = extract_token_from_request(req) else {
            debug!("No authentication token found in request");
            return ready(Err(AppError::Unauthorized(
                "No authentication token provided".to_string(),
            )
            .into()));
        };

        match jwt_service.verify_session(&token) {
            Ok(claims) => {
                debug!(login = %claims.sub, "User authenticated");
                ready(Ok(AuthenticatedUser {
                    login: claims.sub.clone(),
                    claims,
                }))
            }
            Err(e) => ready(Err(e.into())),
        }
    }
}
