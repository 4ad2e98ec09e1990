//! Registration and login handlers

use crate::dto::{AuthResponse, CredentialsRequest};
use crate::state::PgUserService;
use actix_web::{http::header, web, HttpResponse};
use loyalty_auth::session_cookie;
use loyalty_core::AppError;
use tracing::{instrument, warn};
use validator::Validate;

/// Register a new user and open a session
///
/// POST /api/user/register
#[instrument(skip(users, req), fields(login = %req.login))]
pub async fn register(
    users: web::Data<PgUserService>,
    req: web::Json<CredentialsRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Register validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let token = users.register(&req.login, &req.password).await?;
    Ok(session_response(token, users.session_ttl_secs()))
}

/// Open a session for an existing user
///
/// POST /api/user/login
#[instrument(skip(users, req), fields(login = %req.login))]
pub async fn login(
    users: web::Data<PgUserService>,
    req: web::Json<CredentialsRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Login validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let token = users.login(&req.login, &req.password).await?;
    Ok(session_response(token, users.session_ttl_secs()))
}

fn session_response(token: String, expires_in: i64) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(session_cookie(&token, expires_in))
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .json(AuthResponse::new(token, expires_in))
}

/// Configure auth routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/register", web::post().to(register))
        .route("/login", web::post().to(login));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_response_carries_token() {
        let resp = session_response("abc.def.ghi".to_string(), 3600);
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer abc.def.ghi"
        );
        let cookie = resp.cookies().next().unwrap();
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc.def.ghi");
    }

    #[test]
    fn test_credentials_validation() {
        let req = CredentialsRequest {
            login: String::new(),
            password: "secret".to_string(),
        };
        assert!(req.validate().is_err());

        let req = CredentialsRequest {
            login: "alice".to_string(),
            password: "secret".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}
