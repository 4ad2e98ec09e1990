//! Authentication for the Mart service
//!
//! This crate provides JWT sessions, Argon2 password hashing and the
//! Actix-web extractor that hands a verified login to the handlers.
//!
//! # Examples
//!
//! ```no_run
//! use loyalty_auth::{JwtService, PasswordService};
//!
//! let passwords = PasswordService::new();
//! let hash = passwords.hash("secure_password")?;
//! assert!(passwords.verify("secure_password", &hash)?);
//!
//! let jwt = JwtService::new("your-secret-key", 3600);
//! let token = jwt.issue_session("alice")?;
//! assert_eq!(jwt.verify_session(&token)?.sub, "alice");
//! # Ok::<(), loyalty_core::AppError>(())
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::{session_cookie, AuthenticatedUser, SESSION_COOKIE};
pub use password::PasswordService;
