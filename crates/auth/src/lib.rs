//! `tillpoint-auth`: authentication/authorization boundary.
//!
//! Token, password and policy logic only; no HTTP and no storage.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{authorize, AuthzError, Principal};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use password::{hash_password, verify_password, PasswordError, DEFAULT_COST, MIN_PASSWORD_LEN};
pub use permissions::{role_permissions, Permission};
pub use principal::StoreMembership;
pub use roles::Role;
pub use token::{Hs256Jwt, JwtIssuer, JwtValidator, TokenError};
pub use user::{normalize_email, NewUser, User, UserPatch, UserStatus};
