//! Authentication adapters.
//!
//! Implementations of the `SessionSource`, `CredentialAuth` and
//! `SessionValidator` ports:
//!
//! - `gotrue` - Hosted auth client (sign-in, sign-up, refresh, sign-out)
//! - `jwt` - HS256 bearer-token validation for the HTTP surface
//! - `request` - Fixed per-request session source used by the route pipeline
//! - `mock` - Test implementations that don't require external services

mod gotrue;
mod jwt;
mod mock;
mod request;

pub use gotrue::SupabaseAuthClient;
pub use jwt::{JwtSessionValidator, AUTHENTICATED_AUDIENCE};
pub use mock::{MockAuthClient, MockSessionValidator};
pub use request::RequestSessionSource;
