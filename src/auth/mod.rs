//! Caller authentication
//!
//! Bearer header parsing and JWT verification. A successful verification
//! yields an [`Identity`], which is the only way a caller id enters the rest
//! of the server.

pub mod bearer;
#[cfg(any(test, feature = "dev-tokens"))]
pub mod dev;
pub mod verifier;

pub use bearer::extract_bearer;
pub use verifier::{Identity, TokenVerifier};
