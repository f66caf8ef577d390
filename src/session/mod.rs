//! Session claims and token issuing.

pub mod claims;
pub mod issuer;

pub use claims::SessionClaim;
pub use issuer::{IssuedSession, JwtSigner, SessionIssuer, TokenSigner};
