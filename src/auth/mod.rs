//! Login entry points — challenge request/verify orchestration and routes.

pub mod routes;
pub mod service;

pub use routes::{AuthRouteState, auth_routes};
pub use service::{AuthService, ChallengeResponse, VerifyResponse};
