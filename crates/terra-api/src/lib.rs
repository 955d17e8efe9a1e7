pub mod admin;
pub mod auth;
pub mod authz;
pub mod carbon;
pub mod community;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod news;
pub mod rate_limit;
pub mod routes;

pub use auth::{AppState, AppStateInner};
pub use routes::{api_router, with_security_headers};
