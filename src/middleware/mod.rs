pub mod auth;
pub mod auth_guard;
pub mod response;

pub use auth::{edge_gate, is_protected, Authenticated};
pub use auth_guard::{auth_guard, auth_panic_response};
pub use response::ApiResponse;
