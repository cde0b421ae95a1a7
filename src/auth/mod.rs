pub mod guard;
pub mod handlers;
pub mod session;

pub use guard::{require_auth, AuthState, CurrentUser};
