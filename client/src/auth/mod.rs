//! Authentication state and flows.
//!
//! [`AuthSession`] is the shared answer to "is someone signed in, and with
//! which token". [`AuthManager`] drives the login/register/refresh/logout
//! flows against the remote API and updates the session.

mod manager;
mod session;

pub use manager::*;
pub use session::*;
