//! Domain models for the fashion advisor.

pub mod session;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
