//! Core types for Fashion Advisor.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod profile;

pub use email::{Email, EmailError};
pub use id::*;
pub use profile::BodyProfile;
