//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `uploads` - Image upload storage
//! - `advisor` - Prompt building, model invocation, and shopping links

pub mod advisor;
pub mod auth;
pub mod uploads;
