//! Fashion Advisor Core - Shared types library.
//!
//! This crate provides common types used across all Fashion Advisor components:
//! - `server` - The web application (auth, uploads, advice)
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and body profiles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
