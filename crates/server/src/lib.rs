//! Fashion Advisor server library.
//!
//! Registered users describe an occasion or upload a clothing photo and get
//! styling advice from Google Gemini, personalized with the body profile
//! captured at registration.
//!
//! The router is built by [`app::build_app`] so that the binary and the
//! integration tests serve the same stack.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod gemini;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
