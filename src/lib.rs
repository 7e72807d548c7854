//! Library crate for signage-back, exposing modules for binaries and integration tests.

mod config;
pub mod context;
mod dto;
mod error;
pub mod routes;
pub mod services;
pub mod state;
