//! Toolbench API server library.
//!
//! Exposes config, state, error handling, the batch engine and routes so
//! integration tests and the binary entrypoint can both access them.

pub mod archive;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
