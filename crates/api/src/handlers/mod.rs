//! Request handlers.
//!
//! Handlers turn HTTP input into core calls and map failures via
//! [`AppError`](crate::error::AppError).

pub mod compress;
pub mod transform;
