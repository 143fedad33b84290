//! Prelude for the `rolegate` crate.
//!
//! This module re-exports the types and macros application crates use.

pub use crate::{
    AppData, FrameworkApp,
    auth::{AuthUser, Claims},
    error::{AppError, AppResult},
    structs::UserRole,
};

// Full crate re-exports (so users don't need them in Cargo.toml)
pub use actix_web::{Responder, get, main, web, web::Data};
pub use log::debug;
pub use serde::Serialize;
pub use serde_json::json;
