//! Core data model definitions shared across A-Pay crates.
//!
//! Field names on the wire follow the backend's JSON (`usuario`, `rol`,
//! `nombreResponsable`, `idIglesia`); the Rust side uses English names.
#![allow(missing_docs)]

pub mod auth;
pub mod error;
pub mod ids;
pub mod identity;
pub mod role;

pub use auth::{ApiErrorBody, LoginRequest};
pub use error::{ModelError, Result as ModelResult};
pub use identity::Identity;
pub use ids::ChurchId;
pub use role::Role;
