//! # atelier-core
//!
//! Core crate for the Atelier notification synchronizer. Contains the
//! unified error system, configuration schemas, typed identifiers, channel
//! credentials, transport event types, and the realtime transport trait.
//!
//! This crate has **no** internal dependencies on other Atelier crates.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
