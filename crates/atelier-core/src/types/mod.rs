//! Core type definitions used across the Atelier workspace.

pub mod credential;
pub mod id;

pub use credential::{ChannelCredential, CredentialClaims};
pub use id::*;
