//! # atelier-entity
//!
//! Domain entity models for the Atelier notification synchronizer.

pub mod notification;

pub use notification::{NotificationBatch, NotificationRecord};
