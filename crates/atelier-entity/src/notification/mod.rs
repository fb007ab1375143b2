//! Notification domain entities.

pub mod batch;
pub mod model;

pub use batch::NotificationBatch;
pub use model::NotificationRecord;
