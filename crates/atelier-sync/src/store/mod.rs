//! Client-side notification store.

pub mod snapshot;
pub mod store;

pub use snapshot::StoreSnapshot;
pub use store::NotificationStore;
