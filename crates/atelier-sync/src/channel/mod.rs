//! Realtime channel management.

pub mod backoff;
pub mod manager;
pub mod scope;
pub mod state;

pub use backoff::RetryPolicy;
pub use manager::ChannelManager;
pub use scope::ChannelScope;
pub use state::ChannelState;
