//! Wire-level event types delivered by realtime transports.

pub mod notification;

pub use notification::{ChangeEvent, ChannelStatus};
