//! Trait seams implemented by injected collaborators.

pub mod transport;

pub use transport::{EventSink, RealtimeTransport};
