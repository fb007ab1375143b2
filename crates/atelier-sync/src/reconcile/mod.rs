//! Inbound event reconciliation.

pub mod extract;
pub mod reconciler;

pub use reconciler::EventReconciler;
