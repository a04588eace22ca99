//! Shared server state: the hub and the entities it tracks.

mod channel;
mod hub;
pub mod persistence;
mod session;

pub use channel::{Channel, PendingState};
pub use hub::{Hub, HubInner, VERSION};
pub use session::Session;

/// Opaque per-connection identity, unique for the process lifetime and
/// never reused.
pub type ConnId = u64;
