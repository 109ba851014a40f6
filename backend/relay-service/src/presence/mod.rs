/// User presence tracking
///
/// [`PresenceRegistry`] maps each user to at most one live [`ConnectionHandle`].
/// It is a plain owned map: the relay hub actor owns the only instance and
/// serializes every access through its mailbox.
pub mod handle;
pub mod registry;

pub use handle::{ConnectionHandle, ConnectionId};
pub use registry::PresenceRegistry;
