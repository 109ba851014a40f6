use event_schema::UserId;
use std::collections::HashMap;

use super::{ConnectionHandle, ConnectionId};

/// `UserId -> ConnectionHandle`, last registration wins
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: HashMap<UserId, ConnectionHandle>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `user_id`
    ///
    /// Returns the replaced handle, if any. The replaced connection is left
    /// open; closing it is up to the lifecycle layer.
    pub fn register(
        &mut self,
        user_id: UserId,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        self.entries.insert(user_id, handle)
    }

    /// Remove the entry only if it still belongs to `connection_id`
    ///
    /// A disconnect from a superseded connection must not evict the newer one.
    pub fn unregister(&mut self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        match self.entries.get(user_id) {
            Some(current) if current.id() == connection_id => {
                self.entries.remove(user_id);
                true
            }
            _ => false,
        }
    }

    pub fn lookup(&self, user_id: &UserId) -> Option<&ConnectionHandle> {
        self.entries.get(user_id)
    }

    /// Currently present users, sorted for stable output
    pub fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.entries.keys().cloned().collect();
        users.sort();
        users
    }

    pub fn handles(&self) -> impl Iterator<Item = &ConnectionHandle> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry (shutdown)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
