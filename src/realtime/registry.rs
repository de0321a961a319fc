use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

pub type ClientId = Uuid;

/// Serialized event frame shared across all receivers of one broadcast
pub type EventPayload = Arc<String>;

/// Sending half of a connected client's buffered event channel
pub type ClientSender = mpsc::Sender<EventPayload>;

/// Structured channel key. Booth and brand keys carry the tenant
/// hierarchy; client keys address a single connection (menu channel).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    Booth(Uuid),
    Brand(Uuid),
    Client(Uuid),
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Booth(id) => write!(f, "booth:{id}"),
            Self::Brand(id) => write!(f, "brand:{id}"),
            Self::Client(id) => write!(f, "client:{id}"),
        }
    }
}

/// Maps channel keys to the live client handles registered under them,
/// with a brand index for brand-wide delivery.
///
/// No capacity bound and no TTL: a handle that never fails a write and
/// never unregisters lives until process exit. Pruning on write failure
/// is the self-healing mechanism against stale connections.
#[derive(Default)]
pub struct ClientRegistry {
    channels: DashMap<ChannelKey, HashMap<ClientId, ClientSender>>,
    key_brands: DashMap<ChannelKey, Uuid>,
    brand_index: DashMap<Uuid, HashSet<ChannelKey>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client handle under `key`, creating the channel
    /// entry if absent, and records the key in the brand index.
    pub fn register(
        &self,
        key: ChannelKey,
        brand_id: Uuid,
        client_id: ClientId,
        sender: ClientSender,
    ) {
        self.channels
            .entry(key.clone())
            .or_default()
            .insert(client_id, sender);
        self.key_brands.insert(key.clone(), brand_id);
        self.brand_index.entry(brand_id).or_default().insert(key);
    }

    /// Removes a client handle. The channel key (and its brand index
    /// entry) is dropped entirely once its handle map empties out.
    /// Idempotent: unknown keys and client ids are ignored.
    pub fn unregister(&self, key: &ChannelKey, client_id: ClientId) {
        let emptied = {
            let Some(mut handles) = self.channels.get_mut(key) else {
                return;
            };
            handles.remove(&client_id);
            handles.is_empty()
        };

        if !emptied {
            return;
        }
        // remove_if re-checks emptiness so a concurrent register wins
        if self
            .channels
            .remove_if(key, |_, handles| handles.is_empty())
            .is_none()
        {
            return;
        }

        if let Some((_, brand_id)) = self.key_brands.remove(key) {
            let brand_emptied = self
                .brand_index
                .get_mut(&brand_id)
                .map(|mut keys| {
                    keys.remove(key);
                    keys.is_empty()
                })
                .unwrap_or(false);
            if brand_emptied {
                self.brand_index
                    .remove_if(&brand_id, |_, keys| keys.is_empty());
            }
        }
    }

    /// Snapshot of the handles registered under one key
    pub fn handles_for(&self, key: &ChannelKey) -> Vec<(ClientId, ClientSender)> {
        self.channels
            .get(key)
            .map(|handles| {
                handles
                    .iter()
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All keys currently registered for a brand
    pub fn brand_keys(&self, brand_id: Uuid) -> Vec<ChannelKey> {
        self.brand_index
            .get(&brand_id)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every registered channel key
    pub fn keys(&self) -> Vec<ChannelKey> {
        self.channels.iter().map(|e| e.key().clone()).collect()
    }

    /// Total number of registered client handles
    pub fn client_count(&self) -> usize {
        self.channels.iter().map(|e| e.value().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> ClientSender {
        mpsc::channel(4).0
    }

    #[test]
    fn empty_keys_are_dropped() {
        let registry = ClientRegistry::new();
        let brand = Uuid::new_v4();
        let key = ChannelKey::Booth(Uuid::new_v4());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        registry.register(key.clone(), brand, a, sender());
        registry.register(key.clone(), brand, b, sender());
        assert_eq!(registry.client_count(), 2);
        assert_eq!(registry.keys(), vec![key.clone()]);

        registry.unregister(&key, a);
        assert_eq!(registry.keys(), vec![key.clone()]);

        registry.unregister(&key, b);
        assert!(registry.keys().is_empty());
        assert!(registry.brand_keys(brand).is_empty());
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = ClientRegistry::new();
        let key = ChannelKey::Brand(Uuid::new_v4());
        let client = Uuid::new_v4();

        registry.unregister(&key, client);

        registry.register(key.clone(), Uuid::new_v4(), client, sender());
        registry.unregister(&key, client);
        registry.unregister(&key, client);
        assert!(registry.keys().is_empty());
    }

    #[test]
    fn brand_index_tracks_all_key_flavors() {
        let registry = ClientRegistry::new();
        let brand = Uuid::new_v4();
        let booth_key = ChannelKey::Booth(Uuid::new_v4());
        let brand_key = ChannelKey::Brand(brand);

        registry.register(booth_key.clone(), brand, Uuid::new_v4(), sender());
        registry.register(brand_key.clone(), brand, Uuid::new_v4(), sender());

        let mut keys = registry.brand_keys(brand);
        keys.sort_by_key(|k| k.to_string());
        let mut expected = vec![booth_key, brand_key];
        expected.sort_by_key(|k| k.to_string());
        assert_eq!(keys, expected);
    }
}
