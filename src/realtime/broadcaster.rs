use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use super::registry::{ChannelKey, ClientId, ClientRegistry, EventPayload};
use crate::events::RealtimeEvent;

/// Fans events out to the clients registered for their target channels.
///
/// Constructed once at startup and owned by the application state; the
/// server runs two instances, one for the general booth/brand channel
/// and one for the client-keyed menu channel.
#[derive(Default)]
pub struct EventBroadcaster {
    registry: ClientRegistry,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Delivers an event to every client registered under the event's
    /// booth key or brand key. Returns the number of deliveries.
    pub fn broadcast(&self, event: &RealtimeEvent) -> usize {
        let Some(payload) = serialize(event) else {
            return 0;
        };

        let mut keys = Vec::with_capacity(2);
        if let Some(booth_id) = event.booth_id {
            keys.push(ChannelKey::Booth(booth_id));
        }
        keys.push(ChannelKey::Brand(event.brand_id));

        self.deliver(&keys, payload)
    }

    /// Delivers an event to every client of a brand, whatever key they
    /// registered under, via the brand index.
    pub fn broadcast_to_brand(&self, brand_id: Uuid, event: &RealtimeEvent) -> usize {
        let Some(payload) = serialize(event) else {
            return 0;
        };
        let keys = self.registry.brand_keys(brand_id);
        self.deliver(&keys, payload)
    }

    /// Delivers a message to every registered client (menu channel).
    pub fn broadcast_all<T: Serialize>(&self, event: &T) -> usize {
        let Some(payload) = serialize(event) else {
            return 0;
        };
        let keys = self.registry.keys();
        self.deliver(&keys, payload)
    }

    fn deliver(&self, keys: &[ChannelKey], payload: EventPayload) -> usize {
        let mut delivered = 0usize;
        let mut dead: Vec<(ChannelKey, ClientId)> = Vec::new();

        for key in keys {
            for (client_id, sender) in self.registry.handles_for(key) {
                if sender.try_send(payload.clone()).is_ok() {
                    delivered += 1;
                } else {
                    // Closed or backed-up channel: the client is gone or
                    // has stopped draining. Prune it.
                    dead.push((key.clone(), client_id));
                }
            }
        }

        for (key, client_id) in dead {
            debug!(%key, %client_id, "pruning unreachable realtime client");
            self.registry.unregister(&key, client_id);
        }

        delivered
    }
}

fn serialize<T: Serialize>(event: &T) -> Option<EventPayload> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Arc::new(json)),
        Err(e) => {
            error!(error = %e, "failed to serialize realtime event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RealtimeEvent;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    fn event(brand: Uuid, booth: Uuid) -> RealtimeEvent {
        RealtimeEvent::stock_update(brand, booth, Uuid::new_v4(), "noodles", dec!(10), dec!(5))
    }

    #[tokio::test]
    async fn delivers_to_booth_and_brand_keys_only() {
        let broadcaster = EventBroadcaster::new();
        let brand = Uuid::new_v4();
        let booth = Uuid::new_v4();
        let other_booth = Uuid::new_v4();

        let (booth_tx, mut booth_rx) = mpsc::channel(4);
        let (brand_tx, mut brand_rx) = mpsc::channel(4);
        let (other_tx, mut other_rx) = mpsc::channel(4);

        let registry = broadcaster.registry();
        registry.register(ChannelKey::Booth(booth), brand, Uuid::new_v4(), booth_tx);
        registry.register(ChannelKey::Brand(brand), brand, Uuid::new_v4(), brand_tx);
        registry.register(
            ChannelKey::Booth(other_booth),
            brand,
            Uuid::new_v4(),
            other_tx,
        );

        let delivered = broadcaster.broadcast(&event(brand, booth));
        assert_eq!(delivered, 2);
        assert!(booth_rx.try_recv().is_ok());
        assert!(brand_rx.try_recv().is_ok());
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_write_prunes_after_one_attempt() {
        let broadcaster = EventBroadcaster::new();
        let brand = Uuid::new_v4();
        let booth = Uuid::new_v4();
        let client = Uuid::new_v4();

        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        broadcaster
            .registry()
            .register(ChannelKey::Booth(booth), brand, client, tx);

        assert_eq!(broadcaster.broadcast(&event(brand, booth)), 0);
        assert!(broadcaster.registry().keys().is_empty());

        // a second broadcast finds nothing to deliver to
        assert_eq!(broadcaster.broadcast(&event(brand, booth)), 0);
    }

    #[tokio::test]
    async fn brand_broadcast_uses_index_not_key_text() {
        let broadcaster = EventBroadcaster::new();
        let brand_a = Uuid::new_v4();
        let brand_b = Uuid::new_v4();
        let booth_a = Uuid::new_v4();
        let booth_b = Uuid::new_v4();

        let (a_tx, mut a_rx) = mpsc::channel(4);
        let (b_tx, mut b_rx) = mpsc::channel(4);

        let registry = broadcaster.registry();
        registry.register(ChannelKey::Booth(booth_a), brand_a, Uuid::new_v4(), a_tx);
        registry.register(ChannelKey::Booth(booth_b), brand_b, Uuid::new_v4(), b_tx);

        let delivered = broadcaster.broadcast_to_brand(brand_a, &event(brand_a, booth_a));
        assert_eq!(delivered, 1);
        assert!(a_rx.try_recv().is_ok());
        assert!(b_rx.try_recv().is_err());
    }
}
