//! Device event types and the publish/subscribe bus.
//!
//! The registry is the single producer; any number of independent
//! consumers (SSE bridges, loggers, billing hooks) subscribe and receive
//! every event. Dropping a `Receiver` revokes the subscription.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::types::Device;

/// Which lifecycle edge an event describes. Serialized with the wire
/// names consumed by the delivery layer.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum DeviceEventKind {
    #[serde(rename = "device:new")]
    New,
    #[serde(rename = "device:seen")]
    Seen,
    #[serde(rename = "device:online")]
    Online,
    #[serde(rename = "device:offline")]
    Offline,
}

/// An event emitted by the device registry, carrying the full current
/// device snapshot including its session list.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceEvent {
    #[serde(rename = "event")]
    pub kind: DeviceEventKind,
    pub device: Device,
}

/// One-producer many-consumer event channel backed by
/// `tokio::sync::broadcast`. Slow subscribers lag and miss events rather
/// than blocking the registry.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DeviceEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Register a new subscriber. The returned receiver is the
    /// cancellation handle: dropping it unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers. Publishing with no
    /// subscribers is not an error.
    pub fn publish(&self, kind: DeviceEventKind, device: Device) {
        let _ = self.tx.send(DeviceEvent { kind, device });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::Offer;
    use crate::types::Sighting;
    use chrono::Utc;

    fn device() -> Device {
        let s = Sighting {
            ip: "192.168.1.7".parse().unwrap(),
            mac: Some("aa:bb:cc:dd:ee:ff".to_string()),
            rtt_ms: Some(1.2),
            hostname: None,
            vendor: None,
            netbios: None,
            os_guess: None,
        };
        Device::from_sighting(&s, Offer::OneHour, Utc::now())
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(DeviceEventKind::New, device());

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, DeviceEventKind::New);
        assert_eq!(ev.device.id, "aa:bb:cc:dd:ee:ff");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_not_fatal() {
        let bus = EventBus::new(8);
        bus.publish(DeviceEventKind::Seen, device());
    }

    #[test]
    fn event_wire_names() {
        let json = serde_json::to_value(DeviceEvent {
            kind: DeviceEventKind::Offline,
            device: device(),
        })
        .unwrap();
        assert_eq!(json["event"], "device:offline");
        assert!(json["device"]["sessions"].is_array());
    }
}
