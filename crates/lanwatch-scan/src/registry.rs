//! Device registry: turns sightings into online/offline transitions and
//! offer-bounded session lifecycles.
//!
//! The registry map is guarded by one async mutex; every mutation happens
//! in a single critical section with no awaits inside, so overlapping
//! scan cycles interleave only between whole merges. Devices are created,
//! never deleted.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use lanwatch_core::{
    Device, DeviceEventKind, EventBus, Offer, Session, SessionStatus, Sighting,
};

use crate::config::ScanConfig;

/// Policies governing session closure.
///
/// Two independent offline triggers exist: inactivity (no sighting within
/// `offline_timeout`) and, when `enforce_offer_expiry` is set, the offer
/// boundary elapsing regardless of activity.
#[derive(Debug, Clone)]
pub struct RegistryPolicy {
    pub default_offer: Offer,
    pub offline_timeout: Duration,
    pub enforce_offer_expiry: bool,
}

impl RegistryPolicy {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            default_offer: Offer::parse(&config.default_offer),
            offline_timeout: Duration::seconds(config.offline_timeout_secs as i64),
            enforce_offer_expiry: config.enforce_offer_expiry,
        }
    }
}

pub struct DeviceRegistry {
    devices: Mutex<HashMap<String, Device>>,
    bus: EventBus,
    policy: RegistryPolicy,
}

impl DeviceRegistry {
    pub fn new(bus: EventBus, policy: RegistryPolicy) -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            bus,
            policy,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Fold one sighting into the registry.
    pub async fn apply_sighting(&self, sighting: Sighting) {
        self.apply_sighting_at(sighting, Utc::now()).await;
    }

    pub async fn apply_sighting_at(&self, sighting: Sighting, now: DateTime<Utc>) {
        let key = sighting.identity_key();
        let mut devices = self.devices.lock().await;

        match devices.entry(key) {
            Entry::Vacant(slot) => {
                let device = Device::from_sighting(&sighting, self.policy.default_offer, now);
                tracing::info!(id = %device.id, ip = %device.ip, "New device");
                self.bus.publish(DeviceEventKind::New, device.clone());
                slot.insert(device);
            }
            Entry::Occupied(mut slot) => {
                let device = slot.get_mut();
                device.merge_sighting(&sighting);
                device.last_seen = now;

                match device.active_session() {
                    None => {
                        // Reaped or expired earlier; re-sighting alone does
                        // not reopen a session (billing requires an
                        // explicit refresh).
                        device.online = false;
                    }
                    Some(idx) => {
                        let boundary = session_boundary(device, idx);
                        if boundary <= now {
                            device.sessions[idx].ends_at = Some(boundary);
                            device.sessions[idx].status = SessionStatus::Expired;
                            device.online = false;
                            tracing::info!(id = %device.id, "Session expired on re-sighting");
                        }
                    }
                }

                self.bus.publish(DeviceEventKind::Seen, device.clone());
            }
        }
    }

    /// Reap pass: transition stale online devices to offline. Never
    /// deletes a device; idempotent for already-offline devices.
    pub async fn reap(&self) -> usize {
        self.reap_at(Utc::now()).await
    }

    pub async fn reap_at(&self, now: DateTime<Utc>) -> usize {
        let mut devices = self.devices.lock().await;
        let mut reaped = 0;

        for device in devices.values_mut() {
            if !device.online {
                continue;
            }
            let inactive = now - device.last_seen > self.policy.offline_timeout;
            let active = device.active_session().map(|idx| {
                let boundary = session_boundary(device, idx);
                (idx, boundary)
            });
            let offer_elapsed = self.policy.enforce_offer_expiry
                && active.map_or(false, |(_, boundary)| boundary <= now);

            if !inactive && !offer_elapsed {
                continue;
            }

            if let Some((idx, boundary)) = active {
                let end = if boundary <= now { boundary } else { now };
                device.sessions[idx].ends_at = Some(end);
                device.sessions[idx].status = SessionStatus::Expired;
            }
            device.online = false;
            reaped += 1;
            tracing::info!(
                id = %device.id,
                inactive,
                offer_elapsed,
                "Device reaped offline"
            );
            self.bus.publish(DeviceEventKind::Offline, device.clone());
        }

        reaped
    }

    /// The explicit session-refresh action: reassign the offer (when
    /// given), close any running session, and open a fresh one. This is
    /// the only path that brings an expired device back online.
    pub async fn refresh_session(&self, id: &str, offer: Option<Offer>) -> Option<Device> {
        self.refresh_session_at(id, offer, Utc::now()).await
    }

    pub async fn refresh_session_at(
        &self,
        id: &str,
        offer: Option<Offer>,
        now: DateTime<Utc>,
    ) -> Option<Device> {
        let mut devices = self.devices.lock().await;
        let device = devices.get_mut(id)?;

        if let Some(new_offer) = offer {
            device.offer = new_offer;
        }
        if let Some(idx) = device.active_session() {
            let boundary = session_boundary(device, idx);
            let end = if boundary <= now { boundary } else { now };
            device.sessions[idx].ends_at = Some(end);
            device.sessions[idx].status = SessionStatus::Expired;
        }
        device.sessions.push(Session::open(device.offer, now));
        let was_online = device.online;
        device.online = true;
        device.last_seen = now;

        let kind = if was_online {
            DeviceEventKind::Seen
        } else {
            DeviceEventKind::Online
        };
        self.bus.publish(kind, device.clone());
        Some(device.clone())
    }

    /// Snapshot of all devices, sorted by address.
    pub async fn all(&self) -> Vec<Device> {
        let devices = self.devices.lock().await;
        let mut list: Vec<Device> = devices.values().cloned().collect();
        list.sort_by_key(|d| d.ip);
        list
    }

    pub async fn get(&self, id: &str) -> Option<Device> {
        self.devices.lock().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.devices.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.lock().await.is_empty()
    }
}

/// A session's boundary: its recorded `ends_at`, else computed from the
/// device's offer and the session start.
fn session_boundary(device: &Device, idx: usize) -> DateTime<Utc> {
    let session = &device.sessions[idx];
    session
        .ends_at
        .unwrap_or_else(|| device.offer.ends_at_utc(session.started_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanwatch_core::DeviceEvent;
    use tokio::sync::broadcast::Receiver;

    fn policy() -> RegistryPolicy {
        RegistryPolicy {
            default_offer: Offer::OneHour,
            offline_timeout: Duration::seconds(30),
            enforce_offer_expiry: true,
        }
    }

    fn registry() -> (DeviceRegistry, Receiver<DeviceEvent>) {
        let bus = EventBus::new(64);
        let rx = bus.subscribe();
        (DeviceRegistry::new(bus, policy()), rx)
    }

    fn sighting(ip: &str, mac: &str) -> Sighting {
        Sighting {
            ip: ip.parse().unwrap(),
            mac: Some(mac.to_string()),
            rtt_ms: Some(1.0),
            hostname: None,
            vendor: None,
            netbios: None,
            os_guess: None,
        }
    }

    fn drain(rx: &mut Receiver<DeviceEvent>) -> Vec<DeviceEventKind> {
        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        kinds
    }

    const MAC: &str = "aa:bb:cc:dd:ee:ff";

    #[tokio::test]
    async fn first_sighting_creates_one_device_one_session_one_new_event() {
        let (registry, mut rx) = registry();
        let now = Utc::now();

        registry.apply_sighting_at(sighting("192.168.1.5", MAC), now).await;

        assert_eq!(registry.len().await, 1);
        let device = registry.get(MAC).await.unwrap();
        assert!(device.online);
        assert_eq!(device.sessions.len(), 1);
        assert!(device.sessions[0].is_active());
        assert_eq!(drain(&mut rx), vec![DeviceEventKind::New]);
    }

    #[tokio::test]
    async fn resighting_active_device_emits_seen_without_new_session() {
        let (registry, mut rx) = registry();
        let t0 = Utc::now();

        registry.apply_sighting_at(sighting("192.168.1.5", MAC), t0).await;
        registry
            .apply_sighting_at(sighting("192.168.1.5", MAC), t0 + Duration::minutes(5))
            .await;

        let device = registry.get(MAC).await.unwrap();
        assert!(device.online);
        assert_eq!(device.sessions.len(), 1);
        assert_eq!(device.last_seen, t0 + Duration::minutes(5));
        assert_eq!(
            drain(&mut rx),
            vec![DeviceEventKind::New, DeviceEventKind::Seen]
        );
    }

    #[tokio::test]
    async fn identity_key_survives_address_change() {
        let (registry, _rx) = registry();
        let t0 = Utc::now();

        registry.apply_sighting_at(sighting("192.168.1.5", MAC), t0).await;
        registry
            .apply_sighting_at(sighting("192.168.1.99", MAC), t0 + Duration::minutes(1))
            .await;

        assert_eq!(registry.len().await, 1);
        let device = registry.get(MAC).await.unwrap();
        assert_eq!(device.ip.to_string(), "192.168.1.99");
    }

    #[tokio::test]
    async fn sighting_after_expiry_closes_session_without_replacement() {
        let (registry, mut rx) = registry();
        let t0 = Utc::now();

        registry.apply_sighting_at(sighting("192.168.1.5", MAC), t0).await;
        // OneHour offer: two hours later the boundary is long past.
        registry
            .apply_sighting_at(sighting("192.168.1.5", MAC), t0 + Duration::hours(2))
            .await;

        let device = registry.get(MAC).await.unwrap();
        assert!(!device.online);
        assert_eq!(device.sessions.len(), 1);
        assert_eq!(device.sessions[0].status, SessionStatus::Expired);
        // Closed at the offer boundary, not at the sighting time.
        assert_eq!(device.sessions[0].ends_at, Some(t0 + Duration::hours(1)));
        assert_eq!(
            drain(&mut rx),
            vec![DeviceEventKind::New, DeviceEventKind::Seen]
        );
    }

    #[tokio::test]
    async fn reap_closes_stale_devices_exactly_once() {
        let (registry, mut rx) = registry();
        let t0 = Utc::now();

        registry.apply_sighting_at(sighting("192.168.1.5", MAC), t0).await;
        drain(&mut rx);

        let reaped = registry.reap_at(t0 + Duration::seconds(60)).await;
        assert_eq!(reaped, 1);

        let device = registry.get(MAC).await.unwrap();
        assert!(!device.online);
        assert_eq!(device.sessions[0].status, SessionStatus::Expired);
        // Inactivity close stamps the reap time.
        assert_eq!(device.sessions[0].ends_at, Some(t0 + Duration::seconds(60)));
        assert_eq!(drain(&mut rx), vec![DeviceEventKind::Offline]);

        // Second run is a no-op for already-offline devices.
        let reaped = registry.reap_at(t0 + Duration::seconds(120)).await;
        assert_eq!(reaped, 0);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn reap_enforces_offer_expiry_even_when_recently_seen() {
        // Inactivity alone would never fire here; only the offer boundary
        // can take the device offline.
        let bus = EventBus::new(64);
        let policy = RegistryPolicy {
            default_offer: Offer::OneHour,
            offline_timeout: Duration::days(1),
            enforce_offer_expiry: true,
        };
        let registry = DeviceRegistry::new(bus, policy);
        let t0 = Utc::now();

        registry.apply_sighting_at(sighting("192.168.1.5", MAC), t0).await;
        registry
            .apply_sighting_at(sighting("192.168.1.5", MAC), t0 + Duration::minutes(30))
            .await;

        let reaped = registry.reap_at(t0 + Duration::minutes(61)).await;
        assert_eq!(reaped, 1);
        let device = registry.get(MAC).await.unwrap();
        assert!(!device.online);
        // Offer close keeps the boundary as the end.
        assert_eq!(device.sessions[0].ends_at, Some(t0 + Duration::hours(1)));
    }

    #[tokio::test]
    async fn reap_without_offer_enforcement_keeps_fresh_devices_online() {
        let bus = EventBus::new(64);
        let policy = RegistryPolicy {
            default_offer: Offer::OneHour,
            offline_timeout: Duration::days(1),
            enforce_offer_expiry: false,
        };
        let registry = DeviceRegistry::new(bus, policy);
        let t0 = Utc::now();

        registry.apply_sighting_at(sighting("192.168.1.5", MAC), t0).await;
        let reaped = registry.reap_at(t0 + Duration::hours(2)).await;
        assert_eq!(reaped, 0);
        assert!(registry.get(MAC).await.unwrap().online);
    }

    #[tokio::test]
    async fn refresh_session_reopens_and_emits_online() {
        let (registry, mut rx) = registry();
        let t0 = Utc::now();

        registry.apply_sighting_at(sighting("192.168.1.5", MAC), t0).await;
        registry.reap_at(t0 + Duration::seconds(60)).await;
        drain(&mut rx);

        let refreshed = registry
            .refresh_session_at(MAC, Some(Offer::ThreeHours), t0 + Duration::minutes(2))
            .await
            .unwrap();

        assert!(refreshed.online);
        assert_eq!(refreshed.offer, Offer::ThreeHours);
        assert_eq!(refreshed.sessions.len(), 2);
        assert!(refreshed.sessions[1].is_active());
        assert_eq!(
            refreshed.sessions[1].ends_at,
            Some(t0 + Duration::minutes(2) + Duration::hours(3))
        );
        assert_eq!(drain(&mut rx), vec![DeviceEventKind::Online]);
    }

    #[tokio::test]
    async fn refresh_unknown_device_is_none() {
        let (registry, _rx) = registry();
        assert!(registry.refresh_session("no-such-id", None).await.is_none());
    }

    #[tokio::test]
    async fn all_is_sorted_by_address() {
        let (registry, _rx) = registry();
        let t0 = Utc::now();
        registry
            .apply_sighting_at(sighting("192.168.1.40", "aa:aa:aa:aa:aa:01"), t0)
            .await;
        registry
            .apply_sighting_at(sighting("192.168.1.4", "aa:aa:aa:aa:aa:02"), t0)
            .await;

        let all = registry.all().await;
        assert_eq!(all.len(), 2);
        assert!(all[0].ip < all[1].ip);
    }
}
