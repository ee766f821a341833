//! Core domain types for the lanwatch device registry.
//!
//! A `Sighting` is one observation of a device during a scan cycle; the
//! registry folds sightings into durable `Device` entities, each carrying
//! an ordered list of `Session`s that bound its billable connectivity.

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::offer::Offer;

// ── Sighting ──────────────────────────────────────────────────────

/// One observation of a device during a scan cycle, before merge into
/// the registry. Transient: produced once per device per cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sighting {
    pub ip: Ipv4Addr,
    /// Link-layer address, lower-cased, when the neighbor table knew it.
    pub mac: Option<String>,
    /// Probe round-trip in milliseconds; `None` when unreachable.
    pub rtt_ms: Option<f64>,
    pub hostname: Option<String>,
    pub vendor: Option<String>,
    pub netbios: Option<String>,
    pub os_guess: Option<String>,
}

impl Sighting {
    /// The stable join key across address changes: the link-layer address
    /// when known, else the network address.
    pub fn identity_key(&self) -> String {
        match &self.mac {
            Some(mac) => mac.to_ascii_lowercase(),
            None => self.ip.to_string(),
        }
    }
}

// ── Session ───────────────────────────────────────────────────────

/// Lifecycle state of a session. A session transitions Active → Expired
/// exactly once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Expired,
}

/// One contiguous interval during which a device consumes an offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub started_at: DateTime<Utc>,
    /// The session boundary. Set at open when the governing offer is
    /// known; stamped on close otherwise.
    pub ends_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
}

impl Session {
    /// Open a new active session governed by `offer`.
    pub fn open(offer: Offer, now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            ends_at: Some(offer.ends_at_utc(now)),
            status: SessionStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

// ── Device ────────────────────────────────────────────────────────

/// A durable device entity, keyed by identity key. Exactly one device
/// exists per identity key; devices are never deleted by the scan path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Identity key: lower-cased MAC when known, else the IP.
    pub id: String,
    pub ip: Ipv4Addr,
    pub mac: Option<String>,
    pub hostname: Option<String>,
    pub vendor: Option<String>,
    pub last_rtt_ms: Option<f64>,
    pub netbios: Option<String>,
    pub os_guess: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub online: bool,
    pub offer: Offer,
    pub sessions: Vec<Session>,
}

impl Device {
    /// Create a device from its first sighting: online, with one active
    /// session governed by `offer`.
    pub fn from_sighting(sighting: &Sighting, offer: Offer, now: DateTime<Utc>) -> Self {
        Self {
            id: sighting.identity_key(),
            ip: sighting.ip,
            mac: sighting.mac.as_ref().map(|m| m.to_ascii_lowercase()),
            hostname: sighting.hostname.clone(),
            vendor: sighting.vendor.clone(),
            last_rtt_ms: sighting.rtt_ms,
            netbios: sighting.netbios.clone(),
            os_guess: sighting.os_guess.clone(),
            first_seen: now,
            last_seen: now,
            online: true,
            offer,
            sessions: vec![Session::open(offer, now)],
        }
    }

    /// Merge a later sighting into this device. A present field wins; an
    /// absent field never erases a stored value. The IP always refreshes
    /// since DHCP can re-lease it.
    pub fn merge_sighting(&mut self, sighting: &Sighting) {
        self.ip = sighting.ip;
        if let Some(mac) = &sighting.mac {
            self.mac = Some(mac.to_ascii_lowercase());
        }
        if sighting.hostname.is_some() {
            self.hostname = sighting.hostname.clone();
        }
        if sighting.vendor.is_some() {
            self.vendor = sighting.vendor.clone();
        }
        if sighting.rtt_ms.is_some() {
            self.last_rtt_ms = sighting.rtt_ms;
        }
        if sighting.netbios.is_some() {
            self.netbios = sighting.netbios.clone();
        }
        if sighting.os_guess.is_some() {
            self.os_guess = sighting.os_guess.clone();
        }
    }

    /// Index of the currently active session, if any.
    pub fn active_session(&self) -> Option<usize> {
        self.sessions.iter().rposition(Session::is_active)
    }

    /// Total connected time across all sessions, the open one counted up
    /// to `now`.
    pub fn total_connected_ms(&self, now: DateTime<Utc>) -> i64 {
        self.sessions
            .iter()
            .map(|s| {
                let end = match s.status {
                    SessionStatus::Active => now,
                    SessionStatus::Expired => s.ends_at.unwrap_or(s.started_at),
                };
                (end - s.started_at).num_milliseconds().max(0)
            })
            .sum()
    }
}
