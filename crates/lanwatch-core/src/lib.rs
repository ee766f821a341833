//! lanwatch-core: Shared domain types for the lanwatch LAN monitor.
//!
//! This crate provides the types used across lanwatch components:
//! - Device, Session, and Sighting types for the device registry
//! - Offer codes and their duration / wall-clock boundary logic
//! - The typed event bus used to fan device events out to consumers

pub mod events;
pub mod offer;
pub mod types;

pub use events::{DeviceEvent, DeviceEventKind, EventBus};
pub use offer::Offer;
pub use types::{Device, Session, SessionStatus, Sighting};
