//! lanwatch-scan: Network discovery and device-session engine.
//!
//! Sweeps a local IPv4 segment, reads the OS neighbor table, enriches each
//! sighting (hostname, vendor, NetBIOS, OS guess), and folds the results
//! into a device registry that tracks online/offline state and
//! offer-bounded session lifecycles.

pub mod config;
pub mod enrich;
pub mod error;
pub mod neighbor;
pub mod pool;
pub mod probe;
pub mod range;
pub mod registry;
pub mod scanner;
pub mod scheduler;
