//! An AODV routing table with density-based next-hop neighbor selection.
//!
//! The [`RoutingTable`] keeps the best known route to each destination and manages its
//! lifecycle: routes are valid, invalid (kept for a grace period) or in search (a route discovery
//! is in progress). Stale routes are swept lazily, most operations purge the table before
//! running so callers always observe an up-to-date view.
//!
//! On top of the table, [`RoutingTable::select_neighbor_cluster`] picks a preferred subset of
//! nearby neighbors. Each candidate is described by its distance to a target position, its
//! transmission error count and its free capacity; the candidates are clustered with DBSCAN and
//! the cluster closest to the ideal (close, error-free, plenty of capacity) wins.
//!
//! The table doesn't read the wall clock directly, time comes from a [`Clock`]. Use
//! [`SystemClock`] in production and [`SimClock`] when driving the table from a discrete-event
//! simulation.
//!
//! ## Features
//!
//! - `sync`: [`SyncRoutingTable`], a cloneable handle to a table shared behind a lock.

#![cfg_attr(doc_cfg, feature(doc_cfg))]

pub mod cluster;
pub mod config;
pub mod table;

mod core;

pub use crate::core::{
    address::{self, DeviceId, InterfaceAddress, Position},
    clock::{SimClock, SystemClock},
    error::RouteError,
    traits::Clock,
};
#[cfg(feature = "sync")]
pub use table::SyncRoutingTable;
pub use table::{LinkQuality, Route, RouteFlag, RoutingEntry, RoutingTable};
