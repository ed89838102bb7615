//! Routing table and neighbor selection parameters.

use std::net::Ipv4Addr;

use time::Duration;

/// How long an invalidated route is kept around before being purged (AODV's `DELETE_PERIOD`).
pub const DEFAULT_BAD_LINK_LIFETIME: Duration = Duration::seconds(15);

/// Routes further away than this many hops are never selected as neighbor candidates.
pub const DEFAULT_MAX_CANDIDATE_HOPS: u16 = 2;

/// The mask used to recognise subnet-directed broadcast destinations.
pub const DEFAULT_BROADCAST_MASK: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 0);

/// The feature vector a perfect neighbor would have after normalization: right on the target,
/// no transmission errors and the most free capacity.
pub const DEFAULT_IDEAL: [f64; 3] = [0.0, 0.0, 1.0];

/// Per-dimension weights used when scoring clusters against the ideal vector.
pub const DEFAULT_WEIGHTS: [f64; 3] = [1.0, 1.0, 1.0];

/// Routing table parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// The grace period granted to a route when it is invalidated.
    pub bad_link_lifetime: Duration,
    /// Neighbor selection parameters.
    pub selection: SelectionConfig,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            bad_link_lifetime: DEFAULT_BAD_LINK_LIFETIME,
            selection: SelectionConfig::default(),
        }
    }
}

impl TableConfig {
    /// Creates a new configuration with the supplied bad link lifetime.
    pub fn new(bad_link_lifetime: Duration) -> Self {
        Self {
            bad_link_lifetime,
            ..Default::default()
        }
    }
}

/// Neighbor selection parameters.
///
/// The clustering radius and density threshold are supplied per call, these are the parameters
/// that stay fixed for the lifetime of a routing session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionConfig {
    /// Entries with a larger hop count are not candidates.
    pub max_hops: u16,
    /// Destinations that are subnet-directed broadcasts under this mask are not candidates.
    pub broadcast_mask: Ipv4Addr,
    /// The normalized (distance, tx errors, free capacity) vector clusters are scored against.
    pub ideal: [f64; 3],
    /// The weight of each dimension in the score.
    pub weights: [f64; 3],
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_CANDIDATE_HOPS,
            broadcast_mask: DEFAULT_BROADCAST_MASK,
            ideal: DEFAULT_IDEAL,
            weights: DEFAULT_WEIGHTS,
        }
    }
}
