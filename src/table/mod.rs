//! Core routing table implementation.

use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt,
    net::Ipv4Addr,
};

use time::{Duration, OffsetDateTime};
use tracing::{debug, trace};

use crate::{
    config::{SelectionConfig, TableConfig},
    core::{
        address::InterfaceAddress, clock::SystemClock, error::RouteError, traits::Clock,
    },
};

mod entry;
#[cfg(feature = "sync")]
mod sync;

pub use entry::{EntryRow, LinkQuality, Route, RouteFlag, RoutingEntry};
#[cfg(feature = "sync")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "sync")))]
pub use sync::SyncRoutingTable;

/// The routing table, mapping destinations to the best known route towards them.
///
/// Entries are kept ordered by destination address so sweeps, dumps and neighbor selection are
/// deterministic. Lookups hand out copies, callers modify the copy and write it back with
/// [`update`](RoutingTable::update).
#[derive(Debug, Clone)]
pub struct RoutingTable<C = SystemClock> {
    // The routes, keyed by destination.
    entries: BTreeMap<Ipv4Addr, RoutingEntry>,
    // The grace period granted to invalidated routes before they are purged.
    bad_link_lifetime: Duration,
    // Neighbor selection parameters.
    selection: SelectionConfig,
    clock: C,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::with_clock(TableConfig::default(), SystemClock)
    }
}

impl RoutingTable {
    /// Creates a new routing table driven by the wall clock.
    pub fn new(bad_link_lifetime: Duration) -> Self {
        Self::with_clock(TableConfig::new(bad_link_lifetime), SystemClock)
    }
}

impl<C: Clock> RoutingTable<C> {
    /// Creates a new routing table driven by the supplied clock.
    pub fn with_clock(config: TableConfig, clock: C) -> Self {
        Self {
            entries: BTreeMap::new(),
            bad_link_lifetime: config.bad_link_lifetime,
            selection: config.selection,
            clock,
        }
    }

    /// Returns the current instant according to the table's clock.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Returns the instant `lifetime` from now, convenient when building entries.
    pub fn deadline_in(&self, lifetime: Duration) -> OffsetDateTime {
        self.now().saturating_add(lifetime)
    }

    pub fn bad_link_lifetime(&self) -> Duration {
        self.bad_link_lifetime
    }

    pub fn set_bad_link_lifetime(&mut self, bad_link_lifetime: Duration) {
        self.bad_link_lifetime = bad_link_lifetime;
    }

    pub fn selection_config(&self) -> &SelectionConfig {
        &self.selection
    }

    pub fn set_selection_config(&mut self, selection: SelectionConfig) {
        self.selection = selection;
    }

    /// Returns the number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no entries, stale ones included.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in destination order, without purging first.
    pub fn iter(&self) -> impl Iterator<Item = &RoutingEntry> {
        self.entries.values()
    }

    /// Removes all the entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns a copy of the route to the destination.
    pub fn lookup_route(&mut self, dst: Ipv4Addr) -> Result<RoutingEntry, RouteError> {
        self.purge();

        match self.entries.get(&dst) {
            Some(entry) => {
                trace!("route to {dst} found");
                Ok(entry.clone())
            }
            None => {
                trace!("route to {dst} not found");
                Err(RouteError::NotFound(dst))
            }
        }
    }

    /// Returns a copy of the route to the destination if it is valid.
    pub fn lookup_valid_route(&mut self, dst: Ipv4Addr) -> Result<RoutingEntry, RouteError> {
        let entry = self.lookup_route(dst)?;
        trace!("route to {dst} flag is {}", entry.flag());

        match entry.flag() {
            RouteFlag::Valid => Ok(entry),
            flag => Err(RouteError::NotValid {
                destination: dst,
                flag,
            }),
        }
    }

    /// Inserts a new route, failing if there already is one to the same destination.
    ///
    /// The request counter is reset unless the route is in search.
    pub fn add_route(&mut self, mut entry: RoutingEntry) -> Result<(), RouteError> {
        self.purge();

        entry.settle_request_count();

        match self.entries.entry(entry.destination()) {
            Entry::Occupied(_) => {
                trace!("route to {} already exists", entry.destination());
                Err(RouteError::AlreadyExists(entry.destination()))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Ok(())
            }
        }
    }

    /// Replaces the existing route to the entry's destination, failing if there is none.
    ///
    /// The request counter is reset unless the route is in search.
    pub fn update(&mut self, mut entry: RoutingEntry) -> Result<(), RouteError> {
        self.purge();

        let dst = entry.destination();
        match self.entries.get_mut(&dst) {
            Some(existing) => {
                entry.settle_request_count();
                *existing = entry;
                Ok(())
            }
            None => {
                trace!("route update to {dst} fails; not found");
                Err(RouteError::NotFound(dst))
            }
        }
    }

    /// Sets the flag of the route to the destination and resets its request counter.
    pub fn set_entry_state(&mut self, dst: Ipv4Addr, flag: RouteFlag) -> Result<(), RouteError> {
        self.purge();

        let entry = self.entries.get_mut(&dst).ok_or(RouteError::NotFound(dst))?;
        entry.reset_state(flag);
        trace!("route to {dst}: new state is {flag}");

        Ok(())
    }

    /// Removes the route to the destination, returning it.
    pub fn delete_route(&mut self, dst: Ipv4Addr) -> Result<RoutingEntry, RouteError> {
        self.purge();

        let removed = self.entries.remove(&dst);
        trace!(
            "route deletion to {dst} {}",
            if removed.is_some() {
                "successful"
            } else {
                "not successful"
            }
        );

        removed.ok_or(RouteError::NotFound(dst))
    }

    /// Returns the destinations (with their sequence numbers) reached through the next hop.
    ///
    /// These are the destinations that become unreachable when the link to the next hop breaks.
    pub fn destinations_with_next_hop(&mut self, next_hop: Ipv4Addr) -> BTreeMap<Ipv4Addr, u32> {
        self.purge();

        self.entries
            .iter()
            .filter(|(_, entry)| entry.next_hop() == next_hop)
            .map(|(&dst, entry)| (dst, entry.seq_no()))
            .collect()
    }

    /// Invalidates the valid routes to the listed destinations.
    pub fn invalidate_routes_with_dst(&mut self, unreachable: &BTreeMap<Ipv4Addr, u32>) {
        self.purge();

        let now = self.now();
        for dst in unreachable.keys() {
            if let Some(entry) = self.entries.get_mut(dst) {
                if entry.flag() == RouteFlag::Valid {
                    debug!("invalidating route to {dst}");
                    entry.invalidate(now, self.bad_link_lifetime);
                }
            }
        }
    }

    /// Removes every route bound to the interface, returning how many were removed.
    pub fn delete_all_routes_from_interface(&mut self, iface: &InterfaceAddress) -> usize {
        self.purge();

        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.interface() != *iface);
        let removed = before - self.entries.len();

        if removed != 0 {
            debug!("removed {removed} routes bound to interface {iface}");
        }

        removed
    }

    /// Marks the link to the neighbor as unidirectional until the deadline and resets its request
    /// counter.
    pub fn mark_link_as_unidirectional(
        &mut self,
        neighbor: Ipv4Addr,
        blacklist_until: OffsetDateTime,
    ) -> Result<(), RouteError> {
        self.purge();

        let entry = self
            .entries
            .get_mut(&neighbor)
            .ok_or(RouteError::NotFound(neighbor))?;
        entry.mark_unidirectional(blacklist_until);
        trace!("set link to {neighbor} to unidirectional");

        Ok(())
    }

    /// Expires stale routes: expired invalid routes are removed, expired valid routes are
    /// invalidated, routes in search are left alone.
    pub fn purge(&mut self) {
        let now = self.now();
        sweep(&mut self.entries, now, self.bad_link_lifetime);
    }

    /// Runs the purge sweep over a copy of the routes, leaving the table as is.
    pub fn purge_copy(&self, entries: &mut BTreeMap<Ipv4Addr, RoutingEntry>) {
        sweep(entries, self.now(), self.bad_link_lifetime);
    }

    /// Returns a purged copy of the routes.
    pub fn snapshot(&self) -> BTreeMap<Ipv4Addr, RoutingEntry> {
        let mut entries = self.entries.clone();
        self.purge_copy(&mut entries);

        entries
    }
}

// Note: the sweep never deletes a valid route, it takes two expiries (valid then invalid) for a
// route to disappear.
fn sweep(
    entries: &mut BTreeMap<Ipv4Addr, RoutingEntry>,
    now: OffsetDateTime,
    bad_link_lifetime: Duration,
) {
    entries.retain(|dst, entry| {
        if !entry.is_expired(now) {
            return true;
        }

        match entry.flag() {
            RouteFlag::Invalid => {
                trace!("purging route to {dst}");
                false
            }
            RouteFlag::Valid => {
                debug!("invalidating expired route to {dst}");
                entry.invalidate(now, bad_link_lifetime);
                true
            }
            RouteFlag::InSearch => true,
        }
    });
}

impl<C: Clock> fmt::Display for RoutingTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let now = self.now();

        writeln!(f, "\nAODV Routing table")?;
        writeln!(
            f,
            "{:<16}{:<16}{:<16}{:<16}{:<16}Hops",
            "Destination", "Gateway", "Interface", "Flag", "Expire"
        )?;
        for entry in self.snapshot().values() {
            write!(f, "{}", entry.display(now))?;
        }

        writeln!(f)
    }
}
