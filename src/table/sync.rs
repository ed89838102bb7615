use std::{collections::BTreeMap, net::Ipv4Addr, sync::Arc};

use parking_lot::RwLock;
use time::OffsetDateTime;

use crate::{
    core::{
        address::{InterfaceAddress, Position},
        clock::SystemClock,
        error::RouteError,
        traits::Clock,
    },
    table::{RouteFlag, RoutingEntry, RoutingTable},
};

#[cfg_attr(doc_cfg, doc(cfg(feature = "sync")))]
#[derive(Debug, Clone)]
/// A routing table handle suitable for sharing between tasks.
///
/// It wraps [`RoutingTable`] behind a lock, clones share the same table. Most reads purge the
/// table first and therefore take the write lock.
pub struct SyncRoutingTable<C = SystemClock> {
    routing_table: Arc<RwLock<RoutingTable<C>>>,
}

impl Default for SyncRoutingTable {
    fn default() -> Self {
        Self::new(RoutingTable::default())
    }
}

impl<C: Clock> SyncRoutingTable<C> {
    pub fn new(routing_table: RoutingTable<C>) -> Self {
        Self {
            routing_table: Arc::new(RwLock::new(routing_table)),
        }
    }

    pub fn now(&self) -> OffsetDateTime {
        self.routing_table.read().now()
    }

    pub fn len(&self) -> usize {
        self.routing_table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routing_table.read().is_empty()
    }

    pub fn lookup_route(&self, dst: Ipv4Addr) -> Result<RoutingEntry, RouteError> {
        self.routing_table.write().lookup_route(dst)
    }

    pub fn lookup_valid_route(&self, dst: Ipv4Addr) -> Result<RoutingEntry, RouteError> {
        self.routing_table.write().lookup_valid_route(dst)
    }

    pub fn add_route(&self, entry: RoutingEntry) -> Result<(), RouteError> {
        self.routing_table.write().add_route(entry)
    }

    pub fn update(&self, entry: RoutingEntry) -> Result<(), RouteError> {
        self.routing_table.write().update(entry)
    }

    /// Looks up the route, applies `f` to the copy and writes it back, all under the same lock so
    /// no other writer can slip in between.
    pub fn modify<F>(&self, dst: Ipv4Addr, f: F) -> Result<(), RouteError>
    where
        F: FnOnce(&mut RoutingEntry),
    {
        let mut rt_g = self.routing_table.write();
        let mut entry = rt_g.lookup_route(dst)?;
        f(&mut entry);

        rt_g.update(entry)
    }

    pub fn set_entry_state(&self, dst: Ipv4Addr, flag: RouteFlag) -> Result<(), RouteError> {
        self.routing_table.write().set_entry_state(dst, flag)
    }

    pub fn delete_route(&self, dst: Ipv4Addr) -> Result<RoutingEntry, RouteError> {
        self.routing_table.write().delete_route(dst)
    }

    pub fn destinations_with_next_hop(&self, next_hop: Ipv4Addr) -> BTreeMap<Ipv4Addr, u32> {
        self.routing_table
            .write()
            .destinations_with_next_hop(next_hop)
    }

    pub fn invalidate_routes_with_dst(&self, unreachable: &BTreeMap<Ipv4Addr, u32>) {
        self.routing_table
            .write()
            .invalidate_routes_with_dst(unreachable)
    }

    pub fn delete_all_routes_from_interface(&self, iface: &InterfaceAddress) -> usize {
        self.routing_table
            .write()
            .delete_all_routes_from_interface(iface)
    }

    pub fn mark_link_as_unidirectional(
        &self,
        neighbor: Ipv4Addr,
        blacklist_until: OffsetDateTime,
    ) -> Result<(), RouteError> {
        self.routing_table
            .write()
            .mark_link_as_unidirectional(neighbor, blacklist_until)
    }

    pub fn purge(&self) {
        self.routing_table.write().purge()
    }

    pub fn select_neighbor_cluster(
        &self,
        target: Position,
        epsilon: f64,
        min_pts: usize,
    ) -> Vec<Ipv4Addr> {
        self.routing_table
            .write()
            .select_neighbor_cluster(target, epsilon, min_pts)
    }

    /// Renders the routing table dump (see [`RoutingTable`]'s `Display` implementation).
    pub fn dump(&self) -> String {
        self.routing_table.read().to_string()
    }
}
