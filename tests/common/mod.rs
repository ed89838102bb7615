use std::net::Ipv4Addr;

use aodv_dbscan::{
    config::TableConfig, DeviceId, InterfaceAddress, LinkQuality, Position, RoutingEntry,
    RoutingTable, SimClock,
};
use time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[allow(dead_code)]
pub fn enable_tracing() {
    let _ = fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

pub const MASK_24: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 0);

/// Produces an address on the local /24 from the last octet.
pub fn addr(last: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 1, 1, last)
}

/// The interface all the test routes are bound to.
pub fn iface() -> InterfaceAddress {
    InterfaceAddress::new(addr(1), MASK_24)
}

/// Creates a table driven by a simulated clock, returning a handle to advance the clock with.
pub fn new_table(bad_link_lifetime: Duration) -> (RoutingTable<SimClock>, SimClock) {
    let clock = SimClock::new();
    let table = RoutingTable::with_clock(TableConfig::new(bad_link_lifetime), clock.clone());

    (table, clock)
}

/// Produces a route to the neighbor expiring after the lifetime.
pub fn route(table: &RoutingTable<SimClock>, last: u8, lifetime: Duration) -> RoutingEntry {
    RoutingEntry::new(
        addr(last),
        addr(last),
        DeviceId(0),
        iface(),
        1,
        table.deadline_in(lifetime),
    )
}

/// Produces a valid route to a neighbor reporting the supplied link quality.
#[allow(dead_code)]
pub fn neighbor(
    table: &RoutingTable<SimClock>,
    last: u8,
    hops: u16,
    (x, y): (u32, u32),
    tx_errors: u32,
    free_space: u32,
) -> RoutingEntry {
    let mut entry = route(table, last, Duration::seconds(30)).with_link_quality(LinkQuality {
        tx_errors,
        position: Position::new(x, y),
        free_space,
    });
    entry.set_hops(hops);

    entry
}
