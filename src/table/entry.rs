use std::{collections::HashSet, fmt, net::Ipv4Addr};

use time::{Duration, OffsetDateTime};
use tracing::trace;

use crate::core::address::{DeviceId, InterfaceAddress, Position};

/// The lifecycle state of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteFlag {
    /// The route is usable.
    Valid,
    /// The route expired or broke, it is kept around until its grace period runs out.
    Invalid,
    /// Route discovery is in progress.
    InSearch,
}

impl RouteFlag {
    /// Returns the label used when printing the routing table.
    pub fn label(&self) -> &'static str {
        match self {
            RouteFlag::Valid => "UP",
            RouteFlag::Invalid => "DOWN",
            RouteFlag::InSearch => "IN_SEARCH",
        }
    }
}

impl fmt::Display for RouteFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RouteFlag::Valid => "VALID",
            RouteFlag::Invalid => "INVALID",
            RouteFlag::InSearch => "IN_SEARCH",
        };

        f.write_str(s)
    }
}

/// The forwarding information of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub destination: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub source: Ipv4Addr,
    pub output_device: DeviceId,
}

/// Link quality telemetry reported for a route's destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LinkQuality {
    /// Cumulative transmission errors.
    pub tx_errors: u32,
    /// The destination's last known position.
    pub position: Position,
    /// Free buffer capacity at the destination.
    pub free_space: u32,
}

/// A routing table entry, the best known route to a single destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingEntry {
    route: Route,
    iface: InterfaceAddress,
    valid_seq_no: bool,
    seq_no: u32,
    hops: u16,
    flag: RouteFlag,
    // Absolute instant at which the entry expires, what happens then depends on the flag.
    expires_at: OffsetDateTime,
    // Route request retries, only meaningful while the entry is in search.
    req_count: u8,
    unidirectional: bool,
    blacklist_until: OffsetDateTime,
    // Nodes that forward through us towards the destination.
    precursors: HashSet<Ipv4Addr>,
    quality: LinkQuality,
}

impl RoutingEntry {
    /// Creates a new valid entry with an unknown sequence number, no precursors and default link
    /// quality.
    pub fn new(
        destination: Ipv4Addr,
        next_hop: Ipv4Addr,
        device: DeviceId,
        iface: InterfaceAddress,
        hops: u16,
        expires_at: OffsetDateTime,
    ) -> Self {
        Self {
            route: Route {
                destination,
                gateway: next_hop,
                source: iface.local(),
                output_device: device,
            },
            iface,
            valid_seq_no: false,
            seq_no: 0,
            hops,
            flag: RouteFlag::Valid,
            expires_at,
            req_count: 0,
            unidirectional: false,
            // Irrelevant until the link is marked unidirectional.
            blacklist_until: OffsetDateTime::UNIX_EPOCH,
            precursors: HashSet::new(),
            quality: LinkQuality::default(),
        }
    }

    /// Sets a known, valid sequence number.
    pub fn with_seq_no(mut self, seq_no: u32) -> Self {
        self.valid_seq_no = true;
        self.seq_no = seq_no;
        self
    }

    /// Sets the link quality telemetry.
    pub fn with_link_quality(mut self, quality: LinkQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Sets the initial flag.
    pub fn with_flag(mut self, flag: RouteFlag) -> Self {
        self.set_flag(flag);
        self
    }

    // PRECURSORS

    /// Inserts a precursor, returns `false` if it was already present.
    pub fn insert_precursor(&mut self, id: Ipv4Addr) -> bool {
        let inserted = self.precursors.insert(id);
        if !inserted {
            trace!("precursor {id} already present");
        }

        inserted
    }

    /// Returns `true` if the address is a precursor.
    pub fn lookup_precursor(&self, id: Ipv4Addr) -> bool {
        let found = self.precursors.contains(&id);
        trace!("precursor {id} {}", if found { "found" } else { "not found" });

        found
    }

    /// Removes a precursor, returns `false` if it wasn't present.
    pub fn delete_precursor(&mut self, id: Ipv4Addr) -> bool {
        let removed = self.precursors.remove(&id);
        if !removed {
            trace!("precursor {id} not found");
        }

        removed
    }

    /// Removes all the precursors.
    pub fn delete_all_precursors(&mut self) {
        self.precursors.clear();
    }

    /// Returns `true` if there are no precursors.
    pub fn precursors_empty(&self) -> bool {
        self.precursors.is_empty()
    }

    /// Returns an iterator over the precursors, in no particular order.
    pub fn precursors(&self) -> impl Iterator<Item = &Ipv4Addr> {
        self.precursors.iter()
    }

    /// Appends the precursors that aren't already in the list to it.
    ///
    /// Useful to gather the recipients of an error message over several routes.
    pub fn collect_precursors(&self, prec: &mut Vec<Ipv4Addr>) {
        for id in &self.precursors {
            if !prec.contains(id) {
                prec.push(*id);
            }
        }
    }

    // STATE TRANSITIONS

    /// Invalidates the route, it will then be kept for the bad link lifetime before it can be
    /// purged. Does nothing if the route is already invalid.
    ///
    /// The deadline saturates at the largest representable instant.
    pub fn invalidate(&mut self, now: OffsetDateTime, bad_link_lifetime: Duration) {
        if self.flag == RouteFlag::Invalid {
            return;
        }

        self.flag = RouteFlag::Invalid;
        self.req_count = 0;
        self.expires_at = now.saturating_add(bad_link_lifetime);
    }

    /// Sets the flag. Leaving the search state resets the request counter.
    pub fn set_flag(&mut self, flag: RouteFlag) {
        if self.flag == RouteFlag::InSearch && flag != RouteFlag::InSearch {
            self.req_count = 0;
        }

        self.flag = flag;
    }

    /// Sets the flag and unconditionally resets the request counter.
    pub(crate) fn reset_state(&mut self, flag: RouteFlag) {
        self.flag = flag;
        self.req_count = 0;
    }

    /// Resets the request counter unless a discovery is in progress.
    pub(crate) fn settle_request_count(&mut self) {
        if self.flag != RouteFlag::InSearch {
            self.req_count = 0;
        }
    }

    /// Records another route request retry.
    pub fn increment_request_count(&mut self) {
        self.req_count = self.req_count.saturating_add(1);
    }

    /// Sets the request counter.
    pub fn set_request_count(&mut self, req_count: u8) {
        self.req_count = req_count;
    }

    /// Marks the link to this neighbor as unidirectional until the deadline and resets the
    /// request counter.
    pub(crate) fn mark_unidirectional(&mut self, until: OffsetDateTime) {
        self.unidirectional = true;
        self.blacklist_until = until;
        self.req_count = 0;
    }

    /// Sets the unidirectional link flag.
    pub fn set_unidirectional(&mut self, unidirectional: bool) {
        self.unidirectional = unidirectional;
    }

    /// Sets the blacklist deadline.
    pub fn set_blacklist_until(&mut self, until: OffsetDateTime) {
        self.blacklist_until = until;
    }

    // ACCESSORS

    pub fn destination(&self) -> Ipv4Addr {
        self.route.destination
    }

    pub fn next_hop(&self) -> Ipv4Addr {
        self.route.gateway
    }

    pub fn set_next_hop(&mut self, next_hop: Ipv4Addr) {
        self.route.gateway = next_hop;
    }

    pub fn output_device(&self) -> DeviceId {
        self.route.output_device
    }

    pub fn set_output_device(&mut self, device: DeviceId) {
        self.route.output_device = device;
    }

    pub fn interface(&self) -> InterfaceAddress {
        self.iface
    }

    /// Sets the local interface, the route's source follows the interface's local address.
    pub fn set_interface(&mut self, iface: InterfaceAddress) {
        self.iface = iface;
        self.route.source = iface.local();
    }

    pub fn route(&self) -> Route {
        self.route
    }

    /// Replaces the forwarding information. The destination keys the entry in the table and is
    /// kept as is.
    pub fn set_route(&mut self, route: Route) {
        debug_assert_eq!(route.destination, self.route.destination);
        self.route = Route {
            destination: self.route.destination,
            ..route
        };
    }

    pub fn valid_seq_no(&self) -> bool {
        self.valid_seq_no
    }

    pub fn set_valid_seq_no(&mut self, valid: bool) {
        self.valid_seq_no = valid;
    }

    pub fn seq_no(&self) -> u32 {
        self.seq_no
    }

    pub fn set_seq_no(&mut self, seq_no: u32) {
        self.seq_no = seq_no;
    }

    pub fn hops(&self) -> u16 {
        self.hops
    }

    pub fn set_hops(&mut self, hops: u16) {
        self.hops = hops;
    }

    pub fn flag(&self) -> RouteFlag {
        self.flag
    }

    pub fn request_count(&self) -> u8 {
        self.req_count
    }

    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    pub fn set_expires_at(&mut self, expires_at: OffsetDateTime) {
        self.expires_at = expires_at;
    }

    /// Returns the time left before the entry expires, negative once it has.
    pub fn lifetime(&self, now: OffsetDateTime) -> Duration {
        self.expires_at - now
    }

    /// Sets the deadline to `lifetime` from `now`.
    pub fn set_lifetime(&mut self, now: OffsetDateTime, lifetime: Duration) {
        self.expires_at = now.saturating_add(lifetime);
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.lifetime(now).is_negative()
    }

    pub fn is_unidirectional(&self) -> bool {
        self.unidirectional
    }

    pub fn blacklist_until(&self) -> OffsetDateTime {
        self.blacklist_until
    }

    /// Returns `true` if the link is unidirectional and the blacklist deadline hasn't passed.
    pub fn is_blacklisted(&self, now: OffsetDateTime) -> bool {
        self.unidirectional && now < self.blacklist_until
    }

    pub fn link_quality(&self) -> LinkQuality {
        self.quality
    }

    pub fn set_link_quality(&mut self, quality: LinkQuality) {
        self.quality = quality;
    }

    pub fn tx_errors(&self) -> u32 {
        self.quality.tx_errors
    }

    pub fn position(&self) -> Position {
        self.quality.position
    }

    pub fn free_space(&self) -> u32 {
        self.quality.free_space
    }

    /// Returns a printable row for the entry, its remaining lifetime computed against `now`.
    pub fn display(&self, now: OffsetDateTime) -> EntryRow<'_> {
        EntryRow { entry: self, now }
    }
}

/// A routing table row: destination, gateway, interface, flag, expiry (in seconds) and hops.
pub struct EntryRow<'a> {
    entry: &'a RoutingEntry,
    now: OffsetDateTime,
}

impl fmt::Display for EntryRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expire = format!("{:.2}s", self.entry.lifetime(self.now).as_seconds_f64());

        writeln!(
            f,
            "{:<16}{:<16}{:<16}{:<16}{:<16}{}",
            self.entry.destination().to_string(),
            self.entry.next_hop().to_string(),
            self.entry.interface().to_string(),
            self.entry.flag().label(),
            expire,
            self.entry.hops()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    fn iface() -> InterfaceAddress {
        InterfaceAddress::new(addr(1), Ipv4Addr::new(255, 255, 255, 0))
    }

    fn entry(now: OffsetDateTime) -> RoutingEntry {
        RoutingEntry::new(addr(2), addr(2), DeviceId(0), iface(), 1, now + Duration::seconds(3))
    }

    #[test]
    fn new_defaults() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let entry = entry(now);

        assert_eq!(entry.destination(), addr(2));
        assert_eq!(entry.next_hop(), addr(2));
        assert_eq!(entry.route().source, addr(1));
        assert_eq!(entry.flag(), RouteFlag::Valid);
        assert_eq!(entry.request_count(), 0);
        assert!(!entry.valid_seq_no());
        assert!(!entry.is_unidirectional());
        assert!(!entry.is_blacklisted(now));
        assert!(entry.precursors_empty());
        assert_eq!(entry.lifetime(now), Duration::seconds(3));
        assert_eq!(entry.link_quality(), LinkQuality::default());
    }

    #[test]
    fn with_seq_no() {
        let entry = entry(OffsetDateTime::UNIX_EPOCH).with_seq_no(42);

        assert!(entry.valid_seq_no());
        assert_eq!(entry.seq_no(), 42);
    }

    #[test]
    fn insert_precursor_duplicate() {
        let mut entry = entry(OffsetDateTime::UNIX_EPOCH);

        assert!(entry.insert_precursor(addr(3)));
        assert!(!entry.insert_precursor(addr(3)));
        assert!(entry.insert_precursor(addr(4)));

        assert_eq!(entry.precursors().count(), 2);
    }

    #[test]
    fn lookup_and_delete_precursor() {
        let mut entry = entry(OffsetDateTime::UNIX_EPOCH);
        entry.insert_precursor(addr(3));

        assert!(entry.lookup_precursor(addr(3)));
        assert!(!entry.lookup_precursor(addr(4)));

        assert!(entry.delete_precursor(addr(3)));
        assert!(!entry.delete_precursor(addr(3)));
        assert!(entry.precursors_empty());
    }

    #[test]
    fn delete_all_precursors() {
        let mut entry = entry(OffsetDateTime::UNIX_EPOCH);
        for i in 3..10 {
            entry.insert_precursor(addr(i));
        }

        entry.delete_all_precursors();
        assert!(entry.precursors_empty());
    }

    #[test]
    fn collect_precursors_skips_duplicates() {
        let mut entry = entry(OffsetDateTime::UNIX_EPOCH);
        entry.insert_precursor(addr(3));
        entry.insert_precursor(addr(4));

        let mut prec = vec![addr(4), addr(5)];
        entry.collect_precursors(&mut prec);

        prec.sort();
        assert_eq!(prec, vec![addr(3), addr(4), addr(5)]);
    }

    #[test]
    fn invalidate() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let mut entry = entry(now).with_flag(RouteFlag::InSearch);
        entry.increment_request_count();

        entry.invalidate(now, Duration::seconds(10));
        assert_eq!(entry.flag(), RouteFlag::Invalid);
        assert_eq!(entry.request_count(), 0);
        assert_eq!(entry.expires_at(), now + Duration::seconds(10));
    }

    #[test]
    fn invalidate_is_idempotent() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let mut entry = entry(now);

        entry.invalidate(now, Duration::seconds(10));
        // A later invalidation doesn't push the deadline back.
        entry.invalidate(now + Duration::seconds(5), Duration::seconds(10));
        assert_eq!(entry.expires_at(), now + Duration::seconds(10));
    }

    #[test]
    fn deadlines_saturate() {
        let now = OffsetDateTime::UNIX_EPOCH;

        let mut entry = entry(now);
        entry.invalidate(now, Duration::MAX);
        assert!(entry.expires_at() > now);
        assert!(!entry.is_expired(now + Duration::days(365)));

        let mut entry = self::entry(now);
        entry.set_lifetime(now, Duration::MAX);
        assert_eq!(entry.expires_at(), now.saturating_add(Duration::MAX));
    }

    #[test]
    fn leaving_search_resets_request_count() {
        let mut entry = entry(OffsetDateTime::UNIX_EPOCH).with_flag(RouteFlag::InSearch);
        entry.increment_request_count();
        entry.increment_request_count();

        // Staying in search keeps the retries.
        entry.set_flag(RouteFlag::InSearch);
        assert_eq!(entry.request_count(), 2);

        entry.set_flag(RouteFlag::Valid);
        assert_eq!(entry.request_count(), 0);
    }

    #[test]
    fn request_count_saturates() {
        let mut entry = entry(OffsetDateTime::UNIX_EPOCH);
        entry.set_request_count(u8::MAX);
        entry.increment_request_count();

        assert_eq!(entry.request_count(), u8::MAX);
    }

    #[test]
    fn lifetime_is_signed() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let entry = entry(now);

        assert!(!entry.is_expired(now + Duration::seconds(3)));
        assert!(entry.is_expired(now + Duration::seconds(4)));
        assert_eq!(
            entry.lifetime(now + Duration::seconds(4)),
            Duration::seconds(-1)
        );
    }

    #[test]
    fn mark_unidirectional() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let mut entry = entry(now).with_flag(RouteFlag::InSearch);
        entry.increment_request_count();

        entry.mark_unidirectional(now + Duration::seconds(5));
        assert!(entry.is_unidirectional());
        assert_eq!(entry.request_count(), 0);
        assert!(entry.is_blacklisted(now + Duration::seconds(4)));
        assert!(!entry.is_blacklisted(now + Duration::seconds(5)));
    }

    #[test]
    fn set_interface_updates_source() {
        let mut entry = entry(OffsetDateTime::UNIX_EPOCH);
        let other = InterfaceAddress::new(addr(9), Ipv4Addr::new(255, 255, 255, 0));

        entry.set_interface(other);
        assert_eq!(entry.interface(), other);
        assert_eq!(entry.route().source, addr(9));
    }

    #[test]
    fn display_row() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let row = entry(now).display(now).to_string();

        assert_eq!(
            row,
            format!(
                "{:<16}{:<16}{:<16}{:<16}{:<16}1\n",
                "10.0.0.2", "10.0.0.2", "10.0.0.1", "UP", "3.00s"
            )
        );
    }
}
