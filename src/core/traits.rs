use time::OffsetDateTime;

/// A source of absolute time for the routing table.
///
/// Route deadlines are absolute instants, the table asks the clock for the current instant
/// whenever it needs to decide whether a deadline has passed. Hosts running inside a
/// discrete-event simulation should provide the simulation's notion of time here rather than the
/// wall clock, see [`SimClock`](crate::SimClock).
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> OffsetDateTime;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}
