//! Routing table error types.

use std::net::Ipv4Addr;

use crate::table::RouteFlag;

/// The ways a routing table operation can fail.
///
/// None of these are fatal, they signal the expected outcomes the protocol layer branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("no route to {0}")]
    NotFound(Ipv4Addr),

    #[error("route to {0} already exists")]
    AlreadyExists(Ipv4Addr),

    #[error("route to {destination} is {flag}")]
    NotValid {
        destination: Ipv4Addr,
        flag: RouteFlag,
    },

    #[error("no candidates to cluster")]
    Empty,
}
