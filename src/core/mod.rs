//! Foundational and often-reused types.

pub mod address;
pub(crate) mod clock;
pub(crate) mod error;
pub(crate) mod traits;
