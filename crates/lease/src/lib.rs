//! Import lease state machine.
//!
//! A lease is created by the remote endpoint when an import starts and
//! moves from `initializing` to `ready` or `error` on its own. This crate
//! polls that transition, forwards progress, and guarantees the lease is
//! released (completed or aborted) exactly once.

mod error;
mod guard;
mod lease;
mod poll;

pub use error::LeaseError;
pub use guard::LeaseGuard;
pub use lease::Lease;
pub use poll::PollConfig;

#[cfg(test)]
pub(crate) mod testing;
