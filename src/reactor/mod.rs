//! Event reactor: readiness multiplexing, periodic tick, dispatch safety.
//!
//! Internal modules:
//! - [`core`]: registry, three-pass dispatch, and the main loop;
//! - [`clock`]: tick deadline with wall-clock drift resynchronization;
//! - [`reconcile`]: mirrors externally-owned descriptor sets into the registry;
//! - `epoll`: thin wrapper over the Linux multiplexer syscalls;
//! - [`handler`]: the readiness-callback trait.

mod clock;
mod core;
mod epoll;
mod handler;
mod reconcile;

pub use clock::{TickSchedule, TickStep, MAX_LATE, TICK_PERIOD};
pub use core::{Driver, Reactor};
pub use handler::{EventHandler, HandlerRef};
pub use reconcile::{FdReconciler, FdSource};
