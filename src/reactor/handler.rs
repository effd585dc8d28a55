//! Readiness callback seam between the reactor and its subsystems.

use std::os::fd::RawFd;
use std::rc::Rc;

use super::Reactor;

/// A read-interest callback bound to one descriptor.
///
/// Handlers are shared `Rc`s: the registry holds one clone, the owning
/// subsystem may hold another. `ready` takes `&self` — implementations keep
/// their mutable state behind `Cell`/`RefCell`, which is free on the single
/// reactor thread.
///
/// The `&mut Reactor` argument allows a callback to register and unregister
/// handlers mid-batch; the reactor's three-pass dispatch guarantees that a
/// handler unregistered this way is not invoked later in the same batch.
pub trait EventHandler {
    /// The descriptor this handler wants readiness for.
    fn fd(&self) -> RawFd;

    /// Called when the descriptor is readable.
    fn ready(&self, reactor: &mut Reactor);
}

/// Shared handler reference as stored in the registry.
pub type HandlerRef = Rc<dyn EventHandler>;
