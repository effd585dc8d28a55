//! # Dynamic fd-set reconciliation for externally-owned descriptors.
//!
//! Some subsystems (a management agent, typically) own a set of descriptors
//! that changes over time and know nothing about the reactor. The reconciler
//! bridges the two with a pull model: each pass it asks the source for its
//! current desired set and diffs that against what it has registered.
//!
//! ## Architecture
//! ```text
//! FdReconciler::sync(&mut Reactor)
//!   desired = source.desired_fds()
//!   tracked ∖ desired ──► unregister + drop proxy
//!   desired ∖ tracked ──► register new ProxyHandler
//!
//! ProxyHandler::ready(fd)
//!   source.read_ready(fd)        (the subsystem's own read logic)
//!   sync()                       (reads may change the desired set)
//! ```
//!
//! ## Rules
//! - after every pass, tracked descriptors == the most recently reported
//!   desired set, with no duplicate registrations;
//! - descriptors the subsystem kept are left untouched (same proxy, no
//!   re-registration churn);
//! - registration failures are logged and retried implicitly on the next
//!   pass, since the descriptor stays untracked.

use std::cell::RefCell;
use std::collections::HashMap;
use std::os::fd::RawFd;
use std::rc::{Rc, Weak};

use tracing::warn;

use super::core::Reactor;
use super::handler::EventHandler;

/// A subsystem that owns a time-varying descriptor set.
///
/// Implementations keep their own state; the reconciler only ever asks for
/// the current set and forwards readiness.
pub trait FdSource {
    /// The descriptors the subsystem currently wants watched.
    fn desired_fds(&mut self) -> Vec<RawFd>;

    /// Readiness on a watched descriptor; runs the subsystem's read logic.
    fn read_ready(&mut self, fd: RawFd);

    /// Periodic-tick hook (timeouts, housekeeping).
    fn on_tick(&mut self) {}

    /// Called before every blocking wait (outstanding-work processing).
    fn before_wait(&mut self) {}
}

struct Inner {
    source: Box<dyn FdSource>,
    tracked: HashMap<RawFd, Rc<ProxyHandler>>,
}

/// Mirrors an [`FdSource`]'s desired set into the reactor.
pub struct FdReconciler {
    inner: Rc<RefCell<Inner>>,
}

/// Registered stand-in for one subsystem-owned descriptor.
struct ProxyHandler {
    fd: RawFd,
    reconciler: Weak<RefCell<Inner>>,
}

impl EventHandler for ProxyHandler {
    fn fd(&self) -> RawFd {
        self.fd
    }

    fn ready(&self, reactor: &mut Reactor) {
        let Some(inner) = self.reconciler.upgrade() else {
            return;
        };
        inner.borrow_mut().source.read_ready(self.fd);
        // Reads can open or close descriptors; reconcile immediately.
        FdReconciler::sync_inner(&inner, reactor);
    }
}

impl FdReconciler {
    pub fn new(source: Box<dyn FdSource>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                source,
                tracked: HashMap::new(),
            })),
        }
    }

    /// One reconciliation pass against the source's current desired set.
    pub fn sync(&self, reactor: &mut Reactor) {
        Self::sync_inner(&self.inner, reactor);
    }

    /// Tick hook: forwards to the source, then reconciles.
    pub fn on_tick(&self, reactor: &mut Reactor) {
        self.inner.borrow_mut().source.on_tick();
        Self::sync_inner(&self.inner, reactor);
    }

    /// Pre-wait hook: forwards to the source, then reconciles.
    pub fn before_wait(&self, reactor: &mut Reactor) {
        self.inner.borrow_mut().source.before_wait();
        Self::sync_inner(&self.inner, reactor);
    }

    /// Descriptors currently mirrored into the reactor.
    pub fn tracked_fds(&self) -> Vec<RawFd> {
        let mut fds: Vec<RawFd> = self.inner.borrow().tracked.keys().copied().collect();
        fds.sort_unstable();
        fds
    }

    #[cfg(test)]
    fn proxy_for(&self, fd: RawFd) -> Option<Rc<ProxyHandler>> {
        self.inner.borrow().tracked.get(&fd).cloned()
    }

    fn sync_inner(inner: &Rc<RefCell<Inner>>, reactor: &mut Reactor) {
        let desired = inner.borrow_mut().source.desired_fds();

        let stale: Vec<RawFd> = inner
            .borrow()
            .tracked
            .keys()
            .filter(|fd| !desired.contains(fd))
            .copied()
            .collect();
        for fd in stale {
            inner.borrow_mut().tracked.remove(&fd);
            if let Err(e) = reactor.unregister(fd) {
                warn!(fd, error = %e, "failed to detach stale descriptor");
            }
        }

        for fd in desired {
            if inner.borrow().tracked.contains_key(&fd) {
                continue;
            }
            let proxy = Rc::new(ProxyHandler {
                fd,
                reconciler: Rc::downgrade(inner),
            });
            let handler: Rc<dyn EventHandler> = proxy.clone();
            match reactor.register(handler) {
                Ok(()) => {
                    inner.borrow_mut().tracked.insert(fd, proxy);
                }
                Err(e) => warn!(fd, error = %e, "failed to watch subsystem descriptor"),
            }
        }
    }
}
