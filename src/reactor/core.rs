//! # Reactor core: registry, three-pass dispatch, and the main loop.
//!
//! Serializes readiness of a bounded descriptor set and a coarse one-second
//! tick into ordered callback invocations on a single thread.
//!
//! ## Architecture
//! ```text
//! Reactor::run(driver)
//!   loop {
//!     TickSchedule::step(now) ──► Fire ──► driver.tick(&mut Reactor)
//!                             └─► Wait(d)
//!     driver.pre_wait(&mut Reactor)          (fd-set reconciliation hook)
//!     Epoll::wait(≤ d) ──► ready batch ──► dispatch (three passes)
//!   }
//! ```
//!
//! ## Dispatch safety
//! A batch of ready descriptors is dispatched in three passes:
//!
//! 1. every ready slot still mapped to a live handler gets a back-reference
//!    (handler → slot index) stored on the registry entry;
//! 2. each handler whose back-reference still matches its slot is invoked;
//! 3. surviving back-references are cleared.
//!
//! Unregistering removes the registry entry, back-reference and all, so a
//! handler unregistered by an earlier callback in the same batch is skipped
//! in pass 2. A handler registered *during* the batch (descriptor reuse)
//! carries no back-reference yet and is equally skipped until the next poll.
//!
//! ## Rules
//! - descriptor keys are unique; one live handler per descriptor;
//! - registration/deregistration failures are returned and non-fatal;
//! - multiplexer creation failure and non-interruption poll failures are
//!   fatal, reported as [`ReactorError`].

use std::cell::Cell;
use std::collections::HashMap;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::time::{Duration, SystemTime};

use tracing::trace;

use crate::error::ReactorError;

use super::clock::{TickSchedule, TickStep};
use super::epoll::{Epoll, BATCH_SIZE};
use super::handler::HandlerRef;

/// Hooks the owning loop plugs into [`Reactor::run`].
pub trait Driver {
    /// Fired once per elapsed tick period.
    fn tick(&mut self, reactor: &mut Reactor);

    /// Called right before every blocking wait.
    fn pre_wait(&mut self, _reactor: &mut Reactor) {}
}

struct Registered {
    handler: HandlerRef,
    /// Back-reference into the in-flight readiness batch, if any.
    batch_slot: Cell<Option<usize>>,
}

/// Single-threaded readiness multiplexer with a coarse periodic tick.
pub struct Reactor {
    epoll: Epoll,
    handlers: HashMap<RawFd, Registered>,
}

impl Reactor {
    /// Creates the underlying multiplexer. Failure here is fatal.
    pub fn new() -> Result<Self, ReactorError> {
        let epoll = Epoll::new().map_err(ReactorError::Create)?;
        Ok(Self {
            epoll,
            handlers: HashMap::new(),
        })
    }

    /// Attaches `handler` for read interest on its descriptor.
    pub fn register(&mut self, handler: HandlerRef) -> Result<(), ReactorError> {
        let fd = handler.fd();
        if fd < 0 {
            return Err(ReactorError::InvalidFd { fd });
        }
        if self.handlers.contains_key(&fd) {
            return Err(ReactorError::AlreadyRegistered { fd });
        }
        self.epoll
            .add(fd)
            .map_err(|source| ReactorError::Register { fd, source })?;
        self.handlers.insert(
            fd,
            Registered {
                handler,
                batch_slot: Cell::new(None),
            },
        );
        Ok(())
    }

    /// Detaches the handler for `fd`. Idempotent: an unknown descriptor is
    /// not an error. Removing the entry also drops its back-reference, so an
    /// in-progress dispatch skips the handler from here on.
    pub fn unregister(&mut self, fd: RawFd) -> Result<(), ReactorError> {
        if self.handlers.remove(&fd).is_none() {
            return Ok(());
        }
        self.epoll
            .delete(fd)
            .map_err(|source| ReactorError::Unregister { fd, source })
    }

    /// Whether a handler is currently registered for `fd`.
    pub fn is_registered(&self, fd: RawFd) -> bool {
        self.handlers.contains_key(&fd)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// One poll-and-dispatch cycle; blocks at most `timeout`. Returns the
    /// number of descriptors that were ready. An interrupted wait counts as
    /// an empty batch; any other poll failure is fatal.
    pub fn poll(&mut self, timeout: Duration) -> Result<usize, ReactorError> {
        let mut ready: [RawFd; BATCH_SIZE] = [-1; BATCH_SIZE];
        let n = match self.epoll.wait(&mut ready, timeout) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => 0,
            Err(e) => return Err(ReactorError::Poll(e)),
        };
        if n > 0 {
            self.dispatch(&ready[..n]);
        }
        Ok(n)
    }

    /// Runs forever, alternating ticks and polls. Returns only on a fatal
    /// poll failure; orderly termination happens inside a signal handler.
    pub fn run(&mut self, driver: &mut dyn Driver) -> Result<(), ReactorError> {
        let mut schedule = TickSchedule::new(SystemTime::now());
        loop {
            let wait = match schedule.step(SystemTime::now()) {
                TickStep::Fire { resync } => {
                    if resync {
                        trace!("tick deadline resynchronized after clock step");
                    }
                    driver.tick(self);
                    Duration::ZERO
                }
                TickStep::Wait(remaining) => remaining,
            };
            driver.pre_wait(self);
            self.poll(wait)?;
        }
    }

    fn dispatch(&mut self, ready: &[RawFd]) {
        // Pass 1: bind back-references for slots still mapped to a live handler.
        for (slot, fd) in ready.iter().enumerate() {
            if let Some(entry) = self.handlers.get(fd) {
                entry.batch_slot.set(Some(slot));
            }
        }

        // Pass 2: invoke. The back-reference must still match the slot; an
        // entry removed (or replaced) by an earlier callback fails the check.
        for (slot, fd) in ready.iter().enumerate() {
            let handler = match self.handlers.get(fd) {
                Some(entry) if entry.batch_slot.get() == Some(slot) => Rc::clone(&entry.handler),
                _ => continue,
            };
            handler.ready(self);
        }

        // Pass 3: clear surviving back-references.
        for (slot, fd) in ready.iter().enumerate() {
            if let Some(entry) = self.handlers.get(fd) {
                if entry.batch_slot.get() == Some(slot) {
                    entry.batch_slot.set(None);
                }
            }
        }
    }
}
