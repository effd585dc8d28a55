//! Dispatch-safety tests against a live reactor with real pipes.

mod common;

use std::cell::{Cell, RefCell};
use std::os::fd::{AsRawFd, RawFd};
use std::rc::Rc;
use std::time::Duration;

use bridgevisor::{EventHandler, Reactor, ReactorError};

use common::{pipe, poke};

/// Handler that counts invocations and optionally unregisters a victim.
struct Recording {
    fd: RawFd,
    hits: Cell<usize>,
    victim: RefCell<Option<RawFd>>,
}

impl Recording {
    fn new(fd: RawFd) -> Rc<Self> {
        Rc::new(Self {
            fd,
            hits: Cell::new(0),
            victim: RefCell::new(None),
        })
    }

    fn with_victim(fd: RawFd, victim: RawFd) -> Rc<Self> {
        let h = Self::new(fd);
        *h.victim.borrow_mut() = Some(victim);
        h
    }
}

impl EventHandler for Recording {
    fn fd(&self) -> RawFd {
        self.fd
    }

    fn ready(&self, reactor: &mut Reactor) {
        self.hits.set(self.hits.get() + 1);
        if let Some(victim) = *self.victim.borrow() {
            reactor.unregister(victim).unwrap();
        }
    }
}

#[test]
fn test_unregistered_handler_is_never_invoked() {
    let mut reactor = Reactor::new().unwrap();
    let (rx, tx) = pipe();
    let handler = Recording::new(rx.as_raw_fd());
    reactor.register(handler.clone()).unwrap();

    poke(tx.as_raw_fd());
    reactor.unregister(rx.as_raw_fd()).unwrap();

    reactor.poll(Duration::from_millis(50)).unwrap();
    assert_eq!(handler.hits.get(), 0);
}

#[test]
fn test_handler_fires_while_registered() {
    let mut reactor = Reactor::new().unwrap();
    let (rx, tx) = pipe();
    let handler = Recording::new(rx.as_raw_fd());
    reactor.register(handler.clone()).unwrap();

    poke(tx.as_raw_fd());
    let n = reactor.poll(Duration::from_millis(1000)).unwrap();
    assert_eq!(n, 1);
    assert_eq!(handler.hits.get(), 1);
}

#[test]
fn test_unregistration_mid_batch_suppresses_the_victim() {
    let mut reactor = Reactor::new().unwrap();
    let (a_rx, a_tx) = pipe();
    let (b_rx, b_tx) = pipe();

    // Each handler unregisters the other. Whichever the batch dispatches
    // first must win; the other must not run in the same batch.
    let a = Recording::with_victim(a_rx.as_raw_fd(), b_rx.as_raw_fd());
    let b = Recording::with_victim(b_rx.as_raw_fd(), a_rx.as_raw_fd());
    reactor.register(a.clone()).unwrap();
    reactor.register(b.clone()).unwrap();

    poke(a_tx.as_raw_fd());
    poke(b_tx.as_raw_fd());

    let n = reactor.poll(Duration::from_millis(1000)).unwrap();
    assert_eq!(n, 2, "both descriptors should be in the same batch");
    assert_eq!(
        a.hits.get() + b.hits.get(),
        1,
        "exactly one handler of the pair may run"
    );
    assert_eq!(reactor.len(), 1);
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut reactor = Reactor::new().unwrap();
    let (rx, _tx) = pipe();
    let handler = Recording::new(rx.as_raw_fd());
    reactor.register(handler.clone()).unwrap();
    let err = reactor.register(handler).unwrap_err();
    assert!(matches!(err, ReactorError::AlreadyRegistered { .. }));
}

#[test]
fn test_invalid_fd_is_rejected() {
    let mut reactor = Reactor::new().unwrap();
    let err = reactor.register(Recording::new(-1)).unwrap_err();
    assert!(matches!(err, ReactorError::InvalidFd { .. }));
}

#[test]
fn test_unregister_is_idempotent() {
    let mut reactor = Reactor::new().unwrap();
    let (rx, _tx) = pipe();
    reactor.register(Recording::new(rx.as_raw_fd())).unwrap();
    reactor.unregister(rx.as_raw_fd()).unwrap();
    reactor.unregister(rx.as_raw_fd()).unwrap();
    assert!(reactor.is_empty());
}

#[test]
fn test_poll_times_out_with_empty_batch() {
    let mut reactor = Reactor::new().unwrap();
    let (rx, _tx) = pipe();
    reactor.register(Recording::new(rx.as_raw_fd())).unwrap();
    let n = reactor.poll(Duration::from_millis(10)).unwrap();
    assert_eq!(n, 0);
}
