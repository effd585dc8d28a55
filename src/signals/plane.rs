//! # Signal control plane: blocked mask + signal descriptor.
//!
//! Signals never run logic in signal-handler context. The handled set is
//! blocked at the process level and converted into a readable descriptor
//! that yields fixed-size structured records; that descriptor is registered
//! with the reactor like any other fd, so signal actions execute at normal
//! call-stack depth, serialized with everything else.
//!
//! One readiness event consumes exactly one record. Signals still pending
//! after that surface as subsequent readiness notifications — there is no
//! drain loop, which keeps a reload from starving other handlers.

use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::rc::Rc;

use tracing::{debug, error, info};

use crate::reactor::{EventHandler, Reactor};

use super::event::SignalEvent;

/// Blocks the handled signal set and owns the signal descriptor.
pub struct SignalPlane {
    fd: OwnedFd,
}

impl SignalPlane {
    /// Blocks {TERM, INT, QUIT, HUP, USR1} process-wide and opens the
    /// descriptor delivering their records.
    pub fn install() -> io::Result<Self> {
        let mut set: libc::sigset_t = unsafe { mem::zeroed() };
        unsafe {
            if libc::sigemptyset(&mut set) != 0 {
                return Err(io::Error::last_os_error());
            }
            for signo in SignalEvent::SIGNALS {
                if libc::sigaddset(&mut set, signo) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
            // signalfd only sees signals that are blocked for delivery.
            if libc::sigprocmask(libc::SIG_BLOCK, &set, std::ptr::null_mut()) != 0 {
                return Err(io::Error::last_os_error());
            }
            let fd = libc::signalfd(-1, &set, libc::SFD_CLOEXEC);
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(Self {
                fd: OwnedFd::from_raw_fd(fd),
            })
        }
    }

    pub fn fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

/// Reads exactly one signal record from `fd`. A short read is logged and
/// dropped; an unhandled signal number likewise.
pub(crate) fn read_event(fd: RawFd) -> Option<SignalEvent> {
    const RECORD_SIZE: usize = mem::size_of::<libc::signalfd_siginfo>();

    let mut info: libc::signalfd_siginfo = unsafe { mem::zeroed() };
    let n = unsafe {
        libc::read(
            fd,
            (&mut info as *mut libc::signalfd_siginfo).cast(),
            RECORD_SIZE,
        )
    };
    if n != RECORD_SIZE as isize {
        error!(bytes = n, expected = RECORD_SIZE, "invalid size of signal record");
        return None;
    }
    let signo = info.ssi_signo as libc::c_int;
    let event = SignalEvent::from_signo(signo);
    if event.is_none() {
        debug!(signo, "ignoring unhandled signal record");
    }
    event
}

/// What each control event drives. Shared single-threaded state throughout.
pub struct SignalActions {
    pub engine: Rc<std::cell::RefCell<crate::config::ReconfigEngine>>,
    pub publisher: Rc<crate::status::StatusPublisher>,
    pub shutdown: Rc<crate::shutdown::ShutdownOrchestrator>,
}

/// Reactor handler for the signal descriptor.
pub struct SignalHandler {
    plane: SignalPlane,
    actions: SignalActions,
}

impl SignalHandler {
    pub fn new(plane: SignalPlane, actions: SignalActions) -> Self {
        Self { plane, actions }
    }

    fn act(&self, event: SignalEvent) {
        match event {
            SignalEvent::Terminate => self.actions.shutdown.terminate(),
            SignalEvent::Reload => {
                if let Err(e) = self.actions.engine.borrow_mut().reconfigure() {
                    error!(error = %e, "reload failed; previous configuration stays active");
                }
            }
            SignalEvent::Snapshot => {
                let snapshot = self.actions.engine.borrow().snapshot();
                self.actions.publisher.publish(&snapshot, true);
            }
        }
    }
}

impl EventHandler for SignalHandler {
    fn fd(&self) -> RawFd {
        self.plane.fd()
    }

    fn ready(&self, _reactor: &mut Reactor) {
        if let Some(event) = read_event(self.plane.fd()) {
            info!(?event, "control signal received");
            self.act(event);
        }
    }
}
