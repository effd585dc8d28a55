//! Thin safe wrapper around the Linux epoll syscalls.
//!
//! Read-interest only; the payload stored with each watch is the raw
//! descriptor itself, so a wait returns the plain list of ready fds and the
//! registry above this layer decides what (if anything) still handles them.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

/// Upper bound on descriptors drained by a single wait.
pub(crate) const BATCH_SIZE: usize = 8;

pub(crate) struct Epoll {
    fd: OwnedFd,
}

impl Epoll {
    pub(crate) fn new() -> io::Result<Self> {
        let fd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        })
    }

    /// Adds `fd` with read interest.
    pub(crate) fn add(&self, fd: RawFd) -> io::Result<()> {
        let mut ev = libc::epoll_event {
            events: libc::EPOLLIN as u32,
            u64: fd as u64,
        };
        let r = unsafe { libc::epoll_ctl(self.fd.as_raw_fd(), libc::EPOLL_CTL_ADD, fd, &mut ev) };
        if r < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Removes `fd` from the interest set.
    pub(crate) fn delete(&self, fd: RawFd) -> io::Result<()> {
        let r = unsafe {
            libc::epoll_ctl(
                self.fd.as_raw_fd(),
                libc::EPOLL_CTL_DEL,
                fd,
                std::ptr::null_mut(),
            )
        };
        if r < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Blocks up to `timeout` and fills `ready` with the descriptors that
    /// became readable. Returns the count; an interrupted wait is the
    /// caller's to classify (surfaces as `ErrorKind::Interrupted`).
    pub(crate) fn wait(
        &self,
        ready: &mut [RawFd; BATCH_SIZE],
        timeout: Duration,
    ) -> io::Result<usize> {
        let mut events: [libc::epoll_event; BATCH_SIZE] = unsafe { std::mem::zeroed() };

        // Round up so a sub-millisecond remainder does not spin at zero.
        let ms = timeout
            .as_millis()
            .saturating_add(u128::from(timeout.subsec_nanos() % 1_000_000 != 0))
            .min(i32::MAX as u128) as i32;

        let n = unsafe {
            libc::epoll_wait(
                self.fd.as_raw_fd(),
                events.as_mut_ptr(),
                BATCH_SIZE as i32,
                ms,
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        let n = n as usize;
        for (slot, ev) in ready.iter_mut().zip(&events[..n]) {
            *slot = ev.u64 as RawFd;
        }
        Ok(n)
    }
}
