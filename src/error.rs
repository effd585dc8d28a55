//! Error types used by the reactor and the reconciliation engine.
//!
//! This module defines three main error enums:
//!
//! - [`ReactorError`] — failures of the event multiplexer itself.
//! - [`ConfigError`] — failures that abort one reconfigure attempt.
//! - [`ControlError`] — failures of individual control-layer operations.
//!
//! Only two conditions are fatal to the process: the multiplexer cannot be
//! created, or a poll fails with something other than an interruption.
//! Everything else is logged and survived — a failed reconfigure leaves the
//! previous snapshot in effect, and a failed apply does not abort the
//! remaining applies.

use std::io;
use std::os::fd::RawFd;
use std::path::PathBuf;

use thiserror::Error;

/// # Errors raised by the event reactor.
///
/// Creation and poll failures are fatal; registration failures are returned
/// to the caller, who logs them and carries on.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ReactorError {
    /// The epoll instance could not be created. Fatal at startup.
    #[error("event multiplexer creation failed: {0}")]
    Create(#[source] io::Error),

    /// A poll failed with something other than an interruption. Fatal.
    #[error("poll failed: {0}")]
    Poll(#[source] io::Error),

    /// The handler reported a descriptor that cannot be watched.
    #[error("invalid descriptor {fd}")]
    InvalidFd { fd: RawFd },

    /// A handler for this descriptor is already registered.
    #[error("descriptor {fd} is already registered")]
    AlreadyRegistered { fd: RawFd },

    /// The multiplexer rejected the descriptor.
    #[error("cannot register descriptor {fd}: {source}")]
    Register {
        fd: RawFd,
        #[source]
        source: io::Error,
    },

    /// The multiplexer failed to detach the descriptor. The registry entry
    /// is gone regardless; no callback will run for it.
    #[error("cannot unregister descriptor {fd}: {source}")]
    Unregister {
        fd: RawFd,
        #[source]
        source: io::Error,
    },
}

/// # Errors that abort a single reconfigure attempt.
///
/// None of these touch the running state: the previously applied snapshot
/// stays in effect until a later reload succeeds.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration document could not be read.
    #[error("cannot read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration document could not be parsed.
    #[error("cannot parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The managed bridge has no kernel interface index.
    #[error("no interface index for bridge {0}")]
    BridgeResolve(String),
}

/// # Errors of individual control-layer operations.
///
/// The reconciliation engine treats every one of these as best-effort: the
/// failure is logged, counted, and the remaining applies proceed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ControlError {
    /// The underlying kernel or protocol-engine call failed.
    #[error("control operation {op} failed: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// The wired control layer cannot express this operation.
    #[error("control operation {0} not supported by this control layer")]
    Unsupported(&'static str),
}

impl ControlError {
    /// Returns the operation name, for structured log fields.
    pub fn op(&self) -> &'static str {
        match self {
            ControlError::Io { op, .. } => op,
            ControlError::Unsupported(op) => op,
        }
    }
}

/// # Errors that stop the daemon during startup or its main loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DaemonError {
    /// Fatal reactor failure (creation or poll).
    #[error(transparent)]
    Reactor(#[from] ReactorError),

    /// The signal mask or signal descriptor could not be set up.
    #[error("signal plane setup failed: {0}")]
    Signals(#[source] io::Error),
}
