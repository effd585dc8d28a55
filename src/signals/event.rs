//! # Control events derived from OS signals.
//!
//! The daemon reacts to exactly five signals, collapsed into three events:
//!
//! | Event       | Signals                    | Action                      |
//! |-------------|----------------------------|-----------------------------|
//! | `Terminate` | SIGTERM, SIGINT, SIGQUIT   | shutdown (never returns)    |
//! | `Reload`    | SIGHUP                     | re-fetch and reapply config |
//! | `Snapshot`  | SIGUSR1                    | publish status with display |

/// Classification of a received control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    /// Graceful shutdown.
    Terminate,
    /// Re-fetch and reapply the configuration document.
    Reload,
    /// Regenerate status output and refresh live counters.
    Snapshot,
}

impl SignalEvent {
    /// The signals the plane blocks and listens for.
    pub(crate) const SIGNALS: [libc::c_int; 5] = [
        libc::SIGTERM,
        libc::SIGINT,
        libc::SIGQUIT,
        libc::SIGHUP,
        libc::SIGUSR1,
    ];

    /// Maps a signal number onto its control event. Signals outside the
    /// handled set yield `None`.
    pub fn from_signo(signo: libc::c_int) -> Option<Self> {
        match signo {
            libc::SIGTERM | libc::SIGINT | libc::SIGQUIT => Some(SignalEvent::Terminate),
            libc::SIGHUP => Some(SignalEvent::Reload),
            libc::SIGUSR1 => Some(SignalEvent::Snapshot),
            _ => None,
        }
    }
}
