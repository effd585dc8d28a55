//! # bridgevisor
//!
//! **bridgevisor** is the control-plane core of a network-bridge
//! (spanning-tree) management daemon: a single-threaded event reactor that
//! turns OS signals and descriptor readiness into serialized
//! configuration-reconciliation and status-publication actions.
//!
//! ## Architecture
//! ```text
//!                  ┌────────────────────────────────────────────────────┐
//!                  │  Reactor (single thread)                           │
//!                  │  - epoll readiness, ≤8 fds per batch               │
//!                  │  - three-pass dispatch (mutation-safe)             │
//!                  │  - 1s tick with wall-clock drift resync            │
//!                  └──────┬──────────────────┬──────────────────┬───────┘
//!                         ▼                  ▼                  ▼
//!                  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!                  │ SignalPlane  │   │ FdReconciler │   │ Driver hooks │
//!                  │ (signalfd)   │   │ (agent fds)  │   │ (tick)       │
//!                  └──────┬───────┘   └──────────────┘   └──────────────┘
//!                         │ SignalEvent
//!            ┌────────────┼──────────────────┐
//!            ▼            ▼                  ▼
//!     ┌────────────┐ ┌──────────────┐ ┌─────────────────┐
//!     │ Shutdown   │ │ ReconfigEngine│ │ StatusPublisher │
//!     │ (cleanup + │ │ (snapshot +  │ │ (status tree +  │
//!     │  exit)     │ │  applies)    │ │  status text)   │
//!     └────────────┘ └──────┬───────┘ └────────┬────────┘
//!                           ▼                  ▼
//!                  ┌────────────────────────────────────┐
//!                  │ ControlLayer (external collaborator)│
//!                  │ ifindex / bridge / port / status    │
//!                  └────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! ```text
//! Daemon::run()
//!   ├─► write pid marker
//!   ├─► initial reconfigure (best-effort)
//!   ├─► install signal plane, register its fd
//!   └─► Reactor::run()
//!         loop {
//!           tick?            → ControlLayer::one_second + agent housekeeping
//!           reconcile fds    → agent's desired set mirrored into registry
//!           poll             → dispatch ready handlers (three passes)
//!         }
//!
//! SIGHUP  ──► ReconfigEngine::reconfigure()   (new snapshot or keep old)
//! SIGUSR1 ──► StatusPublisher::publish(display = true)
//! SIGTERM ──► ShutdownOrchestrator::terminate()   (never returns)
//! ```
//!
//! ## Example
//! ```no_run
//! use std::rc::Rc;
//! use bridgevisor::{control::SysfsControl, Daemon, DaemonConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let control = Rc::new(SysfsControl::new());
//!     let daemon = Daemon::builder(DaemonConfig::default(), control).build()?;
//!     daemon.run()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod control;
pub mod daemon;
pub mod error;
pub mod indicator;
pub mod reactor;
pub mod shutdown;
pub mod signals;
pub mod status;

// ---- Public re-exports ----

pub use config::{ApplySummary, ConfigSnapshot, ReconfigEngine};
pub use daemon::{Daemon, DaemonBuilder, DaemonConfig, InstancePaths};
pub use error::{ConfigError, ControlError, DaemonError, ReactorError};
pub use reactor::{Driver, EventHandler, FdReconciler, FdSource, Reactor};
pub use signals::SignalEvent;
pub use shutdown::ShutdownOrchestrator;
pub use status::{StatusPublisher, StatusTree};
