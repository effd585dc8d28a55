//! # Daemon assembly: builder, wiring, and the run loop.
//!
//! The builder puts the pieces together; `run` brings the daemon up in the
//! order the control plane expects:
//!
//! ```text
//! DaemonBuilder::build()
//!   ├─ Reactor::new()                      (fatal on failure)
//!   ├─ ReconfigEngine / StatusPublisher / ShutdownOrchestrator
//!   └─ FdReconciler                        (when an agent is wired)
//!
//! Daemon::run()
//!   ├─ write pid marker
//!   ├─ initial reconfigure                 (failure logged, daemon stays up)
//!   ├─ SignalPlane::install + register     (fatal on failure)
//!   └─ Reactor::run(driver)
//!        tick     → control.one_second() + agent tick/reconcile
//!        pre_wait → agent outstanding-work + reconcile
//! ```

mod paths;

pub use paths::InstancePaths;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{error, info, warn};

use crate::config::ReconfigEngine;
use crate::control::ControlLayer;
use crate::error::DaemonError;
use crate::indicator::StatusLed;
use crate::reactor::{Driver, FdReconciler, FdSource, Reactor};
use crate::shutdown::ShutdownOrchestrator;
use crate::signals::{SignalActions, SignalHandler, SignalPlane};
use crate::status::{StatusPublisher, StatusTree};

/// Identity of one daemon instance.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Instance number; selects the config file and the status subdirectory.
    pub instance: u32,
    /// Interface name of the managed bridge.
    pub bridge: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            instance: 0,
            bridge: "br0".to_string(),
        }
    }
}

/// Builder for constructing a [`Daemon`] with optional collaborators.
pub struct DaemonBuilder {
    cfg: DaemonConfig,
    control: Rc<dyn ControlLayer>,
    paths: Option<InstancePaths>,
    led: Option<StatusLed>,
    agent: Option<Box<dyn FdSource>>,
}

impl DaemonBuilder {
    /// Overrides the well-known paths (tests, containers).
    pub fn with_paths(mut self, paths: InstancePaths) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Overrides indicator discovery.
    pub fn with_led(mut self, led: StatusLed) -> Self {
        self.led = Some(led);
        self
    }

    /// Wires a management agent whose descriptor set is mirrored into the
    /// reactor.
    pub fn with_agent(mut self, agent: Box<dyn FdSource>) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Builds the daemon. The only failure here is multiplexer creation.
    pub fn build(self) -> Result<Daemon, DaemonError> {
        let paths = self
            .paths
            .unwrap_or_else(|| InstancePaths::for_instance(self.cfg.instance));
        let led = self.led.unwrap_or_else(StatusLed::discover);
        let tree = StatusTree::new(paths.status_root.clone(), self.cfg.instance);

        let reactor = Reactor::new()?;
        let engine = Rc::new(RefCell::new(ReconfigEngine::new(
            Rc::clone(&self.control),
            tree.clone(),
            paths.config_file.clone(),
            self.cfg.bridge.clone(),
        )));
        let publisher = Rc::new(StatusPublisher::new(
            Rc::clone(&self.control),
            tree.clone(),
            paths.clone(),
            self.cfg.bridge.clone(),
            led.clone(),
        ));
        let shutdown = Rc::new(ShutdownOrchestrator::new(paths.clone(), tree, led));

        Ok(Daemon {
            reactor,
            engine,
            publisher,
            shutdown,
            control: self.control,
            paths,
            reconciler: self.agent.map(FdReconciler::new),
        })
    }
}

/// The assembled daemon.
pub struct Daemon {
    reactor: Reactor,
    engine: Rc<RefCell<ReconfigEngine>>,
    publisher: Rc<StatusPublisher>,
    shutdown: Rc<ShutdownOrchestrator>,
    control: Rc<dyn ControlLayer>,
    paths: InstancePaths,
    reconciler: Option<FdReconciler>,
}

impl Daemon {
    pub fn builder(cfg: DaemonConfig, control: Rc<dyn ControlLayer>) -> DaemonBuilder {
        DaemonBuilder {
            cfg,
            control,
            paths: None,
            led: None,
            agent: None,
        }
    }

    /// Brings the daemon up and runs the reactor until a fatal failure.
    /// Orderly termination happens inside the Terminate signal action.
    pub fn run(mut self) -> Result<(), DaemonError> {
        if let Err(e) = self.paths.write_pid() {
            warn!(path = %self.paths.pid_file.display(), error = %e, "cannot write pid file");
        }

        match self.engine.borrow_mut().reconfigure() {
            Ok(summary) => info!(
                applied = summary.applied_ports.len(),
                skipped = summary.skipped_ports.len(),
                "initial configuration applied"
            ),
            Err(e) => {
                error!(error = %e, "initial configuration failed; waiting for reload");
            }
        }

        let plane = SignalPlane::install().map_err(DaemonError::Signals)?;
        let handler = Rc::new(SignalHandler::new(
            plane,
            SignalActions {
                engine: Rc::clone(&self.engine),
                publisher: Rc::clone(&self.publisher),
                shutdown: Rc::clone(&self.shutdown),
            },
        ));
        self.reactor.register(handler)?;

        let mut driver = ControlDriver {
            control: Rc::clone(&self.control),
            reconciler: self.reconciler.take(),
        };
        info!("entering reactor loop");
        Ok(self.reactor.run(&mut driver)?)
    }
}

/// Reactor hooks: protocol-engine tick plus agent reconciliation.
struct ControlDriver {
    control: Rc<dyn ControlLayer>,
    reconciler: Option<FdReconciler>,
}

impl Driver for ControlDriver {
    fn tick(&mut self, reactor: &mut Reactor) {
        self.control.one_second();
        if let Some(reconciler) = &self.reconciler {
            reconciler.on_tick(reactor);
        }
    }

    fn pre_wait(&mut self, reactor: &mut Reactor) {
        if let Some(reconciler) = &self.reconciler {
            reconciler.before_wait(reactor);
        }
    }
}
