//! # Configuration reconciliation engine.
//!
//! Turns the on-disk configuration document into a canonical
//! [`ConfigSnapshot`] and pushes it through the control layer. One reload is
//! one strictly ordered sequence:
//!
//! ```text
//! 1. fresh zeroed snapshot
//! 2. parse + clamp bridge scalars
//! 3. resolve each port name → ifindex   (failure: skip that entry)
//! 4. resolve the bridge itself          (failure: abort, keep old snapshot)
//! 5. ensure status tree, announce membership
//! 6. enable STP on the bridge device
//! 7. force the rapid protocol variant
//! 8. apply bridge scalars, then per-enabled-port scalars
//! 9. swap the snapshot in
//! ```
//!
//! ## Rules
//! - steps 1–4 never touch applied state; only step 4's failure aborts;
//! - steps 5–8 are best-effort: each failure is logged and counted, the
//!   remaining applies proceed;
//! - the snapshot swap is a single `Rc` assignment at the very end, so a
//!   reader never observes a half-built snapshot and a failed reload leaves
//!   the previous one in effect;
//! - re-running on unchanged input converges to the same applied state.

use std::path::PathBuf;
use std::rc::Rc;

use tracing::{info, warn};

use crate::config::schema::ConfigDoc;
use crate::config::snapshot::{
    BridgeConfig, ConfigSnapshot, PortConfig, PortMember, MAX_PORTS,
};
use crate::control::{CistBridgeDelta, CistPortDelta, ControlLayer, ProtocolVersion};
use crate::error::{ConfigError, ControlError};
use crate::status::StatusTree;

/// Outcome of one successful reconfigure.
#[derive(Debug, Default, Clone)]
pub struct ApplySummary {
    /// Ports resolved and recorded into the snapshot.
    pub applied_ports: Vec<String>,
    /// Ports skipped because their name did not resolve.
    pub skipped_ports: Vec<String>,
    /// Individual control-layer applies that failed (logged, not fatal).
    pub apply_errors: usize,
}

/// Parses and applies configuration snapshots for one bridge instance.
pub struct ReconfigEngine {
    control: Rc<dyn ControlLayer>,
    tree: StatusTree,
    config_file: PathBuf,
    bridge: String,
    snapshot: Rc<ConfigSnapshot>,
}

impl ReconfigEngine {
    pub fn new(
        control: Rc<dyn ControlLayer>,
        tree: StatusTree,
        config_file: PathBuf,
        bridge: String,
    ) -> Self {
        Self {
            control,
            tree,
            config_file,
            bridge,
            snapshot: Rc::new(ConfigSnapshot::default()),
        }
    }

    /// The currently applied snapshot. Empty until the first successful
    /// reload.
    pub fn snapshot(&self) -> Rc<ConfigSnapshot> {
        Rc::clone(&self.snapshot)
    }

    /// The managed bridge's interface name.
    pub fn bridge(&self) -> &str {
        &self.bridge
    }

    /// Re-reads the configuration document and applies it.
    pub fn reconfigure(&mut self) -> Result<ApplySummary, ConfigError> {
        let doc = ConfigDoc::load(&self.config_file)?;

        let mut snap = ConfigSnapshot::default();
        snap.bridge = BridgeConfig::from_doc(&doc);

        let mut summary = ApplySummary::default();
        for (name, section) in &doc.ports {
            match self.control.ifindex(name) {
                Some(ifindex) if (ifindex as usize) < MAX_PORTS => {
                    snap.ports[ifindex as usize] = PortConfig::from_section(section);
                    snap.members.push(PortMember {
                        name: name.clone(),
                        ifindex,
                    });
                    summary.applied_ports.push(name.clone());
                }
                Some(ifindex) => {
                    warn!(port = %name, ifindex, "interface index beyond port table; skipping");
                    summary.skipped_ports.push(name.clone());
                }
                None => {
                    warn!(port = %name, "could not find interface index; skipping");
                    summary.skipped_ports.push(name.clone());
                }
            }
        }

        let bridge = self
            .control
            .ifindex(&self.bridge)
            .ok_or_else(|| ConfigError::BridgeResolve(self.bridge.clone()))?;

        self.tree
            .ensure(snap.enabled_members().map(|m| m.name.as_str()));
        let members: Vec<u32> = snap.enabled_members().map(|m| m.ifindex).collect();
        self.apply(&mut summary, self.control.add_bridge(bridge, &members));

        self.apply(&mut summary, self.control.enable_stp(&self.bridge, true));
        self.apply(
            &mut summary,
            self.control
                .force_protocol_version(bridge, ProtocolVersion::Rstp),
        );

        self.apply(
            &mut summary,
            self.control
                .set_msti_priority(bridge, 0, snap.bridge.priority),
        );
        self.apply(
            &mut summary,
            self.control.set_cist_bridge(
                bridge,
                &CistBridgeDelta {
                    forward_delay: Some(snap.bridge.forward_delay),
                    ..CistBridgeDelta::default()
                },
            ),
        );
        self.apply(
            &mut summary,
            self.control.set_cist_bridge(
                bridge,
                &CistBridgeDelta {
                    hello_time: Some(snap.bridge.hello_time),
                    ..CistBridgeDelta::default()
                },
            ),
        );
        self.apply(
            &mut summary,
            self.control.set_cist_bridge(
                bridge,
                &CistBridgeDelta {
                    max_age: Some(snap.bridge.max_age),
                    ..CistBridgeDelta::default()
                },
            ),
        );

        for member in snap.enabled_members() {
            let slot = snap.port(member.ifindex);
            self.apply(
                &mut summary,
                self.control.set_cist_port(
                    bridge,
                    member.ifindex,
                    &CistPortDelta {
                        admin_edge: Some(slot.admin_edge),
                        ..CistPortDelta::default()
                    },
                ),
            );
            self.apply(
                &mut summary,
                self.control.set_cist_port(
                    bridge,
                    member.ifindex,
                    &CistPortDelta {
                        admin_external_cost: Some(slot.path_cost),
                        ..CistPortDelta::default()
                    },
                ),
            );
        }

        self.snapshot = Rc::new(snap);
        info!(
            bridge = %self.bridge,
            applied = summary.applied_ports.len(),
            skipped = summary.skipped_ports.len(),
            apply_errors = summary.apply_errors,
            "configuration applied"
        );
        Ok(summary)
    }

    fn apply(&self, summary: &mut ApplySummary, result: Result<(), ControlError>) {
        if let Err(e) = result {
            warn!(op = e.op(), error = %e, "control apply failed; continuing");
            summary.apply_errors += 1;
        }
    }
}
