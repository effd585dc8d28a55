//! # Status publication.
//!
//! Two outputs, both derived from control-layer status queries against the
//! current snapshot's member list:
//!
//! - the status-directory tree (one scalar per file), refreshed in place;
//! - a human-readable status text, rendered into a scratch file and moved
//!   over the published path with an atomic rename, optionally echoed to
//!   stdout when a display was requested.
//!
//! Publication only ever runs on the reactor thread, between other
//! control-plane work, so readers of the tree never observe a torn write.
//! Every individual write failure is logged and publication continues.

use std::cell::Cell;
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::rc::Rc;

use tracing::{error, warn};

use crate::config::ConfigSnapshot;
use crate::control::{port_number, CistBridgeStatus, ControlLayer};
use crate::daemon::InstancePaths;
use crate::indicator::StatusLed;

use super::tree::StatusTree;

/// Publishes bridge and port status for one instance.
pub struct StatusPublisher {
    control: Rc<dyn ControlLayer>,
    tree: StatusTree,
    paths: InstancePaths,
    bridge: String,
    led: StatusLed,
    last_root_port: Cell<Option<u16>>,
}

impl StatusPublisher {
    pub fn new(
        control: Rc<dyn ControlLayer>,
        tree: StatusTree,
        paths: InstancePaths,
        bridge: String,
        led: StatusLed,
    ) -> Self {
        Self {
            control,
            tree,
            paths,
            bridge,
            led,
            last_root_port: Cell::new(None),
        }
    }

    /// Full publication: status text first (with optional display), then a
    /// live-counter refresh of the tree.
    pub fn publish(&self, snapshot: &ConfigSnapshot, display: bool) {
        self.write_status_text(snapshot, display);
        self.refresh(snapshot);
    }

    /// Refreshes the status tree from live control-layer counters.
    pub fn refresh(&self, snapshot: &ConfigSnapshot) {
        let Some(bridge) = self.resolve_bridge() else {
            return;
        };
        let status = match self.control.cist_bridge_status(bridge) {
            Ok(status) => status,
            Err(e) => {
                error!(bridge = %self.bridge, error = %e, "failed to get bridge status");
                return;
            }
        };

        let root_port = port_number(status.root_port_id);
        if self.last_root_port.get() != Some(root_port) {
            self.led.set_root(root_port == 0);
            self.last_root_port.set(Some(root_port));
        }

        let w = |name: &str, value: String| {
            if let Err(e) = self.tree.write_value(name, &value) {
                warn!(name, error = %e, "failed writing status value");
            }
        };
        w("hello_time", status.hello_time.to_string());
        w("max_age", status.max_age.to_string());
        w("forward_delay", status.forward_delay.to_string());
        w("hold_count", status.tx_hold_count.to_string());
        w("root_path_cost", status.root_path_cost.to_string());
        w("root_port", root_port.to_string());
        w("bridge_id_prio", status.bridge_id.priority.to_string());
        w("bridge_mac_adr", status.bridge_id.mac_string());
        w(
            "designated_root_prio",
            status.designated_root.priority.to_string(),
        );
        w("designated_root_mac_adr", status.designated_root.mac_string());
        w(
            "no_topology_change",
            status.topology_change_count.to_string(),
        );
        w(
            "time_since_topology_change",
            status.time_since_topology_change.to_string(),
        );

        for member in snapshot.enabled_members() {
            let port_status = match self.control.cist_port_status(bridge, member.ifindex) {
                Ok(s) => s,
                Err(e) => {
                    warn!(port = %member.name, error = %e, "failed to get port status");
                    continue;
                }
            };
            let wp = |name: &str, value: String| {
                if let Err(e) = self.tree.write_port_value(&member.name, name, &value) {
                    warn!(port = %member.name, name, error = %e, "failed writing port status");
                }
            };
            wp("state", (port_status.state as u8).to_string());
            wp("priority", (port_status.port_id >> 8).to_string());
            wp("path_cost", port_status.external_cost.to_string());
            wp("oper_edge", u8::from(port_status.oper_edge).to_string());
            wp("port_id", port_number(port_status.port_id).to_string());
            wp(
                "designated_cost",
                port_status.designated_external_cost.to_string(),
            );
            wp(
                "designated_bridge_prio",
                port_status.designated_bridge.priority.to_string(),
            );
            wp(
                "designated_bridge_mac_adr",
                port_status.designated_bridge.mac_string(),
            );
            wp(
                "designated_root_prio",
                port_status.designated_root.priority.to_string(),
            );
            wp(
                "designated_root_mac_adr",
                port_status.designated_root.mac_string(),
            );
        }
    }

    /// Renders the status text and swaps it into place. With `display` the
    /// rendered text also goes to stdout, straight from memory.
    pub fn write_status_text(&self, snapshot: &ConfigSnapshot, display: bool) {
        let Some(bridge) = self.resolve_bridge() else {
            return;
        };
        let status = match self.control.cist_bridge_status(bridge) {
            Ok(status) => status,
            Err(e) => {
                error!(bridge = %self.bridge, error = %e, "failed to get bridge status");
                return;
            }
        };

        let text = self.render(bridge, &status, snapshot);

        let tmp = self.paths.status_text_tmp();
        if let Err(e) = fs::write(&tmp, &text) {
            error!(path = %tmp.display(), error = %e, "cannot write status file");
            return;
        }
        if let Err(e) = fs::rename(&tmp, &self.paths.status_text) {
            error!(path = %self.paths.status_text.display(), error = %e, "cannot publish status file");
            return;
        }
        if display {
            let mut out = std::io::stdout().lock();
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
    }

    fn resolve_bridge(&self) -> Option<u32> {
        let ix = self.control.ifindex(&self.bridge);
        if ix.is_none() {
            error!(bridge = %self.bridge, "cannot find interface index for bridge");
        }
        ix
    }

    fn render(&self, bridge: u32, status: &CistBridgeStatus, snapshot: &ConfigSnapshot) -> String {
        let mut text = String::new();
        match self.paths.read_pid() {
            Some(pid) => {
                let _ = writeln!(text, "STP Enabled               : Yes, running as PID {pid}");
            }
            None => {
                let _ = writeln!(text, "STP Enabled               : No");
            }
        }
        let _ = writeln!(text, "Force Version             : RSTP");
        let _ = writeln!(
            text,
            "Bridge ID MAC Address     : {}",
            status.bridge_id.mac_string()
        );
        let _ = writeln!(
            text,
            "Bridge ID Priority        : {:<3} ({})",
            status.bridge_id.priority >> 12,
            status.bridge_id.priority
        );
        let _ = writeln!(
            text,
            "Bridge Max Age            : {:<3}          Bridge Hello Time : {}",
            status.max_age, status.hello_time
        );
        let _ = writeln!(
            text,
            "Bridge Forward Delay      : {:<3}          Tx Hold Count     : {}",
            status.forward_delay, status.tx_hold_count
        );
        let _ = writeln!(
            text,
            "Topology Change Count     : {}",
            status.topology_change_count
        );
        let _ = writeln!(
            text,
            "Time Since Last Change    : {}",
            status.time_since_topology_change
        );
        let _ = writeln!(
            text,
            "Designated Root           : {}",
            status.designated_root.mac_string()
        );
        let _ = writeln!(
            text,
            "Designated Root Path Cost : {}",
            status.root_path_cost
        );
        let root_port = match &status.root_port_name {
            _ if status.root_path_cost == 0 => "This switch is root".to_string(),
            Some(name) => name.clone(),
            None => port_number(status.root_port_id).to_string(),
        };
        let _ = writeln!(text, "Designated Root Port      : {root_port}");
        let _ = writeln!(
            text,
            "Designated Root Priority  : {}",
            status.designated_root.priority
        );
        let _ = writeln!(
            text,
            "Port     Cost        Priority  State      Edge   Designated Bridge"
        );
        let _ = writeln!(
            text,
            "=================================================================="
        );
        for member in snapshot.enabled_members() {
            let Ok(ps) = self.control.cist_port_status(bridge, member.ifindex) else {
                warn!(port = %member.name, "failed to get port state");
                continue;
            };
            let _ = writeln!(
                text,
                "{:<7}  {:<9}   {:<8}  {:<10} {:<5}  {}",
                member.name,
                ps.external_cost,
                ps.port_id >> 8,
                ps.state.as_str(),
                if ps.oper_edge { "True" } else { "False" },
                ps.designated_bridge.mac_string(),
            );
        }
        text
    }
}
