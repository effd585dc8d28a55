//! Sysfs-backed control layer.
//!
//! Drives the kernel's own bridge implementation through the scalar files
//! under `/sys/class/net/<bridge>/bridge/` and `/sys/class/net/<port>/brport/`.
//! Operations only a user-space protocol engine can express (protocol
//! version, admin edge, MSTIs beyond the CIST) report
//! [`ControlError::Unsupported`]; the reconciliation engine logs those and
//! moves on, which is exactly the best-effort contract.
//!
//! Kernel timer scalars are in centiseconds; the conversions happen here so
//! the rest of the crate deals in plain seconds.

use std::ffi::CString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ControlError;

use super::{
    BridgeId, CistBridgeDelta, CistBridgeStatus, CistPortDelta, CistPortStatus, ControlLayer,
    PortState, ProtocolVersion,
};

const SYSFS_CLASS_NET: &str = "/sys/class/net";

/// Centiseconds per second in kernel bridge timer files.
const USER_HZ: u64 = 100;

pub struct SysfsControl {
    net_root: PathBuf,
}

impl SysfsControl {
    pub fn new() -> Self {
        Self {
            net_root: PathBuf::from(SYSFS_CLASS_NET),
        }
    }

    /// Overrides the sysfs root; tests point this at a temp directory.
    pub fn with_root(net_root: PathBuf) -> Self {
        Self { net_root }
    }

    fn bridge_attr(&self, bridge: &str, name: &str) -> PathBuf {
        self.net_root.join(bridge).join("bridge").join(name)
    }

    fn port_attr(&self, port: &str, name: &str) -> PathBuf {
        self.net_root.join(port).join("brport").join(name)
    }

    /// Reverse lookup: interface name for a kernel index, by scanning the
    /// per-interface `ifindex` files. The port-facing trait operations take
    /// indexes; sysfs wants names.
    fn name_of(&self, ifindex: u32) -> Option<String> {
        let entries = fs::read_dir(&self.net_root).ok()?;
        for entry in entries.flatten() {
            let path = entry.path().join("ifindex");
            if let Some(ix) = read_u64(&path) {
                if ix == u64::from(ifindex) {
                    return entry.file_name().into_string().ok();
                }
            }
        }
        None
    }

    fn bridge_name(&self, ifindex: u32, op: &'static str) -> Result<String, ControlError> {
        self.name_of(ifindex).ok_or(ControlError::Io {
            op,
            source: io::Error::new(io::ErrorKind::NotFound, "no interface for index"),
        })
    }

    fn write_attr(&self, path: &Path, value: &str, op: &'static str) -> Result<(), ControlError> {
        fs::write(path, value).map_err(|source| ControlError::Io { op, source })
    }
}

impl Default for SysfsControl {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlLayer for SysfsControl {
    fn ifindex(&self, name: &str) -> Option<u32> {
        // Reject names a sysfs path cannot represent.
        if name.is_empty() || name.contains('/') || name.contains('\0') {
            return None;
        }
        let Ok(cname) = CString::new(name) else {
            return None;
        };
        match unsafe { libc::if_nametoindex(cname.as_ptr()) } {
            0 => {
                // Fall back to sysfs for overridden roots (tests, containers).
                read_u64(&self.net_root.join(name).join("ifindex")).map(|ix| ix as u32)
            }
            ix => Some(ix),
        }
    }

    fn add_bridge(&self, bridge: u32, ports: &[u32]) -> Result<(), ControlError> {
        // The kernel bridge already knows its members; nothing to announce.
        debug!(bridge, port_count = ports.len(), "bridge membership noted");
        Ok(())
    }

    fn enable_stp(&self, bridge_name: &str, on: bool) -> Result<(), ControlError> {
        self.write_attr(
            &self.bridge_attr(bridge_name, "stp_state"),
            if on { "1" } else { "0" },
            "enable_stp",
        )
    }

    fn force_protocol_version(
        &self,
        _bridge: u32,
        _version: ProtocolVersion,
    ) -> Result<(), ControlError> {
        Err(ControlError::Unsupported("force_protocol_version"))
    }

    fn set_cist_bridge(&self, bridge: u32, delta: &CistBridgeDelta) -> Result<(), ControlError> {
        let name = self.bridge_name(bridge, "set_cist_bridge")?;
        if let Some(fd) = delta.forward_delay {
            self.write_attr(
                &self.bridge_attr(&name, "forward_delay"),
                &(u64::from(fd) * USER_HZ).to_string(),
                "set_cist_bridge.forward_delay",
            )?;
        }
        if let Some(ht) = delta.hello_time {
            self.write_attr(
                &self.bridge_attr(&name, "hello_time"),
                &(u64::from(ht) * USER_HZ).to_string(),
                "set_cist_bridge.hello_time",
            )?;
        }
        if let Some(ma) = delta.max_age {
            self.write_attr(
                &self.bridge_attr(&name, "max_age"),
                &(u64::from(ma) * USER_HZ).to_string(),
                "set_cist_bridge.max_age",
            )?;
        }
        Ok(())
    }

    fn set_msti_priority(
        &self,
        bridge: u32,
        mstid: u16,
        priority: u8,
    ) -> Result<(), ControlError> {
        if mstid != 0 {
            return Err(ControlError::Unsupported("set_msti_priority"));
        }
        let name = self.bridge_name(bridge, "set_msti_priority")?;
        // The config scalar is the high byte of the 16-bit bridge priority.
        self.write_attr(
            &self.bridge_attr(&name, "priority"),
            &(u32::from(priority) << 8).to_string(),
            "set_msti_priority",
        )
    }

    fn set_cist_port(
        &self,
        _bridge: u32,
        port: u32,
        delta: &CistPortDelta,
    ) -> Result<(), ControlError> {
        if delta.admin_edge.is_some() {
            return Err(ControlError::Unsupported("set_cist_port.admin_edge"));
        }
        if let Some(cost) = delta.admin_external_cost {
            let name = self.bridge_name(port, "set_cist_port")?;
            self.write_attr(
                &self.port_attr(&name, "path_cost"),
                &cost.to_string(),
                "set_cist_port.path_cost",
            )?;
        }
        Ok(())
    }

    fn cist_bridge_status(&self, bridge: u32) -> Result<CistBridgeStatus, ControlError> {
        const OP: &str = "cist_bridge_status";
        let name = self.bridge_name(bridge, OP)?;
        let attr = |n: &str| self.bridge_attr(&name, n);

        Ok(CistBridgeStatus {
            bridge_id: read_bridge_id(&attr("bridge_id")).unwrap_or_default(),
            designated_root: read_bridge_id(&attr("root_id")).unwrap_or_default(),
            root_path_cost: read_u64(&attr("root_path_cost")).unwrap_or(0) as u32,
            root_port_id: read_u64(&attr("root_port")).unwrap_or(0) as u16,
            root_port_name: None,
            max_age: centisecs_to_secs(read_u64(&attr("max_age"))),
            hello_time: centisecs_to_secs(read_u64(&attr("hello_time"))),
            forward_delay: centisecs_to_secs(read_u64(&attr("forward_delay"))),
            // Not exposed by the kernel; the 802.1D default.
            tx_hold_count: 6,
            topology_change_count: read_u64(&attr("topology_change")).unwrap_or(0) as u32,
            time_since_topology_change: read_u64(&attr("topology_change_timer")).unwrap_or(0)
                as u32,
        })
    }

    fn cist_port_status(&self, _bridge: u32, port: u32) -> Result<CistPortStatus, ControlError> {
        const OP: &str = "cist_port_status";
        let name = self.bridge_name(port, OP)?;
        let attr = |n: &str| self.port_attr(&name, n);

        let state = match read_u64(&attr("state")).unwrap_or(0) {
            1 => PortState::Listening,
            2 => PortState::Learning,
            3 => PortState::Forwarding,
            4 => PortState::Blocking,
            _ => PortState::Disabled,
        };
        Ok(CistPortStatus {
            state,
            port_id: read_hex_u16(&attr("port_id")).unwrap_or(0),
            external_cost: read_u64(&attr("path_cost")).unwrap_or(0) as u32,
            designated_external_cost: read_u64(&attr("designated_cost")).unwrap_or(0) as u32,
            // Kernel STP has no edge-port notion.
            oper_edge: false,
            designated_bridge: read_bridge_id(&attr("designated_bridge")).unwrap_or_default(),
            designated_root: read_bridge_id(&attr("designated_root")).unwrap_or_default(),
        })
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn read_u64(path: &Path) -> Option<u64> {
    read_trimmed(path)?.parse().ok()
}

fn read_hex_u16(path: &Path) -> Option<u16> {
    let text = read_trimmed(path)?;
    u16::from_str_radix(text.trim_start_matches("0x"), 16).ok()
}

fn centisecs_to_secs(value: Option<u64>) -> u8 {
    value.map_or(0, |v| (v / USER_HZ).min(255) as u8)
}

/// Parses the kernel's `XXXX.aabbccddeeff` bridge-identifier format.
fn read_bridge_id(path: &Path) -> Option<BridgeId> {
    let text = read_trimmed(path)?;
    let (prio, mac) = text.split_once('.')?;
    let priority = u16::from_str_radix(prio, 16).ok()?;
    if mac.len() != 12 {
        return None;
    }
    let mut out = [0u8; 6];
    for (i, chunk) in out.iter_mut().enumerate() {
        *chunk = u8::from_str_radix(&mac[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(BridgeId { priority, mac: out })
}
