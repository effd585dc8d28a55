//! # Control-layer interface to the spanning-tree engine and the kernel.
//!
//! Everything the daemon core needs from the world below it goes through
//! [`ControlLayer`]: interface-name resolution, bridge/port configuration
//! primitives, and status queries. The trait is deliberately thin — this
//! crate calls these operations, it does not implement their protocol
//! semantics. A sysfs-backed implementation for the binary lives in
//! [`sysfs`]; tests substitute a recording fake.
//!
//! Where the underlying interface takes a "set this field" flag next to each
//! value, the deltas here use `Option` fields instead: `None` means leave
//! the setting alone.

mod sysfs;

pub use sysfs::SysfsControl;

use crate::error::ControlError;

/// Spanning-tree protocol variant forced onto the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    Stp,
    Rstp,
    Mstp,
}

/// 8-octet bridge identifier: 2-octet priority, 6-octet MAC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeId {
    pub priority: u16,
    pub mac: [u8; 6],
}

impl BridgeId {
    /// Formats the MAC the way status consumers expect.
    pub fn mac_string(&self) -> String {
        let m = self.mac;
        format!(
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

/// Partial update of CIST bridge scalars.
#[derive(Debug, Clone, Copy, Default)]
pub struct CistBridgeDelta {
    pub forward_delay: Option<u8>,
    pub hello_time: Option<u8>,
    pub max_age: Option<u8>,
}

/// Partial update of CIST per-port scalars.
#[derive(Debug, Clone, Copy, Default)]
pub struct CistPortDelta {
    pub admin_edge: Option<bool>,
    pub admin_external_cost: Option<u32>,
}

/// Port forwarding state as reported by the protocol engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    Disabled,
    Listening,
    Learning,
    Forwarding,
    Blocking,
}

impl PortState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortState::Disabled => "DISABLED",
            PortState::Listening => "LISTENING",
            PortState::Learning => "LEARNING",
            PortState::Forwarding => "FORWARDING",
            PortState::Blocking => "BLOCKING",
        }
    }
}

/// CIST status of the bridge as a whole.
#[derive(Debug, Clone, Default)]
pub struct CistBridgeStatus {
    pub bridge_id: BridgeId,
    pub designated_root: BridgeId,
    pub root_path_cost: u32,
    /// Port identifier of the root port; 0 when this bridge is the root.
    pub root_port_id: u16,
    pub root_port_name: Option<String>,
    pub max_age: u8,
    pub hello_time: u8,
    pub forward_delay: u8,
    pub tx_hold_count: u8,
    pub topology_change_count: u32,
    pub time_since_topology_change: u32,
}

/// CIST status of one member port.
#[derive(Debug, Clone)]
pub struct CistPortStatus {
    pub state: PortState,
    pub port_id: u16,
    pub external_cost: u32,
    pub designated_external_cost: u32,
    pub oper_edge: bool,
    pub designated_bridge: BridgeId,
    pub designated_root: BridgeId,
}

/// Extracts the 12-bit port number from a port identifier.
pub fn port_number(port_id: u16) -> u16 {
    port_id & 0x0fff
}

/// Operations the daemon core needs from the bridge control plane.
pub trait ControlLayer {
    /// Kernel interface index for `name`, or `None` if it does not exist.
    fn ifindex(&self, name: &str) -> Option<u32>;

    /// Announces the managed bridge and its member set to the engine.
    fn add_bridge(&self, bridge: u32, ports: &[u32]) -> Result<(), ControlError>;

    /// Turns spanning tree on or off on the bridge device.
    fn enable_stp(&self, bridge_name: &str, on: bool) -> Result<(), ControlError>;

    /// Forces the protocol variant the engine runs.
    fn force_protocol_version(
        &self,
        bridge: u32,
        version: ProtocolVersion,
    ) -> Result<(), ControlError>;

    /// Applies bridge-wide CIST scalars.
    fn set_cist_bridge(&self, bridge: u32, delta: &CistBridgeDelta) -> Result<(), ControlError>;

    /// Sets the bridge priority for one spanning-tree instance
    /// (instance 0 is the CIST).
    fn set_msti_priority(&self, bridge: u32, mstid: u16, priority: u8)
        -> Result<(), ControlError>;

    /// Applies per-port CIST scalars.
    fn set_cist_port(
        &self,
        bridge: u32,
        port: u32,
        delta: &CistPortDelta,
    ) -> Result<(), ControlError>;

    /// Current CIST status of the bridge.
    fn cist_bridge_status(&self, bridge: u32) -> Result<CistBridgeStatus, ControlError>;

    /// Current CIST status of one member port.
    fn cist_port_status(&self, bridge: u32, port: u32) -> Result<CistPortStatus, ControlError>;

    /// Coarse periodic tick forwarded from the reactor.
    fn one_second(&self) {}
}
