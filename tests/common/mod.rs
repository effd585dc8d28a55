//! Shared test fixtures: a recording control layer and pipe helpers.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::os::fd::{FromRawFd, OwnedFd, RawFd};

use bridgevisor::control::{
    BridgeId, CistBridgeDelta, CistBridgeStatus, CistPortDelta, CistPortStatus, ControlLayer,
    PortState, ProtocolVersion,
};
use bridgevisor::ControlError;

/// Control layer that records every apply into an inspectable state map.
pub struct FakeControl {
    ifindexes: RefCell<HashMap<String, u32>>,
    /// Applied state: setting key → last written value.
    state: RefCell<BTreeMap<String, String>>,
    /// Chronological operation log.
    ops: RefCell<Vec<String>>,
    /// Operations forced to fail.
    fail_ops: RefCell<HashSet<&'static str>>,
}

impl FakeControl {
    pub fn new(ifindexes: &[(&str, u32)]) -> Self {
        Self {
            ifindexes: RefCell::new(
                ifindexes
                    .iter()
                    .map(|(name, ix)| (name.to_string(), *ix))
                    .collect(),
            ),
            state: RefCell::new(BTreeMap::new()),
            ops: RefCell::new(Vec::new()),
            fail_ops: RefCell::new(HashSet::new()),
        }
    }

    pub fn remove_interface(&self, name: &str) {
        self.ifindexes.borrow_mut().remove(name);
    }

    pub fn fail_op(&self, op: &'static str) {
        self.fail_ops.borrow_mut().insert(op);
    }

    pub fn state_snapshot(&self) -> BTreeMap<String, String> {
        self.state.borrow().clone()
    }

    pub fn state_value(&self, key: &str) -> Option<String> {
        self.state.borrow().get(key).cloned()
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.borrow().clone()
    }

    pub fn clear_log(&self) {
        self.ops.borrow_mut().clear();
    }

    fn record(&self, op: &'static str, key: String, value: String) -> Result<(), ControlError> {
        self.ops.borrow_mut().push(format!("{op} {key}={value}"));
        if self.fail_ops.borrow().contains(op) {
            return Err(ControlError::Io {
                op,
                source: io::Error::new(io::ErrorKind::Other, "injected failure"),
            });
        }
        self.state.borrow_mut().insert(key, value);
        Ok(())
    }
}

impl ControlLayer for FakeControl {
    fn ifindex(&self, name: &str) -> Option<u32> {
        self.ifindexes.borrow().get(name).copied()
    }

    fn add_bridge(&self, bridge: u32, ports: &[u32]) -> Result<(), ControlError> {
        self.record("add_bridge", format!("bridge.{bridge}.members"), format!("{ports:?}"))
    }

    fn enable_stp(&self, bridge_name: &str, on: bool) -> Result<(), ControlError> {
        self.record("enable_stp", format!("stp.{bridge_name}"), on.to_string())
    }

    fn force_protocol_version(
        &self,
        bridge: u32,
        version: ProtocolVersion,
    ) -> Result<(), ControlError> {
        self.record(
            "force_protocol_version",
            format!("bridge.{bridge}.protocol"),
            format!("{version:?}"),
        )
    }

    fn set_cist_bridge(&self, bridge: u32, delta: &CistBridgeDelta) -> Result<(), ControlError> {
        if let Some(v) = delta.forward_delay {
            self.record(
                "set_cist_bridge",
                format!("bridge.{bridge}.forward_delay"),
                v.to_string(),
            )?;
        }
        if let Some(v) = delta.hello_time {
            self.record(
                "set_cist_bridge",
                format!("bridge.{bridge}.hello_time"),
                v.to_string(),
            )?;
        }
        if let Some(v) = delta.max_age {
            self.record(
                "set_cist_bridge",
                format!("bridge.{bridge}.max_age"),
                v.to_string(),
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
        self.record(
            "set_msti_priority",
            format!("bridge.{bridge}.msti.{mstid}.priority"),
            priority.to_string(),
        )
    }

    fn set_cist_port(
        &self,
        bridge: u32,
        port: u32,
        delta: &CistPortDelta,
    ) -> Result<(), ControlError> {
        if let Some(v) = delta.admin_edge {
            self.record(
                "set_cist_port",
                format!("bridge.{bridge}.port.{port}.admin_edge"),
                v.to_string(),
            )?;
        }
        if let Some(v) = delta.admin_external_cost {
            self.record(
                "set_cist_port",
                format!("bridge.{bridge}.port.{port}.path_cost"),
                v.to_string(),
            )?;
        }
        Ok(())
    }

    fn cist_bridge_status(&self, _bridge: u32) -> Result<CistBridgeStatus, ControlError> {
        Ok(CistBridgeStatus {
            bridge_id: BridgeId {
                priority: 0x8000,
                mac: [0x02, 0, 0, 0, 0, 0x01],
            },
            designated_root: BridgeId {
                priority: 0x8000,
                mac: [0x02, 0, 0, 0, 0, 0x01],
            },
            root_path_cost: 0,
            root_port_id: 0,
            root_port_name: None,
            max_age: 20,
            hello_time: 2,
            forward_delay: 15,
            tx_hold_count: 6,
            topology_change_count: 3,
            time_since_topology_change: 42,
        })
    }

    fn cist_port_status(&self, _bridge: u32, port: u32) -> Result<CistPortStatus, ControlError> {
        Ok(CistPortStatus {
            state: PortState::Forwarding,
            port_id: 0x8000 | (port as u16),
            external_cost: 4 + port,
            designated_external_cost: 0,
            oper_edge: false,
            designated_bridge: BridgeId {
                priority: 0x8000,
                mac: [0x02, 0, 0, 0, 0, 0x01],
            },
            designated_root: BridgeId {
                priority: 0x8000,
                mac: [0x02, 0, 0, 0, 0, 0x01],
            },
        })
    }
}

/// Unix pipe as a source of real pollable descriptors.
pub fn pipe() -> (OwnedFd, OwnedFd) {
    let mut fds = [0 as RawFd; 2];
    assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
    unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
}

/// Makes the read end of a pipe readable.
pub fn poke(fd: RawFd) {
    let byte = [0u8; 1];
    assert_eq!(unsafe { libc::write(fd, byte.as_ptr().cast(), 1) }, 1);
}
