//! # In-memory configuration snapshot.
//!
//! A [`ConfigSnapshot`] is the canonical form of one successfully parsed
//! configuration document: clamped bridge scalars, a fixed-size per-ifindex
//! port table, and the resolved member list. Every reload builds a fresh
//! zeroed snapshot and swaps it in wholesale only when the attempt succeeds,
//! so stale slots from removed interfaces cannot survive a reload and a
//! failed reload leaves the previous snapshot untouched.

use crate::config::schema::{ConfigDoc, PortSection};

/// Size of the per-ifindex port table.
pub const MAX_PORTS: usize = 64;

/// Bridge-wide scalars, each clamped to `[0, 255]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    pub priority: u8,
    pub forward_delay: u8,
    pub hello_time: u8,
    pub max_age: u8,
}

impl BridgeConfig {
    pub(crate) fn from_doc(doc: &ConfigDoc) -> Self {
        Self {
            priority: clamp_scalar(doc.prio),
            forward_delay: clamp_scalar(doc.forward_delay),
            hello_time: clamp_scalar(doc.hello_time),
            max_age: clamp_scalar(doc.max_age),
        }
    }
}

/// Per-port settings, indexed by kernel interface index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortConfig {
    pub enable: bool,
    pub admin_edge: bool,
    pub path_cost: u32,
}

impl PortConfig {
    pub(crate) fn from_section(section: &PortSection) -> Self {
        Self {
            enable: section.enable,
            admin_edge: section.admin_edge,
            path_cost: section.path_cost.clamp(0, i64::from(u32::MAX)) as u32,
        }
    }
}

/// A resolved member port: config name plus its kernel interface index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMember {
    pub name: String,
    pub ifindex: u32,
}

/// Canonical snapshot of one configuration document.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub bridge: BridgeConfig,
    pub ports: [PortConfig; MAX_PORTS],
    /// Resolution order of the members, for deterministic applies and for
    /// status publication (the table alone has no names).
    pub members: Vec<PortMember>,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            ports: [PortConfig::default(); MAX_PORTS],
            members: Vec::new(),
        }
    }
}

impl ConfigSnapshot {
    /// The slot for a resolved member.
    pub fn port(&self, ifindex: u32) -> &PortConfig {
        &self.ports[ifindex as usize]
    }

    /// Members whose slot is enabled, in resolution order.
    pub fn enabled_members(&self) -> impl Iterator<Item = &PortMember> {
        self.members
            .iter()
            .filter(|m| self.ports[m.ifindex as usize].enable)
    }
}

fn clamp_scalar(value: i64) -> u8 {
    value.clamp(0, 255) as u8
}
