//! Configuration document schema.
//!
//! One TOML document per bridge instance. Bridge-wide scalars sit at the top
//! level; each member port is a `[ports.<ifname>]` table. Missing fields take
//! the documented defaults, so an empty document is valid.
//!
//! ```toml
//! name = "br0"
//! prio = 0
//! forward-delay = 15
//! hello-time = 2
//! max-age = 0
//!
//! [ports.eth0]
//! enable = true
//! admin-edge = false
//! path-cost = 10
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Parsed configuration document, before clamping and resolution.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigDoc {
    /// Optional display name for the instance.
    #[serde(default)]
    pub name: Option<String>,

    /// Bridge priority, clamped to [0, 255] downstream.
    #[serde(default)]
    pub prio: i64,

    #[serde(default = "default_forward_delay")]
    pub forward_delay: i64,

    #[serde(default = "default_hello_time")]
    pub hello_time: i64,

    #[serde(default)]
    pub max_age: i64,

    /// Member ports keyed by interface name. `BTreeMap` keeps the apply
    /// order deterministic across reloads.
    #[serde(default)]
    pub ports: BTreeMap<String, PortSection>,
}

/// One `[ports.<ifname>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortSection {
    #[serde(default = "default_true")]
    pub enable: bool,

    #[serde(default)]
    pub admin_edge: bool,

    #[serde(default)]
    pub path_cost: i64,
}

fn default_forward_delay() -> i64 {
    15
}

fn default_hello_time() -> i64 {
    2
}

fn default_true() -> bool {
    true
}

impl ConfigDoc {
    /// Reads and parses the document at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_takes_defaults() {
        let doc: ConfigDoc = toml::from_str("").unwrap();
        assert_eq!(doc.prio, 0);
        assert_eq!(doc.forward_delay, 15);
        assert_eq!(doc.hello_time, 2);
        assert_eq!(doc.max_age, 0);
        assert!(doc.ports.is_empty());
    }

    #[test]
    fn test_port_section_defaults() {
        let doc: ConfigDoc = toml::from_str("[ports.eth0]\n").unwrap();
        let port = &doc.ports["eth0"];
        assert!(port.enable);
        assert!(!port.admin_edge);
        assert_eq!(port.path_cost, 0);
    }

    #[test]
    fn test_kebab_case_keys() {
        let doc: ConfigDoc = toml::from_str(
            r#"
            forward-delay = 20
            hello-time = 3
            max-age = 40

            [ports.eth1]
            admin-edge = true
            path-cost = 200000
            enable = false
            "#,
        )
        .unwrap();
        assert_eq!(doc.forward_delay, 20);
        assert_eq!(doc.hello_time, 3);
        assert_eq!(doc.max_age, 40);
        let port = &doc.ports["eth1"];
        assert!(port.admin_edge);
        assert!(!port.enable);
        assert_eq!(port.path_cost, 200_000);
    }

    #[test]
    fn test_load_missing_file_is_a_read_error() {
        let err = ConfigDoc::load(Path::new("/nonexistent/bridgevisor-9.conf")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.conf");
        std::fs::write(&path, "ports = notatable {").unwrap();
        let err = ConfigDoc::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
