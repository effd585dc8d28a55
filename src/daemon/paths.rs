//! Well-known filesystem paths, per bridge instance.
//!
//! Defaults match the deployment layout; every path is overridable so tests
//! can point the daemon at a temp directory.

use std::fs;
use std::io;
use std::path::PathBuf;

/// Fixed paths for one daemon instance.
#[derive(Debug, Clone)]
pub struct InstancePaths {
    /// Configuration document, re-read on every reload.
    pub config_file: PathBuf,
    /// Root of the status-directory tree.
    pub status_root: PathBuf,
    /// Pid marker file.
    pub pid_file: PathBuf,
    /// Human-readable status text.
    pub status_text: PathBuf,
}

impl InstancePaths {
    pub fn for_instance(instance: u32) -> Self {
        Self {
            config_file: PathBuf::from(format!("/etc/bridgevisor-{instance}.conf")),
            status_root: PathBuf::from("/var/run/bridgevisor"),
            pid_file: PathBuf::from("/var/run/bridgevisor.pid"),
            status_text: PathBuf::from("/var/run/bridgevisor/bridgevisor.status"),
        }
    }

    /// Scratch sibling the status text is rendered into before the atomic
    /// rename.
    pub fn status_text_tmp(&self) -> PathBuf {
        self.status_text.with_extension("tmp")
    }

    /// Records this process's pid in the marker file.
    pub fn write_pid(&self) -> io::Result<()> {
        fs::write(&self.pid_file, format!("{}\n", std::process::id()))
    }

    /// The recorded pid, if the marker file exists and parses.
    pub fn read_pid(&self) -> Option<u32> {
        fs::read_to_string(&self.pid_file)
            .ok()?
            .trim()
            .parse()
            .ok()
    }

    pub fn remove_pid(&self) -> io::Result<()> {
        fs::remove_file(&self.pid_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_number_selects_the_config_file() {
        let paths = InstancePaths::for_instance(2);
        assert_eq!(paths.config_file, PathBuf::from("/etc/bridgevisor-2.conf"));
    }

    #[test]
    fn test_pid_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = InstancePaths::for_instance(0);
        paths.pid_file = dir.path().join("test.pid");
        paths.write_pid().unwrap();
        assert_eq!(paths.read_pid(), Some(std::process::id()));
        paths.remove_pid().unwrap();
        assert_eq!(paths.read_pid(), None);
    }
}
