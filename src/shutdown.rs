//! # Shutdown orchestrator.
//!
//! Terminate/Interrupt/Quit all end here: remove the pid marker, tear down
//! the status tree, switch the indicator off, exit successfully. Every step
//! is attempted independently — a file that will not delete is reported and
//! skipped, and the process exits either way. The cleanup phase is separate
//! from the exit so it can be exercised in tests.

use tracing::{info, warn};

use crate::daemon::InstancePaths;
use crate::indicator::StatusLed;
use crate::status::StatusTree;

/// What cleanup could not remove.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub failed: Vec<(std::path::PathBuf, std::io::Error)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ShutdownOrchestrator {
    paths: InstancePaths,
    tree: StatusTree,
    led: StatusLed,
}

impl ShutdownOrchestrator {
    pub fn new(paths: InstancePaths, tree: StatusTree, led: StatusLed) -> Self {
        Self { paths, tree, led }
    }

    /// Best-effort cleanup: pid file, status tree, indicator.
    pub fn cleanup(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        if let Err(e) = self.paths.remove_pid() {
            if e.kind() != std::io::ErrorKind::NotFound {
                report.failed.push((self.paths.pid_file.clone(), e));
            }
        }

        report.failed.extend(self.tree.remove_all());

        self.led.off();
        report
    }

    /// Cleanup, report, exit. Never returns.
    pub fn terminate(&self) -> ! {
        let report = self.cleanup();
        for (path, error) in &report.failed {
            warn!(path = %path.display(), %error, "could not remove during shutdown");
        }
        info!("terminating");
        std::process::exit(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(dir: &std::path::Path) -> ShutdownOrchestrator {
        let mut paths = InstancePaths::for_instance(0);
        paths.pid_file = dir.join("test.pid");
        paths.status_root = dir.join("status");
        paths.status_text = dir.join("status/test.status");
        let tree = StatusTree::new(paths.status_root.clone(), 0);
        ShutdownOrchestrator::new(paths, tree, StatusLed::disabled())
    }

    #[test]
    fn test_cleanup_removes_pid_and_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let shutdown = fixture(tmp.path());
        std::fs::write(tmp.path().join("test.pid"), "1\n").unwrap();
        std::fs::create_dir_all(tmp.path().join("status/0/eth0")).unwrap();
        std::fs::write(tmp.path().join("status/0/max_age"), "20\n").unwrap();

        let report = shutdown.cleanup();
        assert!(report.is_clean(), "unexpected failures: {:?}", report.failed);
        assert!(!tmp.path().join("test.pid").exists());
        assert!(!tmp.path().join("status").exists());
    }

    #[test]
    fn test_cleanup_with_nothing_to_remove_is_clean() {
        let tmp = tempfile::tempdir().unwrap();
        let shutdown = fixture(tmp.path());
        assert!(shutdown.cleanup().is_clean());
    }
}
