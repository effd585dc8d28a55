//! Status-directory tree: one directory per bridge instance, one scalar
//! value per file, one subdirectory per enabled member port.
//!
//! Creation is idempotent; deletion is an explicit tree walk that collects a
//! structured error per entry instead of stopping at the first failure, so
//! shutdown can always report what it could not remove and still proceed.

use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Filesystem layout of one instance's status tree.
#[derive(Debug, Clone)]
pub struct StatusTree {
    root: PathBuf,
    instance: u32,
}

impl StatusTree {
    pub fn new(root: PathBuf, instance: u32) -> Self {
        Self { root, instance }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn instance_dir(&self) -> PathBuf {
        self.root.join(self.instance.to_string())
    }

    fn port_dir(&self, port: &str) -> PathBuf {
        self.instance_dir().join(port)
    }

    /// Creates the root, the instance directory, and one directory per
    /// port. Already-existing directories are fine; failures are logged and
    /// the rest of the tree is still attempted.
    pub fn ensure<'a>(&self, ports: impl Iterator<Item = &'a str>) {
        let mkdir = |path: PathBuf| {
            if let Err(e) = fs::create_dir_all(&path) {
                warn!(path = %path.display(), error = %e, "cannot create status directory");
            }
        };
        mkdir(self.instance_dir());
        for port in ports {
            mkdir(self.port_dir(port));
        }
    }

    /// Writes one bridge-level scalar, one value per file.
    pub fn write_value(&self, name: &str, value: impl Display) -> io::Result<()> {
        write_scalar(&self.instance_dir().join(name), value)
    }

    /// Writes one per-port scalar.
    pub fn write_port_value(
        &self,
        port: &str,
        name: &str,
        value: impl Display,
    ) -> io::Result<()> {
        write_scalar(&self.port_dir(port).join(name), value)
    }

    /// Deletes the whole tree, best-effort. Returns every entry that could
    /// not be removed along with its error; an empty vec means a clean
    /// removal. A tree that is already gone is clean.
    pub fn remove_all(&self) -> Vec<(PathBuf, io::Error)> {
        let mut failed = Vec::new();
        if self.root.exists() {
            remove_dir_recursive(&self.root, &mut failed);
        }
        failed
    }
}

fn write_scalar(path: &Path, value: impl Display) -> io::Result<()> {
    fs::write(path, format!("{value}\n"))
}

fn remove_dir_recursive(dir: &Path, failed: &mut Vec<(PathBuf, io::Error)>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            failed.push((dir.to_path_buf(), e));
            return;
        }
    };
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                failed.push((dir.to_path_buf(), e));
                continue;
            }
        };
        if path.is_dir() {
            remove_dir_recursive(&path, failed);
        } else if let Err(e) = fs::remove_file(&path) {
            failed.push((path, e));
        }
    }
    if let Err(e) = fs::remove_dir(dir) {
        failed.push((dir.to_path_buf(), e));
    }
}
