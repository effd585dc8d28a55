//! Sysfs status LED.
//!
//! The green spanning-tree LED lives under `/sys/class/leds/<family>:green:rstp`,
//! where the product family comes from a signature file. Boxes without the
//! signature file simply have no indicator; every write is best-effort.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

const FAMILY_FILE: &str = "/boot/signature/family";
const LEDS_ROOT: &str = "/sys/class/leds";

/// Blink half-period when this bridge is not the root.
const BLINK_MS: u32 = 1000;

#[derive(Debug, Clone, Default)]
pub struct StatusLed {
    dir: Option<PathBuf>,
}

impl StatusLed {
    /// Discovers the LED from the product signature at the well-known paths.
    pub fn discover() -> Self {
        Self::discover_at(Path::new(FAMILY_FILE), Path::new(LEDS_ROOT))
    }

    /// Discovery with injectable roots.
    pub fn discover_at(family_file: &Path, leds_root: &Path) -> Self {
        let Ok(family) = fs::read_to_string(family_file) else {
            debug!("no product family signature; status LED disabled");
            return Self { dir: None };
        };
        let family = family.trim().to_lowercase();
        if family.is_empty() {
            return Self { dir: None };
        }
        let dir = leds_root.join(format!("{family}:green:rstp"));
        debug!(led = %dir.display(), "status LED discovered");
        Self { dir: Some(dir) }
    }

    /// An LED at an explicit directory (tests).
    pub fn at(dir: PathBuf) -> Self {
        Self { dir: Some(dir) }
    }

    /// No-op indicator.
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Root bridge: solid green. Otherwise: slow blink.
    pub fn set_root(&self, is_root: bool) {
        if is_root {
            self.solid();
        } else {
            self.blink();
        }
    }

    /// Turns the LED off; used on shutdown.
    pub fn off(&self) {
        let Some(dir) = &self.dir else { return };
        if write(dir, "brightness", "0").is_err() {
            warn!(led = %dir.display(), "error setting LED status");
        }
    }

    fn solid(&self) {
        let Some(dir) = &self.dir else { return };
        if write(dir, "brightness", "1").is_err() {
            warn!(led = %dir.display(), "error setting LED status");
        }
    }

    fn blink(&self) {
        let Some(dir) = &self.dir else { return };
        let r = write(dir, "trigger", "timer")
            .and_then(|()| write(dir, "delay_on", &BLINK_MS.to_string()))
            .and_then(|()| write(dir, "delay_off", &BLINK_MS.to_string()));
        if r.is_err() {
            warn!(led = %dir.display(), "error setting LED status");
        }
    }
}

fn write(dir: &Path, attr: &str, value: &str) -> std::io::Result<()> {
    fs::write(dir.join(attr), value)
}
