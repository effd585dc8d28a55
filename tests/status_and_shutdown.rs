//! Status publication and shutdown-cleanup scenarios.

mod common;

use std::fs;
use std::path::Path;
use std::rc::Rc;

use bridgevisor::indicator::StatusLed;
use bridgevisor::{
    ConfigSnapshot, InstancePaths, ShutdownOrchestrator, StatusPublisher, StatusTree,
};
use bridgevisor::config::{PortConfig, PortMember};

use common::FakeControl;

struct Fixture {
    _tmp: tempfile::TempDir,
    paths: InstancePaths,
    tree: StatusTree,
    publisher: StatusPublisher,
}

fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let mut paths = InstancePaths::for_instance(0);
    paths.config_file = tmp.path().join("bridgevisor-0.conf");
    paths.status_root = tmp.path().join("status");
    paths.pid_file = tmp.path().join("bridgevisor.pid");
    paths.status_text = tmp.path().join("status/bridgevisor.status");

    let control = Rc::new(FakeControl::new(&[("br0", 1), ("eth0", 2)]));
    let tree = StatusTree::new(paths.status_root.clone(), 0);
    let publisher = StatusPublisher::new(
        control,
        tree.clone(),
        paths.clone(),
        "br0".to_string(),
        StatusLed::disabled(),
    );
    Fixture {
        _tmp: tmp,
        paths,
        tree,
        publisher,
    }
}

fn snapshot_with_eth0() -> ConfigSnapshot {
    let mut snap = ConfigSnapshot::default();
    snap.ports[2] = PortConfig {
        enable: true,
        admin_edge: false,
        path_cost: 10,
    };
    snap.members = vec![PortMember {
        name: "eth0".to_string(),
        ifindex: 2,
    }];
    snap
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_refresh_writes_bridge_and_port_scalars() {
    let fx = fixture();
    let snap = snapshot_with_eth0();
    fx.tree.ensure(["eth0"].into_iter());

    fx.publisher.refresh(&snap);

    let instance = fx.tree.instance_dir();
    assert_eq!(read(&instance.join("max_age")), "20\n");
    assert_eq!(read(&instance.join("hello_time")), "2\n");
    assert_eq!(read(&instance.join("forward_delay")), "15\n");
    assert_eq!(read(&instance.join("root_port")), "0\n");
    assert_eq!(read(&instance.join("no_topology_change")), "3\n");
    assert_eq!(
        read(&instance.join("bridge_mac_adr")),
        "02:00:00:00:00:01\n"
    );
    assert_eq!(read(&instance.join("eth0/state")), "3\n");
    assert_eq!(read(&instance.join("eth0/path_cost")), "6\n");
    assert_eq!(
        read(&instance.join("eth0/designated_bridge_mac_adr")),
        "02:00:00:00:00:01\n"
    );
}

#[test]
fn test_status_text_is_rendered_and_swapped_into_place() {
    let fx = fixture();
    fx.tree.ensure(["eth0"].into_iter());
    fx.paths.write_pid().unwrap();

    fx.publisher.write_status_text(&snapshot_with_eth0(), false);

    let text = read(&fx.paths.status_text);
    assert!(text.contains("STP Enabled               : Yes, running as PID"));
    assert!(text.contains("Force Version             : RSTP"));
    assert!(text.contains("Designated Root Port      : This switch is root"));
    assert!(text.contains("eth0"));
    assert!(text.contains("FORWARDING"));
    // The scratch file does not survive the rename.
    assert!(!fx.paths.status_text_tmp().exists());
}

#[test]
fn test_publish_produces_both_outputs() {
    let fx = fixture();
    fx.tree.ensure(["eth0"].into_iter());

    fx.publisher.publish(&snapshot_with_eth0(), false);

    assert!(fx.paths.status_text.exists());
    assert!(fx.tree.instance_dir().join("root_path_cost").exists());
}

#[test]
fn test_cleanup_continues_past_a_failing_entry() {
    let tmp = tempfile::tempdir().unwrap();
    let mut paths = InstancePaths::for_instance(0);
    paths.pid_file = tmp.path().join("bridgevisor.pid");
    // The status root is a plain file: the tree walk cannot descend into it
    // and must report that instead of panicking or stopping early.
    paths.status_root = tmp.path().join("status");
    fs::write(&paths.status_root, "not a directory").unwrap();
    fs::write(&paths.pid_file, "1234\n").unwrap();

    let tree = StatusTree::new(paths.status_root.clone(), 0);
    let shutdown = ShutdownOrchestrator::new(paths.clone(), tree, StatusLed::disabled());

    let report = shutdown.cleanup();
    assert!(!report.is_clean());
    // The pid file was still removed despite the tree failure.
    assert!(!paths.pid_file.exists());
}

#[test]
fn test_cleanup_removes_a_populated_tree() {
    let fx = fixture();
    fx.tree.ensure(["eth0"].into_iter());
    fx.publisher.publish(&snapshot_with_eth0(), false);
    fx.paths.write_pid().unwrap();

    let shutdown = ShutdownOrchestrator::new(
        fx.paths.clone(),
        fx.tree.clone(),
        StatusLed::disabled(),
    );
    let report = shutdown.cleanup();
    assert!(report.is_clean(), "failures: {:?}", report.failed);
    assert!(!fx.paths.status_root.exists());
    assert!(!fx.paths.pid_file.exists());
}
