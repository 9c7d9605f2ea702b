mod common;
use common::*;

use mstp::{Bridge, BridgeConfig, PortRole, CIST};
use pretty_assertions::assert_eq;

fn region_config(last: u8, ports: usize) -> BridgeConfig {
    let mut config = BridgeConfig::new(addr(last), ports);
    config.msti_count = 2;
    config.mst_config_name = Some("lab".to_string());
    config.mst_config_revision = 3;
    config.vlan_assignments = vec![(10, 1), (20, 2)];
    config
}

fn config_id(config: &BridgeConfig) -> mstp::types::MstConfigId {
    Bridge::new(config, RecordingHost::new(config.address))
        .unwrap()
        .mst_config_id()
}

#[test]
fn identical_configuration_gives_identical_digest() {
    let a = config_id(&region_config(1, 1));
    let b = config_id(&region_config(2, 4));
    assert_eq!(a, b);
    assert_eq!(a.name_str(), "lab");

    let mut moved = region_config(2, 4);
    moved.vlan_assignments = vec![(10, 2), (20, 2)];
    let c = config_id(&moved);
    assert_ne!(a.digest, c.digest);
    assert_eq!(a.name, c.name);

    let mut renamed = region_config(2, 4);
    renamed.mst_config_revision = 4;
    assert_ne!(a, config_id(&renamed));
}

#[test]
fn default_names_keep_bridges_apart() {
    let a = config_id(&BridgeConfig::new(addr(1), 1));
    let b = config_id(&BridgeConfig::new(addr(2), 1));
    assert_eq!(a.digest, b.digest);
    assert_ne!(a, b);
}

/// Two bridges of one region joined by two gigabit links. Bridge 0 has the
/// lower address and wins the CIST; bridge 1 is given the better priority on
/// MSTI 1.
fn region_pair() -> (Network, usize, usize) {
    let mut net = Network::new();
    let a = net.add_bridge(&region_config(1, 2));
    let b = net.add_bridge(&region_config(2, 2));
    let now = net.now;
    net.bridges[b].set_bridge_priority(1, 4096, now).unwrap();
    net.connect((a, 0), (b, 0), 1000);
    net.connect((a, 1), (b, 1), 1000);
    net.run_for(5);
    (net, a, b)
}

#[test]
fn msti_roots_independently_of_the_cist() {
    let (net, a, b) = region_pair();

    assert!(net.bridges[b].port_tree_status(0, CIST).unwrap().info_internal);
    assert_eq!(net.roles(a, CIST), vec![PortRole::Designated, PortRole::Designated]);
    assert_eq!(net.roles(b, CIST), vec![PortRole::Root, PortRole::Alternate]);
    assert_eq!(net.bridges[b].regional_root_id().unwrap(), net.bridges[a].bridge_id(CIST));
    assert_eq!(net.bridges[b].root_path_cost(CIST).unwrap(), 0);
    assert_eq!(net.bridges[b].internal_root_path_cost().unwrap(), 20_000);

    assert_eq!(net.roles(b, 1), vec![PortRole::Designated, PortRole::Designated]);
    assert_eq!(net.roles(a, 1), vec![PortRole::Root, PortRole::Alternate]);
    assert_eq!(net.bridges[a].root_id(1).unwrap(), net.bridges[b].bridge_id(1));
    assert_eq!(net.bridges[a].root_path_cost(1).unwrap(), 20_000);

    // MSTI 2 follows the addresses, like the CIST
    assert_eq!(net.roles(b, 2), vec![PortRole::Root, PortRole::Alternate]);
}

#[test]
fn msti_cost_change_moves_only_that_tree() {
    let (mut net, a, b) = region_pair();
    let now = net.now;
    net.bridges[a].set_admin_internal_path_cost(1, 1, 5_000, now).unwrap();
    net.deliver();
    net.run_for(5);

    assert_eq!(net.roles(a, 1), vec![PortRole::Alternate, PortRole::Root]);
    assert_eq!(net.bridges[a].root_path_cost(1).unwrap(), 5_000);
    assert_eq!(net.roles(b, CIST), vec![PortRole::Root, PortRole::Alternate]);
    assert_eq!(net.roles(b, 2), vec![PortRole::Root, PortRole::Alternate]);
}

#[test]
fn leaving_the_region_makes_a_boundary() {
    let (mut net, a, b) = region_pair();
    let now = net.now;
    net.bridges[b].set_mst_config_revision(9, now);
    net.deliver();
    // MSTI information from before the split has to age out first
    net.run_for(10);

    let status = net.bridges[b].port_tree_status(0, CIST).unwrap();
    assert!(!status.info_internal);
    // across a boundary the external cost counts and each bridge is its own
    // regional root
    assert_eq!(net.bridges[b].root_path_cost(CIST).unwrap(), 20_000);
    assert_eq!(net.bridges[b].regional_root_id().unwrap(), net.bridges[b].bridge_id(CIST));
    assert_eq!(net.roles(b, CIST), vec![PortRole::Root, PortRole::Alternate]);
    // the boundary root port is the Master port of every MSTI
    assert_eq!(net.roles(b, 1)[0], PortRole::Master);
    assert_eq!(net.roles(a, 1), vec![PortRole::Designated, PortRole::Designated]);
}
