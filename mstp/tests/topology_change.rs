mod common;
use common::*;

use mstp::{BridgeConfig, FlushType, PortConfig, PortRole, PortState, ProtocolVersion, CIST};

#[test]
fn new_link_is_reported_upstream() {
    let mut net = Network::new();
    let a = net.add_default_bridge(1, 2);
    let b = net.add_default_bridge(2, 2);
    let c = net.add_default_bridge(3, 1);
    net.connect((a, 0), (b, 0), 1000);
    net.run_for(5);
    let before = net.bridges[a].topology_change_info(CIST).unwrap().count;
    net.bridges[a].host_mut().notified.clear();

    net.connect((b, 1), (c, 0), 1000);
    net.run_for(1);

    assert_eq!(net.roles(b, CIST), vec![PortRole::Root, PortRole::Designated]);
    assert_eq!(net.roles(c, CIST), vec![PortRole::Root]);
    assert!(net.bridges[b].host().topology_changes.contains(&(1, CIST)));
    assert!(net.bridges[b].host().flushes.contains(&(0, CIST, FlushType::Immediate)));
    assert!(net.bridges[a].host().notified.contains(&(0, CIST)));

    let info = net.bridges[a].topology_change_info(CIST).unwrap();
    assert!(info.count > before);
    assert!(info.last_change.is_some());
}

#[test]
fn change_ends_after_tc_while() {
    let mut net = Network::new();
    let a = net.add_default_bridge(1, 1);
    let b = net.add_default_bridge(2, 1);
    net.connect((a, 0), (b, 0), 1000);
    net.run_for(1);
    assert!(net.bridges[b].topology_change_info(CIST).unwrap().active);

    net.run_for(10);
    assert!(!net.bridges[b].topology_change_info(CIST).unwrap().active);
    assert!(!net.bridges[a].topology_change_info(CIST).unwrap().active);
}

/// Bridge 0 runs MSTP, bridge 1 is forced to legacy STP.
fn legacy_pair() -> (Network, usize, usize) {
    let mut net = Network::new();
    let a = net.add_default_bridge(1, 1);
    let mut config = BridgeConfig::new(addr(2), 1);
    config.protocol_version = ProtocolVersion::Stp;
    let b = net.add_bridge(&config);
    net.connect((a, 0), (b, 0), 100);
    (net, a, b)
}

#[test]
fn legacy_stp_neighbour() {
    let (mut net, a, b) = legacy_pair();
    net.run_for(3);
    assert_eq!(net.roles(b, CIST), vec![PortRole::Root]);
    assert_ne!(net.states(b, CIST), vec![PortState::Forwarding]);

    // the legacy root port waits out its timers, then reports the change
    // with a TCN, which is what gives the legacy bridge away
    net.run_for(50);
    assert_eq!(net.states(a, CIST), vec![PortState::Forwarding]);
    assert_eq!(net.states(b, CIST), vec![PortState::Forwarding]);
    assert!(!net.bridges[a].port_tree_status(0, CIST).unwrap().send_rstp);

    let a_stats = net.bridges[a].port_stats(0);
    let b_stats = net.bridges[b].port_stats(0);
    assert!(a_stats.tx_config > 0);
    assert!(a_stats.rx_tcn > 0);
    assert_eq!(b_stats.tx_rst + b_stats.tx_mst, 0);
    assert!(b_stats.tx_tcn > 0);
    assert!(net.bridges[a].host().notified.contains(&(0, CIST)));
}

#[test]
fn mcheck_returns_to_rstp_after_neighbour_upgrade() {
    let (mut net, a, b) = legacy_pair();
    net.run_for(50);
    assert!(!net.bridges[a].port_tree_status(0, CIST).unwrap().send_rstp);

    let now = net.now;
    net.bridges[b].set_protocol_version(ProtocolVersion::Mstp, now);
    net.bridges[a].force_protocol_migration(0, now);
    net.deliver();
    net.run_for(5);
    assert!(net.bridges[a].port_tree_status(0, CIST).unwrap().send_rstp);
    assert!(net.bridges[b].port_stats(0).tx_mst + net.bridges[b].port_stats(0).tx_rst > 0);
}

#[test]
fn edge_port_forwards_at_once() {
    let mut config = BridgeConfig::new(addr(1), 2);
    config.ports = vec![
        PortConfig {
            admin_edge: true,
            ..Default::default()
        },
        PortConfig::default(),
    ];
    let mut net = Network::new();
    let a = net.add_bridge(&config);
    let now = net.now;
    net.bridges[a].on_port_enabled(0, 1000, true, now);

    assert_eq!(net.bridges[a].port_state(0, CIST).unwrap(), PortState::Forwarding);
    assert!(net.bridges[a].port_tree_status(0, CIST).unwrap().oper_edge);
    assert_eq!(net.bridges[a].topology_change_info(CIST).unwrap().count, 0);
    assert!(net.bridges[a].host().topology_changes.is_empty());
}

#[test]
fn silent_link_becomes_edge() {
    let mut net = Network::new();
    let a = net.add_default_bridge(1, 1);
    let now = net.now;
    net.bridges[a].on_port_enabled(0, 1000, true, now);
    assert_eq!(net.bridges[a].port_state(0, CIST).unwrap(), PortState::Discarding);

    // nobody answers the proposal within the edge delay
    net.run_for(4);
    assert!(net.bridges[a].port_tree_status(0, CIST).unwrap().oper_edge);
    assert_eq!(net.bridges[a].port_state(0, CIST).unwrap(), PortState::Forwarding);
}

#[test]
fn silent_link_without_auto_edge_is_isolated() {
    let mut config = BridgeConfig::new(addr(1), 1);
    config.ports = vec![PortConfig {
        auto_edge: false,
        ..Default::default()
    }];
    let mut net = Network::new();
    let a = net.add_bridge(&config);
    let now = net.now;
    net.bridges[a].on_port_enabled(0, 1000, true, now);

    net.run_for(40);
    let status = net.bridges[a].port_tree_status(0, CIST).unwrap();
    assert!(status.isolate);
    assert_eq!(status.role, PortRole::Designated);
    assert_eq!(status.state, PortState::Discarding);
    assert!(!net.bridges[a].host().is_forwarding(0, CIST));

    let now = net.now;
    net.bridges[a].set_auto_edge(0, true, now);
    net.run_for(1);
    let status = net.bridges[a].port_tree_status(0, CIST).unwrap();
    assert!(!status.isolate);
    assert_eq!(status.state, PortState::Forwarding);
}
