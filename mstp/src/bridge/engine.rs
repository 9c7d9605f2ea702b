use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::ether::EtherAddr;
use crate::host::Host;
use crate::sm::bridge_detection::BridgeDetection;
use crate::sm::port_information::PortInformation;
use crate::sm::port_receive::PortReceive;
use crate::sm::port_transmit::PortTransmit;
use crate::sm::protocol_migration::ProtocolMigration;
use crate::sm::role_selection::RoleSelection;
use crate::sm::role_transitions::RoleTransitions;
use crate::sm::state_transition::StateTransition;
use crate::sm::topology_change::TopologyChange;
use crate::sm::{begin, step};
use crate::types::{BridgeId, MstConfigId, ProtocolVersion, Times, VlanTable, CIST};

use super::port::Port;
use super::tree::BridgeTree;

/// Passes after which the driving loop gives up on reaching a fixed point.
const MAX_PASSES: usize = 1024;

/// Everything a bridge knows, minus the host.
///
/// Keeping the host outside lets the machines borrow the variables and the
/// host mutably at the same time.
#[derive(Debug, Clone)]
pub(crate) struct Engine {
    pub(crate) address: EtherAddr,
    pub(crate) force_protocol_version: ProtocolVersion,
    pub(crate) hello_time: u16,
    pub(crate) max_age: u16,
    pub(crate) forward_delay: u16,
    pub(crate) migrate_time: u16,
    pub(crate) tx_hold_count: u8,
    pub(crate) max_hops: u8,
    pub(crate) mst_config_id: MstConfigId,
    pub(crate) vlan_table: VlanTable,
    pub(crate) started: bool,
    pub(crate) now: u32,
    pub(crate) trees: Vec<BridgeTree>,
    pub(crate) ports: Vec<Port>,
}

impl Engine {
    pub(crate) fn new(config: &BridgeConfig) -> Result<Self> {
        config.validate()?;

        let mut vlan_table = VlanTable::default();
        for &(vid, tree) in &config.vlan_assignments {
            vlan_table.set_tree(vid, tree)?;
        }
        let mst_config_id = MstConfigId::new(
            &config.config_name(),
            config.mst_config_revision,
            &vlan_table,
        )?;

        let tree_count = config.msti_count + 1;
        let mut engine = Engine {
            address: config.address,
            force_protocol_version: config.protocol_version,
            hello_time: config.hello_time,
            max_age: config.max_age,
            forward_delay: config.forward_delay,
            migrate_time: config.migrate_time,
            tx_hold_count: config.tx_hold_count,
            max_hops: config.max_hops,
            mst_config_id,
            vlan_table,
            started: false,
            now: 0,
            trees: Vec::with_capacity(tree_count),
            ports: Vec::with_capacity(config.port_count),
        };

        let times = engine.bridge_times();
        for tree in 0..tree_count {
            let id = BridgeId::new(config.bridge_priority, tree as u16, config.address);
            engine.trees.push(BridgeTree::new(id, tree == CIST, times));
        }
        for port in 0..config.port_count {
            engine
                .ports
                .push(Port::new(&config.port(port), (port + 1) as u16, tree_count));
        }
        Ok(engine)
    }

    pub(crate) fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// BridgeTimes: zero message age and MaxHops remaining hops.
    pub(crate) fn bridge_times(&self) -> Times {
        Times {
            message_age: 0,
            max_age: self.max_age,
            hello_time: self.hello_time,
            forward_delay: self.forward_delay,
            remaining_hops: self.max_hops,
        }
    }

    /// Push changed bridge times into every tree.
    pub(crate) fn refresh_bridge_times(&mut self) {
        let times = self.bridge_times();
        for tree in self.trees.iter_mut() {
            tree.bridge_times = times;
        }
    }

    /// Ask Port Role Selection to recompute `tree` on its next pass.
    pub(crate) fn reselect(&mut self, port: usize, tree: usize) {
        let x = &mut self.ports[port].trees[tree];
        x.reselect = true;
        x.selected = false;
    }

    /// [`Engine::reselect`] every port of every tree.
    pub(crate) fn reselect_all(&mut self) {
        for port in 0..self.ports.len() {
            for tree in 0..self.tree_count() {
                self.reselect(port, tree);
            }
        }
    }

    /// rstpVersion.
    pub(crate) fn rstp_version(&self) -> bool {
        self.force_protocol_version >= ProtocolVersion::Rstp
    }

    /// Whether MST BPDUs are sent and understood.
    pub(crate) fn mstp(&self) -> bool {
        self.force_protocol_version >= ProtocolVersion::Mstp
    }

    /// Put every machine in its initial state, the equivalent of asserting
    /// BEGIN, and run to a fixed point.
    pub(crate) fn reset<H: Host>(&mut self, host: &mut H) {
        debug!("reset");
        for tree in self.trees.iter_mut() {
            tree.root_priority = tree.bridge_priority;
            tree.root_port_id = crate::types::PortId(0);
            tree.root_times = tree.bridge_times;
        }
        let times = self.bridge_times();
        for port in self.ports.iter_mut() {
            port.clear_operational();
            for (t, pt) in port.trees.iter_mut().enumerate() {
                let mut priority = self.trees[t].bridge_priority;
                priority.designated_port_id = pt.port_id;
                pt.port_priority = priority;
                pt.designated_priority = priority;
                pt.port_times = times;
                pt.designated_times = times;
            }
        }

        for port in 0..self.ports.len() {
            begin::<PortReceive, _>(self, host, port, CIST);
            begin::<ProtocolMigration, _>(self, host, port, CIST);
            begin::<BridgeDetection, _>(self, host, port, CIST);
            begin::<PortTransmit, _>(self, host, port, CIST);
            for tree in 0..self.tree_count() {
                begin::<PortInformation, _>(self, host, port, tree);
                begin::<RoleTransitions, _>(self, host, port, tree);
                begin::<StateTransition, _>(self, host, port, tree);
                begin::<TopologyChange, _>(self, host, port, tree);
            }
        }
        for tree in 0..self.tree_count() {
            begin::<RoleSelection, _>(self, host, 0, tree);
        }
        self.run(host);
    }

    /// Step every machine instance until a whole pass moves none of them.
    ///
    /// Returns the number of passes that took at least one transition.
    pub(crate) fn run<H: Host>(&mut self, host: &mut H) -> usize {
        if !self.started {
            return 0;
        }
        for pass in 0..MAX_PASSES {
            if !self.run_pass(host) {
                return pass;
            }
        }
        warn!(passes = MAX_PASSES, "state machines did not settle");
        MAX_PASSES
    }

    /// One pass over every machine instance in a fixed order.
    pub(crate) fn run_pass<H: Host>(&mut self, host: &mut H) -> bool {
        let mut moved = false;
        for port in 0..self.ports.len() {
            moved |= step::<PortReceive, _>(self, host, port, CIST);
            moved |= step::<ProtocolMigration, _>(self, host, port, CIST);
            moved |= step::<BridgeDetection, _>(self, host, port, CIST);
            for tree in 0..self.tree_count() {
                moved |= step::<PortInformation, _>(self, host, port, tree);
            }
        }
        for tree in 0..self.tree_count() {
            moved |= step::<RoleSelection, _>(self, host, 0, tree);
        }
        for port in 0..self.ports.len() {
            for tree in 0..self.tree_count() {
                moved |= step::<RoleTransitions, _>(self, host, port, tree);
                moved |= step::<StateTransition, _>(self, host, port, tree);
                moved |= step::<TopologyChange, _>(self, host, port, tree);
            }
            moved |= step::<PortTransmit, _>(self, host, port, CIST);
        }
        moved
    }

    /// The Port Timers machine: count every running timer down by one second.
    pub(crate) fn tick(&mut self) {
        for port in self.ports.iter_mut() {
            dec(&mut port.edge_delay_while);
            dec(&mut port.hello_when);
            dec(&mut port.mdelay_while);
            port.tx_count = port.tx_count.saturating_sub(1);
            for pt in port.trees.iter_mut() {
                dec(&mut pt.fd_while);
                dec(&mut pt.rr_while);
                dec(&mut pt.rb_while);
                dec(&mut pt.tc_while);
                dec(&mut pt.rcvd_info_while);
                dec(&mut pt.tc_detected);
            }
        }
    }
}

#[inline]
fn dec(timer: &mut u16) {
    *timer = timer.saturating_sub(1);
}
