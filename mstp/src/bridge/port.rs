use serde::{Deserialize, Serialize};

use crate::bpdu::{Bpdu, BpduKind, Flags};
use crate::config::PortConfig;
use crate::sm::bridge_detection::BridgeDetectionState;
use crate::sm::port_information::PortInformationState;
use crate::sm::port_receive::PortReceiveState;
use crate::sm::port_transmit::PortTransmitState;
use crate::sm::protocol_migration::ProtocolMigrationState;
use crate::sm::role_transitions::RoleTransitionsState;
use crate::sm::state_transition::StateTransitionState;
use crate::sm::topology_change::TopologyChangeState;
use crate::types::{
    path_cost_for_speed, AdminP2p, InfoIs, PortId, PortRole, PriorityVector, RcvdInfo, Times,
};

/// Frame counters of one port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortStats {
    /// Config BPDUs received.
    pub rx_config: u64,
    /// TCN BPDUs received.
    pub rx_tcn: u64,
    /// RST BPDUs received, including MST BPDUs handled as RST.
    pub rx_rst: u64,
    /// MST BPDUs received.
    pub rx_mst: u64,
    /// Frames dropped because they were not valid BPDUs or the port was down.
    pub rx_dropped: u64,
    /// Config BPDUs sent.
    pub tx_config: u64,
    /// TCN BPDUs sent.
    pub tx_tcn: u64,
    /// RST BPDUs sent.
    pub tx_rst: u64,
    /// MST BPDUs sent.
    pub tx_mst: u64,
    /// Transmissions skipped because the host declined to provide a buffer.
    pub tx_dropped: u64,
}

impl PortStats {
    pub(crate) fn count_rx(&mut self, kind: BpduKind) {
        match kind {
            BpduKind::StpConfig => self.rx_config += 1,
            BpduKind::StpTcn => self.rx_tcn += 1,
            BpduKind::Rst => self.rx_rst += 1,
            BpduKind::Mst => self.rx_mst += 1,
            BpduKind::Unknown => self.rx_dropped += 1,
        }
    }

    pub(crate) fn count_tx(&mut self, kind: BpduKind) {
        match kind {
            BpduKind::StpConfig => self.tx_config += 1,
            BpduKind::StpTcn => self.tx_tcn += 1,
            BpduKind::Rst => self.tx_rst += 1,
            BpduKind::Mst => self.tx_mst += 1,
            BpduKind::Unknown => {}
        }
    }
}

/// Per-port variables and the per-port state machines.
#[derive(Debug, Clone)]
pub(crate) struct Port {
    // administrative
    pub(crate) admin_edge: bool,
    pub(crate) auto_edge: bool,
    pub(crate) admin_external_path_cost: u32,
    pub(crate) admin_p2p: AdminP2p,
    pub(crate) restricted_role: bool,
    pub(crate) restricted_tcn: bool,

    // reported by the host
    pub(crate) port_enabled: bool,
    pub(crate) speed_mbps: u32,
    pub(crate) detected_p2p: bool,

    pub(crate) oper_edge: bool,
    pub(crate) isolate: bool,
    pub(crate) info_internal: bool,
    pub(crate) rcvd_internal: bool,
    pub(crate) mcheck: bool,
    pub(crate) new_info: bool,
    pub(crate) new_info_msti: bool,
    pub(crate) rcvd_bpdu: bool,
    pub(crate) rcvd_rstp: bool,
    pub(crate) rcvd_stp: bool,
    pub(crate) rcvd_tc_ack: bool,
    pub(crate) rcvd_tcn: bool,
    pub(crate) send_rstp: bool,
    pub(crate) tc_ack: bool,
    pub(crate) tx_count: u8,

    pub(crate) edge_delay_while: u16,
    pub(crate) hello_when: u16,
    pub(crate) mdelay_while: u16,

    pub(crate) rcvd: Option<Bpdu>,

    pub(crate) prx_state: PortReceiveState,
    pub(crate) ppm_state: ProtocolMigrationState,
    pub(crate) bdm_state: BridgeDetectionState,
    pub(crate) ptx_state: PortTransmitState,

    pub(crate) trees: Vec<PortTree>,
    pub(crate) stats: PortStats,
}

impl Port {
    pub(crate) fn new(config: &PortConfig, number: u16, tree_count: usize) -> Self {
        let port_id = PortId::new(config.port_priority, number);
        Port {
            admin_edge: config.admin_edge,
            auto_edge: config.auto_edge,
            admin_external_path_cost: config.admin_external_path_cost,
            admin_p2p: config.admin_p2p,
            restricted_role: config.restricted_role,
            restricted_tcn: config.restricted_tcn,
            port_enabled: false,
            speed_mbps: 0,
            detected_p2p: false,
            oper_edge: false,
            isolate: false,
            info_internal: false,
            rcvd_internal: false,
            mcheck: false,
            new_info: false,
            new_info_msti: false,
            rcvd_bpdu: false,
            rcvd_rstp: false,
            rcvd_stp: false,
            rcvd_tc_ack: false,
            rcvd_tcn: false,
            send_rstp: false,
            tc_ack: false,
            tx_count: 0,
            edge_delay_while: 0,
            hello_when: 0,
            mdelay_while: 0,
            rcvd: None,
            prx_state: PortReceiveState::Discard,
            ppm_state: ProtocolMigrationState::CheckingRstp,
            bdm_state: BridgeDetectionState::NotEdge,
            ptx_state: PortTransmitState::TransmitInit,
            trees: (0..tree_count).map(|_| PortTree::new(port_id)).collect(),
            stats: PortStats::default(),
        }
    }

    /// Forget everything learned from the network, keeping administrative
    /// settings, link status and counters.
    pub(crate) fn clear_operational(&mut self) {
        self.oper_edge = false;
        self.isolate = false;
        self.info_internal = false;
        self.rcvd_internal = false;
        self.mcheck = false;
        self.new_info = false;
        self.new_info_msti = false;
        self.rcvd_bpdu = false;
        self.rcvd_rstp = false;
        self.rcvd_stp = false;
        self.rcvd_tc_ack = false;
        self.rcvd_tcn = false;
        self.send_rstp = false;
        self.tc_ack = false;
        self.tx_count = 0;
        self.edge_delay_while = 0;
        self.hello_when = 0;
        self.mdelay_while = 0;
        self.rcvd = None;
        for tree in self.trees.iter_mut() {
            tree.clear_operational();
        }
    }

    /// operPointToPointMAC.
    pub(crate) fn oper_p2p(&self) -> bool {
        match self.admin_p2p {
            AdminP2p::ForceTrue => true,
            AdminP2p::ForceFalse => false,
            AdminP2p::Auto => self.detected_p2p,
        }
    }

    /// ExternalPortPathCost: the administrative value, or one derived from the
    /// link speed.
    pub(crate) fn external_path_cost(&self) -> u32 {
        if self.admin_external_path_cost != 0 {
            self.admin_external_path_cost
        } else {
            path_cost_for_speed(self.speed_mbps)
        }
    }

    /// rcvdAnyMsg.
    pub(crate) fn rcvd_any_msg(&self) -> bool {
        self.trees.iter().any(|t| t.rcvd_msg)
    }
}

/// Per-port per-tree variables and state machines.
#[derive(Debug, Clone)]
pub(crate) struct PortTree {
    pub(crate) port_id: PortId,
    pub(crate) admin_internal_path_cost: u32,

    pub(crate) role: PortRole,
    pub(crate) selected_role: PortRole,
    pub(crate) info_is: InfoIs,
    pub(crate) rcvd_info: RcvdInfo,

    pub(crate) port_priority: PriorityVector,
    pub(crate) designated_priority: PriorityVector,
    pub(crate) msg_priority: PriorityVector,
    pub(crate) port_times: Times,
    pub(crate) designated_times: Times,
    pub(crate) msg_times: Times,
    pub(crate) msg_flags: Flags,

    pub(crate) agree: bool,
    pub(crate) agreed: bool,
    pub(crate) disputed: bool,
    pub(crate) fdb_flush: bool,
    pub(crate) forward: bool,
    pub(crate) forwarding: bool,
    pub(crate) learn: bool,
    pub(crate) learning: bool,
    pub(crate) master: bool,
    pub(crate) mastered: bool,
    pub(crate) proposed: bool,
    pub(crate) proposing: bool,
    pub(crate) rcvd_msg: bool,
    pub(crate) rcvd_tc: bool,
    pub(crate) re_root: bool,
    pub(crate) reselect: bool,
    pub(crate) selected: bool,
    pub(crate) sync: bool,
    pub(crate) synced: bool,
    pub(crate) tc_prop: bool,
    pub(crate) updt_info: bool,

    pub(crate) fd_while: u16,
    pub(crate) rr_while: u16,
    pub(crate) rb_while: u16,
    pub(crate) tc_while: u16,
    pub(crate) rcvd_info_while: u16,
    pub(crate) tc_detected: u16,

    pub(crate) pim_state: PortInformationState,
    pub(crate) prt_state: RoleTransitionsState,
    pub(crate) pst_state: StateTransitionState,
    pub(crate) tcm_state: TopologyChangeState,
}

impl PortTree {
    fn new(port_id: PortId) -> Self {
        PortTree {
            port_id,
            admin_internal_path_cost: 0,
            role: PortRole::Disabled,
            selected_role: PortRole::Disabled,
            info_is: InfoIs::Disabled,
            rcvd_info: RcvdInfo::Other,
            port_priority: PriorityVector::default(),
            designated_priority: PriorityVector::default(),
            msg_priority: PriorityVector::default(),
            port_times: Times::default(),
            designated_times: Times::default(),
            msg_times: Times::default(),
            msg_flags: Flags::default(),
            agree: false,
            agreed: false,
            disputed: false,
            fdb_flush: false,
            forward: false,
            forwarding: false,
            learn: false,
            learning: false,
            master: false,
            mastered: false,
            proposed: false,
            proposing: false,
            rcvd_msg: false,
            rcvd_tc: false,
            re_root: false,
            reselect: false,
            selected: false,
            sync: false,
            synced: false,
            tc_prop: false,
            updt_info: false,
            fd_while: 0,
            rr_while: 0,
            rb_while: 0,
            tc_while: 0,
            rcvd_info_while: 0,
            tc_detected: 0,
            pim_state: PortInformationState::Disabled,
            prt_state: RoleTransitionsState::InitPort,
            pst_state: StateTransitionState::Discarding,
            tcm_state: TopologyChangeState::Inactive,
        }
    }

    fn clear_operational(&mut self) {
        let fresh = PortTree::new(self.port_id);
        *self = PortTree {
            admin_internal_path_cost: self.admin_internal_path_cost,
            ..fresh
        };
    }

    /// InternalPortPathCost for this tree.
    pub(crate) fn internal_path_cost(&self, speed_mbps: u32) -> u32 {
        if self.admin_internal_path_cost != 0 {
            self.admin_internal_path_cost
        } else {
            path_cost_for_speed(speed_mbps)
        }
    }
}
