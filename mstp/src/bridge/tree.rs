use serde::{Deserialize, Serialize};

use crate::sm::role_selection::RoleSelectionState;
use crate::types::{BridgeId, PortId, PriorityVector, Times};

/// Topology change history of one tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyChangeInfo {
    /// Topology changes detected by, or notified to, this bridge since it
    /// was created.
    pub count: u64,
    /// Timestamp of the most recent one.
    pub last_change: Option<u32>,
    /// Whether any port of the tree is still propagating a change.
    pub active: bool,
}

/// Per-tree variables of a bridge.
#[derive(Debug, Clone)]
pub(crate) struct BridgeTree {
    pub(crate) bridge_id: BridgeId,
    pub(crate) bridge_priority: PriorityVector,
    pub(crate) bridge_times: Times,
    pub(crate) root_port_id: PortId,
    pub(crate) root_priority: PriorityVector,
    pub(crate) root_times: Times,
    pub(crate) prs_state: RoleSelectionState,
    pub(crate) tc_count: u64,
    pub(crate) tc_last_change: Option<u32>,
}

impl BridgeTree {
    pub(crate) fn new(bridge_id: BridgeId, cist: bool, bridge_times: Times) -> Self {
        let bridge_priority = if cist {
            PriorityVector::cist_bridge(bridge_id)
        } else {
            PriorityVector::msti_bridge(bridge_id)
        };
        BridgeTree {
            bridge_id,
            bridge_priority,
            bridge_times,
            root_port_id: PortId(0),
            root_priority: bridge_priority,
            root_times: bridge_times,
            prs_state: RoleSelectionState::InitTree,
            tc_count: 0,
            tc_last_change: None,
        }
    }

    /// Replace the bridge identifier and the bridge priority vector built from it.
    pub(crate) fn set_bridge_id(&mut self, bridge_id: BridgeId, cist: bool) {
        self.bridge_id = bridge_id;
        self.bridge_priority = if cist {
            PriorityVector::cist_bridge(bridge_id)
        } else {
            PriorityVector::msti_bridge(bridge_id)
        };
    }

    pub(crate) fn is_root_bridge(&self) -> bool {
        self.root_port_id == PortId(0)
    }
}
