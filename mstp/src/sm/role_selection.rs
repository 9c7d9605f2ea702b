//! Port Role Selection state machine (13.33) and the role computation it runs.

use serde::Serialize;
use tracing::debug;

use super::StateMachine;
use crate::bridge::Engine;
use crate::host::Host;
use crate::types::{InfoIs, PortId, PortRole, PriorityVector, Times, CIST};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum RoleSelectionState {
    InitTree,
    RoleSelection,
}

#[derive(Debug)]
pub(crate) struct RoleSelection;

impl StateMachine for RoleSelection {
    type State = RoleSelectionState;
    const NAME: &'static str = "PRS";

    fn current(engine: &Engine, _port: usize, tree: usize) -> Self::State {
        engine.trees[tree].prs_state
    }

    fn store(engine: &mut Engine, _port: usize, tree: usize, state: Self::State) {
        engine.trees[tree].prs_state = state;
    }

    fn begin(_engine: &Engine, _port: usize, _tree: usize) -> Self::State {
        RoleSelectionState::InitTree
    }

    fn check_conditions(
        engine: &Engine,
        _port: usize,
        tree: usize,
        state: Self::State,
    ) -> Option<Self::State> {
        match state {
            RoleSelectionState::InitTree => Some(RoleSelectionState::RoleSelection),
            RoleSelectionState::RoleSelection
                if engine.ports.iter().any(|p| p.trees[tree].reselect) =>
            {
                Some(RoleSelectionState::RoleSelection)
            }
            RoleSelectionState::RoleSelection => None,
        }
    }

    fn init_state<H: Host>(
        engine: &mut Engine,
        _host: &mut H,
        _port: usize,
        tree: usize,
        state: Self::State,
    ) {
        match state {
            RoleSelectionState::InitTree => engine.updt_role_disabled_tree(tree),
            RoleSelectionState::RoleSelection => {
                engine.clear_reselect_tree(tree);
                engine.updt_roles_tree(tree);
                engine.set_selected_tree(tree);
            }
        }
    }
}

impl Engine {
    /// Whether the CIST information of `port` came from another region.
    fn boundary_port(&self, port: usize) -> bool {
        let p = &self.ports[port];
        p.trees[CIST].info_is == InfoIs::Received && !p.info_internal
    }

    /// updtRolesTree: compute the root priority vector, root port, root times
    /// and every port's designated priority vector and role for `tree`.
    pub(crate) fn updt_roles_tree(&mut self, tree: usize) {
        let own_id = self.trees[tree].bridge_id;
        let cist_id = self.trees[CIST].bridge_id;
        let old_root = self.trees[tree].root_priority;

        let mut best = (self.trees[tree].bridge_priority, PortId(0));
        let mut root_times = self.trees[tree].bridge_times;
        for (q, p) in self.ports.iter().enumerate() {
            let x = &p.trees[tree];
            if x.info_is != InfoIs::Received
                || x.port_priority.designated_bridge_id.mac_addr() == self.address
                || p.restricted_role
                || (tree != CIST && self.boundary_port(q))
            {
                continue;
            }
            let mut candidate = x.port_priority;
            let mut times = x.port_times;
            if tree == CIST && !p.info_internal {
                candidate.external_root_path_cost = candidate
                    .external_root_path_cost
                    .saturating_add(p.external_path_cost());
                candidate.regional_root_id = cist_id;
                candidate.internal_root_path_cost = 0;
                times.message_age = times.message_age.saturating_add(1);
                times.remaining_hops = self.max_hops;
            } else {
                candidate.internal_root_path_cost = candidate
                    .internal_root_path_cost
                    .saturating_add(x.internal_path_cost(p.speed_mbps));
                times.remaining_hops = times.remaining_hops.saturating_sub(1);
            }
            if (candidate, x.port_id) < best {
                best = (candidate, x.port_id);
                root_times = times;
            }
        }

        let (root_priority, root_port_id) = best;
        {
            let t = &mut self.trees[tree];
            t.root_priority = root_priority;
            t.root_port_id = root_port_id;
            t.root_times = root_times;
        }
        if root_priority != old_root {
            debug!(tree, root = %root_priority.root_id, port = %root_port_id, "new root priority vector");
        }

        if tree == CIST
            && root_priority.regional_root_id != old_root.regional_root_id
            && (root_priority.external_root_path_cost != 0 || old_root.external_root_path_cost != 0)
        {
            self.sync_master();
        }

        let hello = self.trees[tree].bridge_times.hello_time;
        for q in 0..self.ports.len() {
            let boundary = self.boundary_port(q);
            let p = &mut self.ports[q];
            let cist_role = p.trees[CIST].selected_role;
            let x = &mut p.trees[tree];
            let old_role = x.selected_role;

            x.designated_priority = PriorityVector {
                designated_bridge_id: own_id,
                designated_port_id: x.port_id,
                ..root_priority
            };
            x.designated_times = Times {
                hello_time: hello,
                ..root_times
            };
            let differs =
                x.port_priority != x.designated_priority || x.port_times != x.designated_times;

            let (role, updt) = match x.info_is {
                InfoIs::Disabled => (PortRole::Disabled, false),
                _ if tree != CIST && boundary => {
                    let role = match cist_role {
                        PortRole::Root => PortRole::Master,
                        other => other,
                    };
                    (role, differs)
                }
                InfoIs::Aged => (PortRole::Designated, true),
                InfoIs::Mine => (PortRole::Designated, differs),
                InfoIs::Received if x.port_id == root_port_id => (PortRole::Root, false),
                InfoIs::Received if x.designated_priority >= x.port_priority => {
                    if x.port_priority.designated_bridge_id.mac_addr() != self.address {
                        (PortRole::Alternate, false)
                    } else {
                        (PortRole::Backup, false)
                    }
                }
                InfoIs::Received => (PortRole::Designated, true),
            };
            x.selected_role = role;
            if updt {
                x.updt_info = true;
            }

            if role != old_role {
                debug!(port = q, tree, from = old_role.as_str(), to = role.as_str(), "role selected");
                if tree == CIST {
                    for m in p.trees[1..].iter_mut() {
                        m.reselect = true;
                        m.selected = false;
                    }
                }
            }
        }

        if tree != CIST {
            self.updt_master_flags(tree);
        }
    }

    /// The Master flag of an MSTI port: set on Root and Designated ports while
    /// the bridge has a Master port, or another Root or Alternate port heard
    /// the Master flag from its neighbour.
    fn updt_master_flags(&mut self, tree: usize) {
        let has_master = self
            .ports
            .iter()
            .any(|p| p.trees[tree].selected_role == PortRole::Master);
        let mastered: Vec<usize> = self
            .ports
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                let x = &p.trees[tree];
                x.mastered && matches!(x.selected_role, PortRole::Root | PortRole::Alternate)
            })
            .map(|(q, _)| q)
            .collect();
        for (q, p) in self.ports.iter_mut().enumerate() {
            let x = &mut p.trees[tree];
            x.master = matches!(x.selected_role, PortRole::Root | PortRole::Designated)
                && (has_master || mastered.iter().any(|&r| r != q));
        }
    }
}
