use serde::Serialize;

use crate::types::{InfoIs, PortId, PortRole, PortState, PriorityVector, Times};

use super::port::{Port, PortTree};

/// A snapshot of everything a bridge holds for one port on one tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortTreeStatus {
    /// Port identifier on this tree.
    pub port_id: PortId,
    /// Role the port currently acts in.
    pub role: PortRole,
    /// Role last computed by Port Role Selection.
    pub selected_role: PortRole,
    /// Forwarding state.
    pub state: PortState,
    /// Origin of the port priority vector.
    pub info_is: InfoIs,
    /// Best information seen on the port.
    pub port_priority: PriorityVector,
    /// Information the port sends when designated.
    pub designated_priority: PriorityVector,
    /// Times that came with `port_priority`.
    pub port_times: Times,
    /// Times the port sends when designated.
    pub designated_times: Times,
    /// operEdge of the port.
    pub oper_edge: bool,
    /// Whether the port sends RST or MST BPDUs.
    pub send_rstp: bool,
    /// Whether the port has been isolated by Bridge Detection.
    pub isolate: bool,
    /// Whether the CIST information on the port came from the same region.
    pub info_internal: bool,
    #[allow(missing_docs)]
    pub proposing: bool,
    #[allow(missing_docs)]
    pub proposed: bool,
    #[allow(missing_docs)]
    pub agree: bool,
    #[allow(missing_docs)]
    pub agreed: bool,
    #[allow(missing_docs)]
    pub sync: bool,
    #[allow(missing_docs)]
    pub synced: bool,
    #[allow(missing_docs)]
    pub re_root: bool,
    #[allow(missing_docs)]
    pub disputed: bool,
    #[allow(missing_docs)]
    pub master: bool,
    #[allow(missing_docs)]
    pub mastered: bool,
    /// fdWhile, seconds.
    pub fd_while: u16,
    /// rrWhile, seconds.
    pub rr_while: u16,
    /// rbWhile, seconds.
    pub rb_while: u16,
    /// tcWhile, seconds.
    pub tc_while: u16,
    /// rcvdInfoWhile, seconds.
    pub rcvd_info_while: u16,
}

impl PortTreeStatus {
    pub(crate) fn new(port: &Port, tree: usize) -> Self {
        let x = &port.trees[tree];
        PortTreeStatus {
            port_id: x.port_id,
            role: x.role,
            selected_role: x.selected_role,
            state: port_state(x),
            info_is: x.info_is,
            port_priority: x.port_priority,
            designated_priority: x.designated_priority,
            port_times: x.port_times,
            designated_times: x.designated_times,
            oper_edge: port.oper_edge,
            send_rstp: port.send_rstp,
            isolate: port.isolate,
            info_internal: port.info_internal,
            proposing: x.proposing,
            proposed: x.proposed,
            agree: x.agree,
            agreed: x.agreed,
            sync: x.sync,
            synced: x.synced,
            re_root: x.re_root,
            disputed: x.disputed,
            master: x.master,
            mastered: x.mastered,
            fd_while: x.fd_while,
            rr_while: x.rr_while,
            rb_while: x.rb_while,
            tc_while: x.tc_while,
            rcvd_info_while: x.rcvd_info_while,
        }
    }
}

pub(crate) fn port_state(x: &PortTree) -> PortState {
    if x.forwarding {
        PortState::Forwarding
    } else if x.learning {
        PortState::Learning
    } else {
        PortState::Discarding
    }
}
