//! Bridge Detection state machine (13.30).
//!
//! Decides whether a port is an edge port. A port that gets no BPDU for
//! EdgeDelay while proposing becomes an edge port if AutoEdge allows it, or
//! is isolated if it is a point-to-point link that neither may nor should be
//! an edge.

use serde::Serialize;

use super::StateMachine;
use crate::bridge::Engine;
use crate::host::Host;
use crate::types::CIST;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum BridgeDetectionState {
    Edge,
    NotEdge,
    Isolated,
}

#[derive(Debug)]
pub(crate) struct BridgeDetection;

impl StateMachine for BridgeDetection {
    type State = BridgeDetectionState;
    const NAME: &'static str = "BDM";

    fn current(engine: &Engine, port: usize, _tree: usize) -> Self::State {
        engine.ports[port].bdm_state
    }

    fn store(engine: &mut Engine, port: usize, _tree: usize, state: Self::State) {
        engine.ports[port].bdm_state = state;
    }

    fn begin(engine: &Engine, port: usize, _tree: usize) -> Self::State {
        if engine.ports[port].admin_edge {
            BridgeDetectionState::Edge
        } else {
            BridgeDetectionState::NotEdge
        }
    }

    fn check_conditions(
        engine: &Engine,
        port: usize,
        _tree: usize,
        state: Self::State,
    ) -> Option<Self::State> {
        use BridgeDetectionState::*;

        let p = &engine.ports[port];
        let proposing = p.trees[CIST].proposing;
        let timed_out = p.edge_delay_while == 0;
        match state {
            Edge => {
                if ((!p.port_enabled || !p.auto_edge) && !p.admin_edge) || !p.oper_edge {
                    Some(NotEdge)
                } else {
                    None
                }
            }
            NotEdge => {
                if (!p.port_enabled && p.admin_edge)
                    || (timed_out && p.auto_edge && p.send_rstp && proposing)
                {
                    Some(Edge)
                } else if p.port_enabled
                    && timed_out
                    && !p.auto_edge
                    && !p.admin_edge
                    && p.oper_p2p()
                    && p.send_rstp
                    && proposing
                {
                    Some(Isolated)
                } else {
                    None
                }
            }
            Isolated => {
                if !p.port_enabled || !timed_out || p.auto_edge || p.admin_edge {
                    Some(NotEdge)
                } else {
                    None
                }
            }
        }
    }

    fn init_state<H: Host>(
        engine: &mut Engine,
        _host: &mut H,
        port: usize,
        _tree: usize,
        state: Self::State,
    ) {
        let p = &mut engine.ports[port];
        match state {
            BridgeDetectionState::Edge => {
                p.oper_edge = true;
                p.isolate = false;
            }
            BridgeDetectionState::NotEdge => {
                p.oper_edge = false;
                p.isolate = false;
            }
            BridgeDetectionState::Isolated => {
                p.oper_edge = false;
                p.isolate = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sm::testing::{engine, LogHost};
    use crate::sm::{begin, step};
    use crate::types::AdminP2p;

    fn run(engine: &mut Engine, host: &mut LogHost) {
        while step::<BridgeDetection, _>(engine, host, 0, CIST) {}
    }

    #[test]
    fn admin_edge_starts_as_edge() {
        let (mut engine, mut host) = engine(1, 0);
        engine.ports[0].admin_edge = true;
        begin::<BridgeDetection, _>(&mut engine, &mut host, 0, CIST);
        assert!(engine.ports[0].oper_edge);
        run(&mut engine, &mut host);
        assert_eq!(engine.ports[0].bdm_state, BridgeDetectionState::Edge);

        // a received BPDU clears operEdge
        engine.ports[0].port_enabled = true;
        engine.ports[0].oper_edge = false;
        run(&mut engine, &mut host);
        assert_eq!(engine.ports[0].bdm_state, BridgeDetectionState::NotEdge);
    }

    #[test]
    fn silent_proposing_port_becomes_edge() {
        let (mut engine, mut host) = engine(1, 0);
        let p = &mut engine.ports[0];
        p.port_enabled = true;
        p.send_rstp = true;
        p.trees[CIST].proposing = true;
        p.edge_delay_while = 1;
        run(&mut engine, &mut host);
        assert_eq!(engine.ports[0].bdm_state, BridgeDetectionState::NotEdge);

        engine.ports[0].edge_delay_while = 0;
        run(&mut engine, &mut host);
        assert_eq!(engine.ports[0].bdm_state, BridgeDetectionState::Edge);
        assert!(engine.ports[0].oper_edge);
    }

    #[test]
    fn silent_point_to_point_port_is_isolated() {
        let (mut engine, mut host) = engine(1, 0);
        let p = &mut engine.ports[0];
        p.port_enabled = true;
        p.auto_edge = false;
        p.admin_p2p = AdminP2p::ForceTrue;
        p.send_rstp = true;
        p.trees[CIST].proposing = true;
        p.edge_delay_while = 0;
        run(&mut engine, &mut host);
        assert_eq!(engine.ports[0].bdm_state, BridgeDetectionState::Isolated);
        assert!(engine.ports[0].isolate);

        // hearing from the neighbour restarts the edge delay timer
        engine.ports[0].edge_delay_while = engine.migrate_time;
        run(&mut engine, &mut host);
        assert_eq!(engine.ports[0].bdm_state, BridgeDetectionState::NotEdge);
        assert!(!engine.ports[0].isolate);
    }
}
