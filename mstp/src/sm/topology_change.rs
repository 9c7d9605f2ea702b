//! Topology Change state machine (13.39).
//!
//! Detects topology changes on the port's own forwarding transitions, spreads
//! them to the other ports of the tree and asks the host to flush what the
//! port has learned.

use serde::Serialize;
use tracing::info;

use super::StateMachine;
use crate::bridge::Engine;
use crate::host::{FlushType, Host};
use crate::types::{PortRole, CIST};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum TopologyChangeState {
    Inactive,
    Learning,
    Detected,
    Active,
    NotifiedTcn,
    NotifiedTc,
    Propagating,
    Acknowledged,
}

#[derive(Debug)]
pub(crate) struct TopologyChange;

fn forwarding_role(role: PortRole) -> bool {
    matches!(role, PortRole::Root | PortRole::Designated | PortRole::Master)
}

impl StateMachine for TopologyChange {
    type State = TopologyChangeState;
    const NAME: &'static str = "TCM";

    fn current(engine: &Engine, port: usize, tree: usize) -> Self::State {
        engine.ports[port].trees[tree].tcm_state
    }

    fn store(engine: &mut Engine, port: usize, tree: usize, state: Self::State) {
        engine.ports[port].trees[tree].tcm_state = state;
    }

    fn begin(_engine: &Engine, _port: usize, _tree: usize) -> Self::State {
        TopologyChangeState::Inactive
    }

    fn check_conditions(
        engine: &Engine,
        port: usize,
        tree: usize,
        state: Self::State,
    ) -> Option<Self::State> {
        use TopologyChangeState::*;

        let p = &engine.ports[port];
        let x = &p.trees[tree];
        let cist = tree == CIST;
        let rcvd_tcn = cist && p.rcvd_tcn;
        let rcvd_tc_ack = cist && p.rcvd_tc_ack;
        match state {
            Inactive if x.learn && !x.fdb_flush => Some(Learning),
            Inactive => None,
            Learning => {
                if forwarding_role(x.role) && x.forward && !p.oper_edge {
                    Some(Detected)
                } else if x.rcvd_tc || rcvd_tcn || rcvd_tc_ack || x.tc_prop {
                    Some(Learning)
                } else if !forwarding_role(x.role) && !(x.learn || x.learning) {
                    Some(Inactive)
                } else {
                    None
                }
            }
            Detected | NotifiedTc | Propagating | Acknowledged => Some(Active),
            NotifiedTcn => Some(NotifiedTc),
            Active => {
                if !forwarding_role(x.role) || p.oper_edge {
                    Some(Learning)
                } else if rcvd_tcn {
                    Some(NotifiedTcn)
                } else if x.rcvd_tc {
                    Some(NotifiedTc)
                } else if x.tc_prop && !p.oper_edge {
                    Some(Propagating)
                } else if rcvd_tc_ack {
                    Some(Acknowledged)
                } else {
                    None
                }
            }
        }
    }

    fn init_state<H: Host>(
        engine: &mut Engine,
        host: &mut H,
        port: usize,
        tree: usize,
        state: Self::State,
    ) {
        let cist = tree == CIST;
        match state {
            TopologyChangeState::Inactive => {
                engine.ports[port].trees[tree].tc_while = 0;
                if cist {
                    engine.ports[port].tc_ack = false;
                }
                flush(engine, host, port, tree);
            }
            TopologyChangeState::Learning => {
                let p = &mut engine.ports[port];
                if cist {
                    p.rcvd_tcn = false;
                    p.rcvd_tc_ack = false;
                }
                let x = &mut p.trees[tree];
                x.rcvd_tc = false;
                x.tc_prop = false;
            }
            TopologyChangeState::Detected => {
                engine.new_tc_while(port, tree);
                engine.set_tc_prop_tree(port, tree);
                engine.new_info_xst(port, tree);
                engine.new_tc_detected(port, tree);
                count_change(engine, tree);
                info!(port, tree, "topology change detected");
                host.on_topology_change(port, tree, engine.now);
            }
            TopologyChangeState::Active => {}
            TopologyChangeState::NotifiedTcn => engine.new_tc_while(port, tree),
            TopologyChangeState::NotifiedTc => {
                let p = &mut engine.ports[port];
                if cist {
                    p.rcvd_tcn = false;
                    if p.trees[CIST].role == PortRole::Designated {
                        p.tc_ack = true;
                    }
                }
                p.trees[tree].rcvd_tc = false;
                engine.set_tc_prop_tree(port, tree);
                count_change(engine, tree);
                info!(port, tree, "topology change notified");
                host.on_notified_topology_change(port, tree, engine.now);
            }
            TopologyChangeState::Propagating => {
                engine.new_tc_while(port, tree);
                engine.ports[port].trees[tree].tc_prop = false;
                flush(engine, host, port, tree);
            }
            TopologyChangeState::Acknowledged => {
                let p = &mut engine.ports[port];
                p.trees[tree].tc_while = 0;
                p.rcvd_tc_ack = false;
            }
        }
    }
}

/// Raise fdbFlush and serve it at once: the host flushes synchronously, so
/// the flag never stays set across a pass.
fn flush<H: Host>(engine: &mut Engine, host: &mut H, port: usize, tree: usize) {
    let flush_type = if engine.ports[port].send_rstp {
        FlushType::Immediate
    } else {
        FlushType::RapidAgeing
    };
    engine.ports[port].trees[tree].fdb_flush = true;
    host.flush_fdb(port, tree, flush_type, engine.now);
    engine.ports[port].trees[tree].fdb_flush = false;
}

fn count_change(engine: &mut Engine, tree: usize) {
    let t = &mut engine.trees[tree];
    t.tc_count += 1;
    t.tc_last_change = Some(engine.now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sm::step;
    use crate::sm::testing::{engine, LogHost};

    fn run(engine: &mut Engine, host: &mut LogHost, port: usize) -> Vec<TopologyChangeState> {
        let mut seen = Vec::new();
        while step::<TopologyChange, _>(engine, host, port, CIST) {
            seen.push(engine.ports[port].trees[CIST].tcm_state);
        }
        seen
    }

    fn forwarding(engine: &mut Engine, port: usize, role: PortRole) {
        let x = &mut engine.ports[port].trees[CIST];
        x.role = role;
        x.learn = true;
        x.forward = true;
    }

    #[test]
    fn forwarding_designated_port_detects_a_change() {
        let (mut engine, mut host) = engine(2, 0);
        forwarding(&mut engine, 0, PortRole::Designated);
        let seen = run(&mut engine, &mut host, 0);
        assert_eq!(
            seen,
            vec![
                TopologyChangeState::Learning,
                TopologyChangeState::Detected,
                TopologyChangeState::Active
            ]
        );
        assert_eq!(engine.ports[0].trees[CIST].tc_while, engine.hello_time + 1);
        assert!(engine.ports[1].trees[CIST].tc_prop);
        assert!(!engine.ports[0].trees[CIST].tc_prop);
        assert_eq!(engine.trees[CIST].tc_count, 1);
        assert_eq!(host.calls, vec!["tc 0 0"]);
    }

    #[test]
    fn edge_ports_do_not_detect_changes() {
        let (mut engine, mut host) = engine(1, 0);
        engine.ports[0].oper_edge = true;
        forwarding(&mut engine, 0, PortRole::Designated);
        run(&mut engine, &mut host, 0);
        assert_eq!(engine.ports[0].trees[CIST].tcm_state, TopologyChangeState::Learning);
        assert_eq!(engine.trees[CIST].tc_count, 0);
    }

    #[test]
    fn propagation_flushes() {
        let (mut engine, mut host) = engine(2, 0);
        forwarding(&mut engine, 1, PortRole::Designated);
        run(&mut engine, &mut host, 1);
        host.calls.clear();

        engine.ports[1].trees[CIST].tc_prop = true;
        run(&mut engine, &mut host, 1);
        assert_eq!(host.calls, vec!["flush 1 0 Immediate"]);
        assert!(!engine.ports[1].trees[CIST].tc_prop);
    }

    #[test]
    fn tcn_on_designated_port_is_acknowledged() {
        let (mut engine, mut host) = engine(2, 0);
        engine.ports[0].send_rstp = false;
        forwarding(&mut engine, 0, PortRole::Designated);
        run(&mut engine, &mut host, 0);
        host.calls.clear();

        engine.ports[0].rcvd_tcn = true;
        let seen = run(&mut engine, &mut host, 0);
        assert_eq!(seen[0], TopologyChangeState::NotifiedTcn);
        assert!(engine.ports[0].tc_ack);
        assert!(!engine.ports[0].rcvd_tcn);
        assert!(engine.ports[1].trees[CIST].tc_prop);
        assert_eq!(host.calls, vec!["notified 0 0"]);
    }

    #[test]
    fn blocked_port_returns_to_inactive() {
        let (mut engine, mut host) = engine(1, 0);
        forwarding(&mut engine, 0, PortRole::Designated);
        run(&mut engine, &mut host, 0);

        let x = &mut engine.ports[0].trees[CIST];
        x.role = PortRole::Alternate;
        x.learn = false;
        x.forward = false;
        run(&mut engine, &mut host, 0);
        let x = &engine.ports[0].trees[CIST];
        assert_eq!(x.tcm_state, TopologyChangeState::Inactive);
        assert_eq!(x.tc_while, 0);
    }
}
