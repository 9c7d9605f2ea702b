//! Port Receive state machine (13.28).

use serde::Serialize;

use super::StateMachine;
use crate::bridge::Engine;
use crate::host::Host;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum PortReceiveState {
    Discard,
    Receive,
}

#[derive(Debug)]
pub(crate) struct PortReceive;

impl StateMachine for PortReceive {
    type State = PortReceiveState;
    const NAME: &'static str = "PRX";

    fn current(engine: &Engine, port: usize, _tree: usize) -> Self::State {
        engine.ports[port].prx_state
    }

    fn store(engine: &mut Engine, port: usize, _tree: usize, state: Self::State) {
        engine.ports[port].prx_state = state;
    }

    fn begin(_engine: &Engine, _port: usize, _tree: usize) -> Self::State {
        PortReceiveState::Discard
    }

    fn check_conditions(
        engine: &Engine,
        port: usize,
        _tree: usize,
        state: Self::State,
    ) -> Option<Self::State> {
        use PortReceiveState::*;

        let p = &engine.ports[port];
        if (p.rcvd_bpdu || p.edge_delay_while != engine.migrate_time) && !p.port_enabled {
            return Some(Discard);
        }
        match state {
            Discard if p.rcvd_bpdu && p.port_enabled => Some(Receive),
            Receive if p.rcvd_bpdu && p.port_enabled && !p.rcvd_any_msg() => Some(Receive),
            _ => None,
        }
    }

    fn init_state<H: Host>(
        engine: &mut Engine,
        _host: &mut H,
        port: usize,
        _tree: usize,
        state: Self::State,
    ) {
        let migrate_time = engine.migrate_time;
        match state {
            PortReceiveState::Discard => {
                let p = &mut engine.ports[port];
                p.rcvd_bpdu = false;
                p.rcvd_rstp = false;
                p.rcvd_stp = false;
                engine.clear_all_rcvd_msgs(port);
                engine.ports[port].edge_delay_while = migrate_time;
            }
            PortReceiveState::Receive => {
                engine.updt_bpdu_version(port);
                engine.ports[port].rcvd_internal = engine.from_same_region(port);
                engine.set_rcvd_msgs(port);
                let p = &mut engine.ports[port];
                p.oper_edge = false;
                p.isolate = false;
                p.rcvd_bpdu = false;
                p.edge_delay_while = migrate_time;
            }
        }
    }
}
