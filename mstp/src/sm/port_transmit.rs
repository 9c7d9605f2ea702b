//! Port Transmit state machine (13.31).

use serde::Serialize;

use super::StateMachine;
use crate::bridge::Engine;
use crate::host::Host;
use crate::types::CIST;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum PortTransmitState {
    TransmitInit,
    Idle,
    TransmitPeriodic,
    TransmitConfig,
    TransmitTcn,
    TransmitRstp,
}

#[derive(Debug)]
pub(crate) struct PortTransmit;

impl StateMachine for PortTransmit {
    type State = PortTransmitState;
    const NAME: &'static str = "PTX";

    fn current(engine: &Engine, port: usize, _tree: usize) -> Self::State {
        engine.ports[port].ptx_state
    }

    fn store(engine: &mut Engine, port: usize, _tree: usize, state: Self::State) {
        engine.ports[port].ptx_state = state;
    }

    fn begin(_engine: &Engine, _port: usize, _tree: usize) -> Self::State {
        PortTransmitState::TransmitInit
    }

    fn check_conditions(
        engine: &Engine,
        port: usize,
        _tree: usize,
        state: Self::State,
    ) -> Option<Self::State> {
        use PortTransmitState::*;

        let p = &engine.ports[port];
        // a disabled port is held in TRANSMIT_INIT rather than cycling
        // through it and IDLE
        if !p.port_enabled {
            return if state != TransmitInit {
                Some(TransmitInit)
            } else {
                None
            };
        }
        match state {
            TransmitInit | TransmitPeriodic | TransmitConfig | TransmitTcn | TransmitRstp => {
                Some(Idle)
            }
            Idle => {
                if !engine.all_transmit_ready(port) {
                    return None;
                }
                let can_send = p.tx_count < engine.tx_hold_count && p.hello_when != 0;
                if p.hello_when == 0 {
                    Some(TransmitPeriodic)
                } else if !p.send_rstp && p.new_info && engine.cist_designated_port(port) && can_send
                {
                    Some(TransmitConfig)
                } else if !p.send_rstp && p.new_info && engine.cist_root_port(port) && can_send {
                    Some(TransmitTcn)
                } else if p.send_rstp
                    && (p.new_info || (p.new_info_msti && !engine.msti_master_port(port)))
                    && can_send
                {
                    Some(TransmitRstp)
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
        _tree: usize,
        state: Self::State,
    ) {
        match state {
            PortTransmitState::TransmitInit => {
                let p = &mut engine.ports[port];
                p.new_info = true;
                p.new_info_msti = true;
                p.tx_count = 0;
            }
            PortTransmitState::Idle => {
                let hello = engine.port_hello_time(port);
                engine.ports[port].hello_when = hello;
            }
            PortTransmitState::TransmitPeriodic => {
                let cist = &engine.ports[port].trees[CIST];
                let cist_info = engine.cist_designated_port(port)
                    || (engine.cist_root_port(port) && cist.tc_while != 0);
                let msti_info = engine.msti_designated_or_tc_propagating_root_port(port);
                let p = &mut engine.ports[port];
                p.new_info |= cist_info;
                p.new_info_msti |= msti_info;
            }
            PortTransmitState::TransmitConfig => {
                engine.ports[port].new_info = false;
                engine.tx_config(host, port);
                let p = &mut engine.ports[port];
                p.tx_count = p.tx_count.saturating_add(1);
                p.tc_ack = false;
            }
            PortTransmitState::TransmitTcn => {
                engine.ports[port].new_info = false;
                engine.tx_tcn(host, port);
                let p = &mut engine.ports[port];
                p.tx_count = p.tx_count.saturating_add(1);
            }
            PortTransmitState::TransmitRstp => {
                let p = &mut engine.ports[port];
                p.new_info = false;
                p.new_info_msti = false;
                engine.tx_rstp(host, port);
                let p = &mut engine.ports[port];
                p.tx_count = p.tx_count.saturating_add(1);
                p.tc_ack = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpdu::{Bpdu, BpduKind};
    use crate::sm::step;
    use crate::sm::testing::{engine, LogHost};
    use crate::types::{PortRole, ProtocolVersion};

    fn run(engine: &mut Engine, host: &mut LogHost) {
        while step::<PortTransmit, _>(engine, host, 0, CIST) {}
    }

    fn designated(engine: &mut Engine) {
        for x in engine.ports[0].trees.iter_mut() {
            x.role = PortRole::Designated;
            x.selected_role = PortRole::Designated;
            x.selected = true;
            x.updt_info = false;
        }
        engine.ports[0].port_enabled = true;
    }

    #[test]
    fn disabled_port_stays_in_init() {
        let (mut engine, mut host) = engine(1, 0);
        run(&mut engine, &mut host);
        assert_eq!(engine.ports[0].ptx_state, PortTransmitState::TransmitInit);
        assert!(host.sent.is_empty());
    }

    #[test]
    fn designated_port_sends_rstp_once() {
        let (mut engine, mut host) = engine(1, 0);
        engine.force_protocol_version = ProtocolVersion::Rstp;
        designated(&mut engine);
        engine.ports[0].send_rstp = true;
        run(&mut engine, &mut host);
        assert_eq!(engine.ports[0].ptx_state, PortTransmitState::Idle);
        assert_eq!(host.sent.len(), 1);
        assert_eq!(
            Bpdu::decode(&host.sent[0].1, ProtocolVersion::Rstp, 64).map(|b| b.kind()),
            Some(BpduKind::Rst)
        );
        assert_eq!(engine.ports[0].tx_count, 1);
    }

    #[test]
    fn tx_hold_count_limits_bursts() {
        let (mut engine, mut host) = engine(1, 0);
        designated(&mut engine);
        engine.ports[0].send_rstp = true;
        for _ in 0..10 {
            engine.ports[0].new_info = true;
            run(&mut engine, &mut host);
        }
        assert_eq!(host.sent.len(), engine.tx_hold_count as usize);
        assert_eq!(engine.ports[0].stats.tx_mst, engine.tx_hold_count as u64);
    }

    #[test]
    fn hello_timer_expiry_resends() {
        let (mut engine, mut host) = engine(1, 0);
        designated(&mut engine);
        engine.ports[0].send_rstp = false;
        run(&mut engine, &mut host);
        assert_eq!(host.sent.len(), 1);
        assert_eq!(engine.ports[0].hello_when, engine.hello_time);

        engine.ports[0].hello_when = 0;
        run(&mut engine, &mut host);
        assert_eq!(host.sent.len(), 2);
        assert_eq!(engine.ports[0].stats.tx_config, 2);
    }

    #[test]
    fn root_port_of_stp_bridge_sends_tcn() {
        let (mut engine, mut host) = engine(1, 0);
        designated(&mut engine);
        engine.ports[0].trees[CIST].role = PortRole::Root;
        engine.ports[0].send_rstp = false;
        run(&mut engine, &mut host);
        assert_eq!(host.sent, vec![(0, vec![0, 0, 0, 0x80])]);
    }
}
