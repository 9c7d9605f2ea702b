//! Port Information state machine (13.32).
//!
//! One instance per port and tree. It classifies each received message
//! against the stored port priority vector, records what it learns and ages
//! the information out when the neighbour falls silent.

use serde::Serialize;

use super::StateMachine;
use crate::bridge::Engine;
use crate::host::Host;
use crate::types::{InfoIs, RcvdInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum PortInformationState {
    Disabled,
    Aged,
    Update,
    Current,
    Receive,
    SuperiorDesignated,
    RepeatedDesignated,
    InferiorDesignated,
    NotDesignated,
    Other,
}

#[derive(Debug)]
pub(crate) struct PortInformation;

impl StateMachine for PortInformation {
    type State = PortInformationState;
    const NAME: &'static str = "PIM";

    fn current(engine: &Engine, port: usize, tree: usize) -> Self::State {
        engine.ports[port].trees[tree].pim_state
    }

    fn store(engine: &mut Engine, port: usize, tree: usize, state: Self::State) {
        engine.ports[port].trees[tree].pim_state = state;
    }

    fn begin(_engine: &Engine, _port: usize, _tree: usize) -> Self::State {
        PortInformationState::Disabled
    }

    fn check_conditions(
        engine: &Engine,
        port: usize,
        tree: usize,
        state: Self::State,
    ) -> Option<Self::State> {
        use PortInformationState::*;

        let p = &engine.ports[port];
        let x = &p.trees[tree];
        if !p.port_enabled && x.info_is != InfoIs::Disabled {
            return Some(Disabled);
        }
        let rcvd_msg = engine.rcvd_xst_msg(port, tree);
        let updt_info = engine.updt_xst_info(port, tree);
        match state {
            Disabled => {
                if rcvd_msg {
                    Some(Disabled)
                } else if p.port_enabled {
                    Some(Aged)
                } else {
                    None
                }
            }
            Aged if x.selected && updt_info => Some(Update),
            Aged => None,
            Update | SuperiorDesignated | RepeatedDesignated | InferiorDesignated
            | NotDesignated | Other => Some(Current),
            Current => {
                if x.selected && updt_info {
                    Some(Update)
                } else if x.info_is == InfoIs::Received
                    && x.rcvd_info_while == 0
                    && !x.updt_info
                    && !rcvd_msg
                {
                    Some(Aged)
                } else if rcvd_msg && !updt_info {
                    Some(Receive)
                } else {
                    None
                }
            }
            Receive => Some(match x.rcvd_info {
                RcvdInfo::SuperiorDesignated => SuperiorDesignated,
                RcvdInfo::RepeatedDesignated => RepeatedDesignated,
                RcvdInfo::InferiorDesignated => InferiorDesignated,
                RcvdInfo::InferiorRootAlternate => NotDesignated,
                RcvdInfo::Other => Other,
            }),
        }
    }

    fn init_state<H: Host>(
        engine: &mut Engine,
        _host: &mut H,
        port: usize,
        tree: usize,
        state: Self::State,
    ) {
        match state {
            PortInformationState::Disabled => {
                let x = &mut engine.ports[port].trees[tree];
                x.rcvd_msg = false;
                x.proposing = false;
                x.proposed = false;
                x.agree = false;
                x.agreed = false;
                x.rcvd_info_while = 0;
                x.info_is = InfoIs::Disabled;
                x.reselect = true;
                x.selected = false;
            }
            PortInformationState::Aged => {
                let x = &mut engine.ports[port].trees[tree];
                x.info_is = InfoIs::Aged;
                x.reselect = true;
                x.selected = false;
            }
            PortInformationState::Update => {
                let better_or_same = engine.better_or_same_info(port, tree, InfoIs::Mine);
                let x = &mut engine.ports[port].trees[tree];
                x.proposing = false;
                x.proposed = false;
                x.agreed = x.agreed && better_or_same;
                x.synced = x.synced && x.agreed;
                x.port_priority = x.designated_priority;
                x.port_times = x.designated_times;
                x.updt_info = false;
                x.info_is = InfoIs::Mine;
                engine.new_info_xst(port, tree);
            }
            PortInformationState::Current => {}
            PortInformationState::Receive => {
                let rcvd_info = engine.rcv_info(port, tree);
                engine.ports[port].trees[tree].rcvd_info = rcvd_info;
                engine.record_mastered(port, tree);
            }
            PortInformationState::SuperiorDesignated => {
                engine.ports[port].info_internal = engine.ports[port].rcvd_internal;
                let x = &mut engine.ports[port].trees[tree];
                x.agreed = false;
                x.proposing = false;
                engine.record_proposal(port, tree);
                engine.set_tc_flags(port, tree);
                let better_or_same = engine.better_or_same_info(port, tree, InfoIs::Received);
                let x = &mut engine.ports[port].trees[tree];
                x.agree = x.agree && better_or_same;
                engine.record_agreement(port, tree);
                let x = &mut engine.ports[port].trees[tree];
                x.synced = x.synced && x.agreed;
                engine.record_priority(port, tree);
                engine.record_times(port, tree);
                engine.updt_rcvd_info_while(port, tree);
                let x = &mut engine.ports[port].trees[tree];
                x.info_is = InfoIs::Received;
                x.reselect = true;
                x.selected = false;
                x.rcvd_msg = false;
            }
            PortInformationState::RepeatedDesignated => {
                engine.ports[port].info_internal = engine.ports[port].rcvd_internal;
                engine.record_proposal(port, tree);
                engine.set_tc_flags(port, tree);
                engine.record_agreement(port, tree);
                engine.updt_rcvd_info_while(port, tree);
                engine.ports[port].trees[tree].rcvd_msg = false;
            }
            PortInformationState::InferiorDesignated => {
                engine.record_dispute(port, tree);
                engine.ports[port].trees[tree].rcvd_msg = false;
            }
            PortInformationState::NotDesignated => {
                engine.record_agreement(port, tree);
                engine.set_tc_flags(port, tree);
                engine.ports[port].trees[tree].rcvd_msg = false;
            }
            PortInformationState::Other => {
                engine.ports[port].trees[tree].rcvd_msg = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpdu::{Bpdu, CistBpdu, Flags};
    use crate::ether::EtherAddr;
    use crate::sm::step;
    use crate::sm::testing::{engine, LogHost};
    use crate::types::{BridgeId, PortId, CIST};

    fn run(engine: &mut Engine, host: &mut LogHost) {
        while step::<PortInformation, _>(engine, host, 0, CIST) {}
    }

    fn deliver(engine: &mut Engine, root_priority: u16) {
        let root = BridgeId::new(root_priority, 0, EtherAddr([0x02, 0, 0, 0, 0, 1]));
        engine.ports[0].rcvd = Some(Bpdu::Rst(CistBpdu {
            flags: Flags(0x0c),
            root_id: root,
            regional_root_id: root,
            port_id: PortId(0x8001),
            max_age: 20,
            hello_time: 2,
            forward_delay: 15,
            ..Default::default()
        }));
        engine.set_rcvd_msgs(0);
    }

    #[test]
    fn enabled_port_ages_then_updates() {
        let (mut engine, mut host) = engine(1, 0);
        engine.ports[0].port_enabled = true;
        run(&mut engine, &mut host);
        assert_eq!(engine.ports[0].trees[CIST].pim_state, PortInformationState::Aged);
        assert!(engine.ports[0].trees[CIST].reselect);

        let x = &mut engine.ports[0].trees[CIST];
        x.selected = true;
        x.updt_info = true;
        run(&mut engine, &mut host);
        let x = &engine.ports[0].trees[CIST];
        assert_eq!(x.pim_state, PortInformationState::Current);
        assert_eq!(x.info_is, InfoIs::Mine);
        assert!(engine.ports[0].new_info);
    }

    #[test]
    fn superior_message_is_recorded() {
        let (mut engine, mut host) = engine(1, 0);
        engine.ports[0].port_enabled = true;
        run(&mut engine, &mut host);
        let x = &mut engine.ports[0].trees[CIST];
        x.selected = true;
        x.updt_info = true;
        run(&mut engine, &mut host);

        deliver(&mut engine, 0x1000);
        run(&mut engine, &mut host);
        let x = &engine.ports[0].trees[CIST];
        assert_eq!(x.rcvd_info, RcvdInfo::SuperiorDesignated);
        assert_eq!(x.info_is, InfoIs::Received);
        assert_eq!(x.port_priority, x.msg_priority);
        assert_eq!(x.rcvd_info_while, 6);
        assert!(!x.rcvd_msg && !x.selected && x.reselect);

        // the same message again only refreshes the timer
        engine.ports[0].trees[CIST].rcvd_info_while = 1;
        engine.ports[0].trees[CIST].selected = true;
        deliver(&mut engine, 0x1000);
        run(&mut engine, &mut host);
        let x = &engine.ports[0].trees[CIST];
        assert_eq!(x.rcvd_info, RcvdInfo::RepeatedDesignated);
        assert_eq!(x.rcvd_info_while, 6);
        assert!(x.selected);
    }

    #[test]
    fn received_information_ages_out() {
        let (mut engine, mut host) = engine(1, 0);
        engine.ports[0].port_enabled = true;
        run(&mut engine, &mut host);
        engine.ports[0].trees[CIST].selected = true;
        engine.ports[0].trees[CIST].updt_info = true;
        run(&mut engine, &mut host);
        deliver(&mut engine, 0x1000);
        run(&mut engine, &mut host);

        engine.ports[0].trees[CIST].rcvd_info_while = 0;
        run(&mut engine, &mut host);
        assert_eq!(engine.ports[0].trees[CIST].info_is, InfoIs::Aged);
    }

    #[test]
    fn link_down_disables() {
        let (mut engine, mut host) = engine(1, 0);
        engine.ports[0].port_enabled = true;
        run(&mut engine, &mut host);
        engine.ports[0].port_enabled = false;
        run(&mut engine, &mut host);
        let x = &engine.ports[0].trees[CIST];
        assert_eq!(x.pim_state, PortInformationState::Disabled);
        assert_eq!(x.info_is, InfoIs::Disabled);
    }
}
