//! Port Protocol Migration state machine (13.29).

use serde::Serialize;

use super::StateMachine;
use crate::bridge::Engine;
use crate::host::Host;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum ProtocolMigrationState {
    CheckingRstp,
    SelectingStp,
    Sensing,
}

#[derive(Debug)]
pub(crate) struct ProtocolMigration;

impl StateMachine for ProtocolMigration {
    type State = ProtocolMigrationState;
    const NAME: &'static str = "PPM";

    fn current(engine: &Engine, port: usize, _tree: usize) -> Self::State {
        engine.ports[port].ppm_state
    }

    fn store(engine: &mut Engine, port: usize, _tree: usize, state: Self::State) {
        engine.ports[port].ppm_state = state;
    }

    fn begin(_engine: &Engine, _port: usize, _tree: usize) -> Self::State {
        ProtocolMigrationState::CheckingRstp
    }

    fn check_conditions(
        engine: &Engine,
        port: usize,
        _tree: usize,
        state: Self::State,
    ) -> Option<Self::State> {
        use ProtocolMigrationState::*;

        let p = &engine.ports[port];
        match state {
            CheckingRstp => {
                if p.mdelay_while != engine.migrate_time && !p.port_enabled {
                    Some(CheckingRstp)
                } else if p.mdelay_while == 0 {
                    Some(Sensing)
                } else {
                    None
                }
            }
            SelectingStp => {
                if p.mdelay_while == 0 || !p.port_enabled || p.mcheck {
                    Some(Sensing)
                } else {
                    None
                }
            }
            Sensing => {
                if !p.port_enabled
                    || p.mcheck
                    || (engine.rstp_version() && !p.send_rstp && p.rcvd_rstp)
                {
                    Some(CheckingRstp)
                } else if p.send_rstp && p.rcvd_stp {
                    Some(SelectingStp)
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
        let rstp = engine.rstp_version();
        let migrate_time = engine.migrate_time;
        let p = &mut engine.ports[port];
        match state {
            ProtocolMigrationState::CheckingRstp => {
                p.mcheck = false;
                p.send_rstp = rstp;
                p.mdelay_while = migrate_time;
            }
            ProtocolMigrationState::SelectingStp => {
                p.send_rstp = false;
                p.mdelay_while = migrate_time;
            }
            ProtocolMigrationState::Sensing => {
                p.rcvd_rstp = false;
                p.rcvd_stp = false;
            }
        }
    }
}
