//! Port Role Transitions state machine (13.35).
//!
//! One instance per port and tree. The states fall into one family per port
//! role; a change of selected role moves the machine into the entry state of
//! the new family. Within a family the machine cycles between the role's
//! port state and short action states that manage the proposal and agreement
//! handshake and the learn and forward permissions.

use serde::Serialize;
use tracing::debug;

use super::StateMachine;
use crate::bridge::Engine;
use crate::host::Host;
use crate::types::{PortRole, CIST};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum RoleTransitionsState {
    InitPort,
    DisablePort,
    DisabledPort,

    MasterProposed,
    MasterAgreed,
    MasterSynced,
    MasterRetired,
    MasterForward,
    MasterLearn,
    MasterDiscard,
    MasterPort,

    RootProposed,
    RootAgreed,
    RootSynced,
    Reroot,
    RootForward,
    RootLearn,
    Rerooted,
    RootPort,

    DesignatedPropose,
    DesignatedAgreed,
    DesignatedSynced,
    DesignatedRetired,
    DesignatedForward,
    DesignatedLearn,
    DesignatedDiscard,
    DesignatedPort,

    BlockPort,
    BackupPort,
    AlternateProposed,
    AlternateAgreed,
    AlternatePort,
}

#[derive(Debug)]
pub(crate) struct RoleTransitions;

impl StateMachine for RoleTransitions {
    type State = RoleTransitionsState;
    const NAME: &'static str = "PRT";

    fn current(engine: &Engine, port: usize, tree: usize) -> Self::State {
        engine.ports[port].trees[tree].prt_state
    }

    fn store(engine: &mut Engine, port: usize, tree: usize, state: Self::State) {
        engine.ports[port].trees[tree].prt_state = state;
    }

    fn begin(_engine: &Engine, _port: usize, _tree: usize) -> Self::State {
        RoleTransitionsState::InitPort
    }

    fn check_conditions(
        engine: &Engine,
        port: usize,
        tree: usize,
        state: Self::State,
    ) -> Option<Self::State> {
        use RoleTransitionsState::*;

        let x = &engine.ports[port].trees[tree];
        let qualified = x.selected && !x.updt_info;
        if qualified && x.role != x.selected_role {
            return Some(match x.selected_role {
                PortRole::Disabled => DisablePort,
                PortRole::Master => MasterPort,
                PortRole::Root => RootPort,
                PortRole::Designated => DesignatedPort,
                PortRole::Alternate | PortRole::Backup => BlockPort,
            });
        }

        match state {
            InitPort => Some(DisablePort),
            MasterProposed | MasterAgreed | MasterSynced | MasterRetired | MasterForward
            | MasterLearn | MasterDiscard => Some(MasterPort),
            RootProposed | RootAgreed | RootSynced | Reroot | RootForward | RootLearn
            | Rerooted => Some(RootPort),
            DesignatedPropose | DesignatedAgreed | DesignatedSynced | DesignatedRetired
            | DesignatedForward | DesignatedLearn | DesignatedDiscard => Some(DesignatedPort),
            BackupPort | AlternateProposed | AlternateAgreed => Some(AlternatePort),
            _ if !qualified => None,
            DisablePort => {
                if !x.learning && !x.forwarding {
                    Some(DisabledPort)
                } else {
                    None
                }
            }
            DisabledPort => {
                if x.fd_while != engine.port_max_age(port) || x.sync || x.re_root || !x.synced {
                    Some(DisabledPort)
                } else {
                    None
                }
            }
            MasterPort => master_exit(engine, port, tree),
            RootPort => root_exit(engine, port, tree),
            DesignatedPort => designated_exit(engine, port, tree),
            BlockPort => {
                if !x.learning && !x.forwarding {
                    Some(AlternatePort)
                } else {
                    None
                }
            }
            AlternatePort => alternate_exit(engine, port, tree),
        }
    }

    fn init_state<H: Host>(
        engine: &mut Engine,
        host: &mut H,
        port: usize,
        tree: usize,
        state: Self::State,
    ) {
        use RoleTransitionsState::*;

        let fwd_delay = engine.fwd_delay(port);
        let max_age = engine.port_max_age(port);
        let forward_delay = engine.forward_delay_for(port);
        let hello = engine.port_hello_time(port);
        let send_rstp = engine.ports[port].send_rstp;

        match state {
            InitPort => {
                set_role(engine, host, port, tree, PortRole::Disabled);
                let x = &mut engine.ports[port].trees[tree];
                x.learn = false;
                x.forward = false;
                x.synced = false;
                x.sync = true;
                x.re_root = true;
                x.rr_while = fwd_delay;
                x.fd_while = max_age;
                x.rb_while = 0;
            }
            DisablePort => {
                set_role(engine, host, port, tree, PortRole::Disabled);
                let x = &mut engine.ports[port].trees[tree];
                x.learn = false;
                x.forward = false;
            }
            DisabledPort => {
                let x = &mut engine.ports[port].trees[tree];
                x.fd_while = max_age;
                x.synced = true;
                x.rr_while = 0;
                x.sync = false;
                x.re_root = false;
            }

            MasterProposed | RootProposed | AlternateProposed => {
                engine.set_sync_tree(tree);
                engine.ports[port].trees[tree].proposed = false;
            }
            MasterAgreed | RootAgreed | DesignatedAgreed | AlternateAgreed => {
                let x = &mut engine.ports[port].trees[tree];
                x.proposed = false;
                if state != AlternateAgreed {
                    x.sync = false;
                }
                x.agree = true;
                if state != MasterAgreed {
                    engine.new_info_xst(port, tree);
                }
            }
            MasterSynced | DesignatedSynced => {
                let x = &mut engine.ports[port].trees[tree];
                x.rr_while = 0;
                x.synced = true;
                x.sync = false;
            }
            RootSynced => {
                let x = &mut engine.ports[port].trees[tree];
                x.synced = true;
                x.sync = false;
            }
            MasterRetired | DesignatedRetired | Rerooted => {
                engine.ports[port].trees[tree].re_root = false;
            }
            MasterForward | DesignatedForward => {
                let x = &mut engine.ports[port].trees[tree];
                x.forward = true;
                x.fd_while = 0;
                x.agreed = send_rstp;
            }
            RootForward => {
                let x = &mut engine.ports[port].trees[tree];
                x.fd_while = 0;
                x.forward = true;
            }
            MasterLearn | RootLearn | DesignatedLearn => {
                let x = &mut engine.ports[port].trees[tree];
                x.learn = true;
                x.fd_while = forward_delay;
            }
            MasterDiscard | DesignatedDiscard => {
                let x = &mut engine.ports[port].trees[tree];
                x.learn = false;
                x.forward = false;
                x.disputed = false;
                x.fd_while = forward_delay;
            }
            MasterPort => set_role(engine, host, port, tree, PortRole::Master),

            Reroot => engine.set_re_root_tree(tree),
            RootPort => {
                set_role(engine, host, port, tree, PortRole::Root);
                engine.ports[port].trees[tree].rr_while = fwd_delay;
            }

            DesignatedPropose => {
                engine.ports[port].trees[tree].proposing = true;
                if tree == CIST {
                    engine.ports[port].edge_delay_while = engine.edge_delay(port);
                }
                engine.new_info_xst(port, tree);
            }
            DesignatedPort => set_role(engine, host, port, tree, PortRole::Designated),

            BlockPort => {
                let role = engine.ports[port].trees[tree].selected_role;
                set_role(engine, host, port, tree, role);
                let x = &mut engine.ports[port].trees[tree];
                x.learn = false;
                x.forward = false;
            }
            BackupPort => engine.ports[port].trees[tree].rb_while = 2 * hello,
            AlternatePort => {
                let x = &mut engine.ports[port].trees[tree];
                x.fd_while = forward_delay;
                x.synced = true;
                x.rr_while = 0;
                x.sync = false;
                x.re_root = false;
            }
        }
    }
}

fn set_role<H: Host>(engine: &mut Engine, host: &mut H, port: usize, tree: usize, role: PortRole) {
    let x = &mut engine.ports[port].trees[tree];
    if x.role == role {
        return;
    }
    debug!(port, tree, from = x.role.as_str(), to = role.as_str(), "port role changed");
    x.role = role;
    host.on_port_role_changed(port, tree, role, engine.now);
}

fn master_exit(engine: &Engine, port: usize, tree: usize) -> Option<RoleTransitionsState> {
    use RoleTransitionsState::*;

    let p = &engine.ports[port];
    let x = &p.trees[tree];
    let all_synced = engine.all_synced(port, tree);
    if x.proposed && !x.agree {
        Some(MasterProposed)
    } else if (all_synced && !x.agree) || (x.proposed && x.agree) {
        Some(MasterAgreed)
    } else if (!x.learning && !x.forwarding && !x.synced)
        || (x.agreed && !x.synced)
        || (p.oper_edge && !x.synced)
        || (x.sync && x.synced)
    {
        Some(MasterSynced)
    } else if x.re_root && x.rr_while == 0 {
        Some(MasterRetired)
    } else if ((x.sync && !x.synced) || (x.re_root && x.rr_while != 0) || x.disputed)
        && !p.oper_edge
        && (x.learn || x.forward)
    {
        Some(MasterDiscard)
    } else if (x.fd_while == 0 || all_synced) && !x.learn && !p.isolate {
        Some(MasterLearn)
    } else if (x.fd_while == 0 || all_synced) && x.learn && !x.forward && !p.isolate {
        Some(MasterForward)
    } else {
        None
    }
}

fn root_exit(engine: &Engine, port: usize, tree: usize) -> Option<RoleTransitionsState> {
    use RoleTransitionsState::*;

    let x = &engine.ports[port].trees[tree];
    let rapid = engine.re_rooted(port, tree) && x.rb_while == 0 && engine.rstp_version();
    if x.proposed && !x.agree {
        Some(RootProposed)
    } else if (engine.all_synced(port, tree) && !x.agree) || (x.proposed && x.agree) {
        Some(RootAgreed)
    } else if (x.agreed && !x.synced) || (x.sync && x.synced) {
        Some(RootSynced)
    } else if !x.forward && !x.re_root {
        Some(Reroot)
    } else if (x.fd_while == 0 || rapid) && !x.learn {
        Some(RootLearn)
    } else if (x.fd_while == 0 || rapid) && x.learn && !x.forward {
        Some(RootForward)
    } else if x.re_root && x.forward {
        Some(Rerooted)
    } else if x.rr_while != engine.fwd_delay(port) {
        Some(RootPort)
    } else {
        None
    }
}

fn designated_exit(engine: &Engine, port: usize, tree: usize) -> Option<RoleTransitionsState> {
    use RoleTransitionsState::*;

    let p = &engine.ports[port];
    let x = &p.trees[tree];
    let may_advance = (x.fd_while == 0 || x.agreed || p.oper_edge)
        && (x.rr_while == 0 || !x.re_root)
        && !x.sync
        && !p.isolate;
    if !x.forward && !x.agreed && !x.proposing && !p.oper_edge {
        Some(DesignatedPropose)
    } else if (engine.all_synced(port, tree) && !x.agree) || (x.proposed && x.agree) {
        Some(DesignatedAgreed)
    } else if (!x.learning && !x.forwarding && !x.synced)
        || (x.agreed && !x.synced)
        || (p.oper_edge && !x.synced)
        || (x.sync && x.synced)
    {
        Some(DesignatedSynced)
    } else if x.re_root && x.rr_while == 0 {
        Some(DesignatedRetired)
    } else if ((x.sync && !x.synced) || (x.re_root && x.rr_while != 0) || x.disputed || p.isolate)
        && !p.oper_edge
        && (x.learn || x.forward)
    {
        Some(DesignatedDiscard)
    } else if may_advance && !x.learn {
        Some(DesignatedLearn)
    } else if may_advance && x.learn && !x.forward {
        Some(DesignatedForward)
    } else {
        None
    }
}

fn alternate_exit(engine: &Engine, port: usize, tree: usize) -> Option<RoleTransitionsState> {
    use RoleTransitionsState::*;

    let x = &engine.ports[port].trees[tree];
    if x.proposed && !x.agree {
        Some(AlternateProposed)
    } else if (engine.all_synced(port, tree) && !x.agree) || (x.proposed && x.agree) {
        Some(AlternateAgreed)
    } else if x.rb_while != 2 * engine.port_hello_time(port) && x.role == PortRole::Backup {
        Some(BackupPort)
    } else if x.fd_while != engine.forward_delay_for(port) || x.sync || x.re_root || !x.synced {
        Some(AlternatePort)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sm::step;
    use crate::sm::testing::{engine, LogHost};

    fn run(engine: &mut Engine, host: &mut LogHost, port: usize) -> Vec<RoleTransitionsState> {
        let mut seen = Vec::new();
        while step::<RoleTransitions, _>(engine, host, port, CIST) {
            seen.push(engine.ports[port].trees[CIST].prt_state);
        }
        seen
    }

    fn select(engine: &mut Engine, port: usize, role: PortRole) {
        let x = &mut engine.ports[port].trees[CIST];
        x.selected_role = role;
        x.selected = true;
        x.updt_info = false;
    }

    #[test]
    fn reset_ends_disabled() {
        let (engine, _host) = engine(1, 0);
        let x = &engine.ports[0].trees[CIST];
        assert_eq!(x.prt_state, RoleTransitionsState::DisabledPort);
        assert!(x.synced && !x.sync && !x.re_root);
        assert_eq!(x.fd_while, engine.max_age);
    }

    #[test]
    fn designated_port_proposes_then_waits() {
        let (mut engine, mut host) = engine(1, 0);
        engine.ports[0].port_enabled = true;
        engine.ports[0].send_rstp = true;
        select(&mut engine, 0, PortRole::Designated);
        let seen = run(&mut engine, &mut host, 0);
        assert_eq!(seen[0], RoleTransitionsState::DesignatedPort);
        assert!(seen.contains(&RoleTransitionsState::DesignatedPropose));
        let x = &engine.ports[0].trees[CIST];
        assert_eq!(x.role, PortRole::Designated);
        assert!(x.proposing);
        assert!(!x.learn && !x.forward);
        assert_eq!(host.calls, vec!["role 0 0 designated".to_string()]);
    }

    #[test]
    fn designated_port_forwards_on_agreement() {
        let (mut engine, mut host) = engine(1, 0);
        engine.ports[0].send_rstp = true;
        select(&mut engine, 0, PortRole::Designated);
        run(&mut engine, &mut host, 0);
        engine.ports[0].trees[CIST].agreed = true;
        run(&mut engine, &mut host, 0);
        let x = &engine.ports[0].trees[CIST];
        assert!(x.learn && x.forward);
        assert_eq!(x.fd_while, 0);
    }

    #[test]
    fn designated_port_forwards_after_two_delays() {
        let (mut engine, mut host) = engine(1, 0);
        engine.ports[0].send_rstp = false;
        select(&mut engine, 0, PortRole::Designated);
        run(&mut engine, &mut host, 0);
        assert!(!engine.ports[0].trees[CIST].learn);

        engine.ports[0].trees[CIST].fd_while = 0;
        run(&mut engine, &mut host, 0);
        let x = &engine.ports[0].trees[CIST];
        assert!(x.learn && !x.forward);
        assert_eq!(x.fd_while, engine.forward_delay);

        engine.ports[0].trees[CIST].fd_while = 0;
        run(&mut engine, &mut host, 0);
        assert!(engine.ports[0].trees[CIST].forward);
    }

    #[test]
    fn isolated_port_does_not_learn() {
        let (mut engine, mut host) = engine(1, 0);
        engine.ports[0].isolate = true;
        select(&mut engine, 0, PortRole::Designated);
        run(&mut engine, &mut host, 0);
        engine.ports[0].trees[CIST].fd_while = 0;
        run(&mut engine, &mut host, 0);
        assert!(!engine.ports[0].trees[CIST].learn);
    }

    #[test]
    fn alternate_port_blocks() {
        let (mut engine, mut host) = engine(1, 0);
        select(&mut engine, 0, PortRole::Alternate);
        let seen = run(&mut engine, &mut host, 0);
        assert_eq!(seen[0], RoleTransitionsState::BlockPort);
        let x = &engine.ports[0].trees[CIST];
        assert_eq!(x.prt_state, RoleTransitionsState::AlternatePort);
        assert_eq!(x.role, PortRole::Alternate);
        assert!(x.synced);
    }

    #[test]
    fn unselected_port_holds_its_role() {
        let (mut engine, mut host) = engine(1, 0);
        select(&mut engine, 0, PortRole::Designated);
        engine.ports[0].trees[CIST].updt_info = true;
        assert!(run(&mut engine, &mut host, 0).is_empty());
        assert_eq!(engine.ports[0].trees[CIST].role, PortRole::Disabled);
    }
}
