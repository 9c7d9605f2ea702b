//! The state machines of IEEE 802.1Q clause 13.
//!
//! Every machine follows the same discipline. `check_conditions` looks at the
//! current state and the bridge variables and names the next state, if any,
//! without changing anything. `init_state` performs the entry actions of a
//! state exactly once. The driving loop in [`crate::bridge`] alternates the
//! two for every machine instance until none of them moves.
//!
//! Global transitions, those the standard draws from any state, are tested
//! before the exits of the current state. The standard's BEGIN is replaced by
//! [`StateMachine::begin`], which names the state a machine starts in after a
//! reset.
//!
//! Per-port machines ignore the tree argument and per-tree machines ignore the
//! port argument.

use core::fmt;

use tracing::trace;

use crate::bridge::Engine;
use crate::host::Host;

pub(crate) mod bridge_detection;
pub(crate) mod port_information;
pub(crate) mod port_receive;
pub(crate) mod port_transmit;
pub(crate) mod protocol_migration;
pub(crate) mod role_selection;
pub(crate) mod role_transitions;
pub(crate) mod state_transition;
pub(crate) mod topology_change;

pub(crate) trait StateMachine {
    type State: Copy + Eq + fmt::Debug;

    /// Name used in trace events.
    const NAME: &'static str;

    fn current(engine: &Engine, port: usize, tree: usize) -> Self::State;

    fn store(engine: &mut Engine, port: usize, tree: usize, state: Self::State);

    /// The state entered on reset.
    fn begin(engine: &Engine, port: usize, tree: usize) -> Self::State;

    fn check_conditions(
        engine: &Engine,
        port: usize,
        tree: usize,
        state: Self::State,
    ) -> Option<Self::State>;

    fn init_state<H: Host>(
        engine: &mut Engine,
        host: &mut H,
        port: usize,
        tree: usize,
        state: Self::State,
    );
}

/// Enter the reset state of one machine instance.
pub(crate) fn begin<M: StateMachine, H: Host>(
    engine: &mut Engine,
    host: &mut H,
    port: usize,
    tree: usize,
) {
    let state = M::begin(engine, port, tree);
    M::store(engine, port, tree, state);
    M::init_state(engine, host, port, tree, state);
}

/// Take at most one transition of one machine instance. Returns whether it moved.
pub(crate) fn step<M: StateMachine, H: Host>(
    engine: &mut Engine,
    host: &mut H,
    port: usize,
    tree: usize,
) -> bool {
    let from = M::current(engine, port, tree);
    match M::check_conditions(engine, port, tree, from) {
        Some(to) => {
            trace!(machine = M::NAME, port, tree, ?from, ?to, "transition");
            M::store(engine, port, tree, to);
            M::init_state(engine, host, port, tree, to);
            true
        }
        None => false,
    }
}
