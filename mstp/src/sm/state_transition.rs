//! Port State Transition state machine (13.36).

use serde::Serialize;

use super::StateMachine;
use crate::bridge::Engine;
use crate::host::Host;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum StateTransitionState {
    Discarding,
    Learning,
    Forwarding,
}

#[derive(Debug)]
pub(crate) struct StateTransition;

impl StateMachine for StateTransition {
    type State = StateTransitionState;
    const NAME: &'static str = "PST";

    fn current(engine: &Engine, port: usize, tree: usize) -> Self::State {
        engine.ports[port].trees[tree].pst_state
    }

    fn store(engine: &mut Engine, port: usize, tree: usize, state: Self::State) {
        engine.ports[port].trees[tree].pst_state = state;
    }

    fn begin(_engine: &Engine, _port: usize, _tree: usize) -> Self::State {
        StateTransitionState::Discarding
    }

    fn check_conditions(
        engine: &Engine,
        port: usize,
        tree: usize,
        state: Self::State,
    ) -> Option<Self::State> {
        use StateTransitionState::*;

        let x = &engine.ports[port].trees[tree];
        match state {
            Discarding if x.learn => Some(Learning),
            Learning if !x.learn => Some(Discarding),
            Learning if x.forward => Some(Forwarding),
            Forwarding if !x.forward => Some(Discarding),
            _ => None,
        }
    }

    fn init_state<H: Host>(
        engine: &mut Engine,
        host: &mut H,
        port: usize,
        tree: usize,
        state: Self::State,
    ) {
        let now = engine.now;
        let x = &mut engine.ports[port].trees[tree];
        match state {
            StateTransitionState::Discarding => {
                host.enable_learning(port, tree, false, now);
                x.learning = false;
                host.enable_forwarding(port, tree, false, now);
                x.forwarding = false;
            }
            StateTransitionState::Learning => {
                host.enable_learning(port, tree, true, now);
                x.learning = true;
            }
            StateTransitionState::Forwarding => {
                host.enable_forwarding(port, tree, true, now);
                x.forwarding = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sm::step;
    use crate::sm::testing::engine;

    #[test]
    fn follows_learn_and_forward() {
        let (mut engine, mut host) = engine(1, 1);
        engine.ports[0].trees[1].learn = true;
        assert!(step::<StateTransition, _>(&mut engine, &mut host, 0, 1));
        engine.ports[0].trees[1].forward = true;
        assert!(step::<StateTransition, _>(&mut engine, &mut host, 0, 1));
        assert!(engine.ports[0].trees[1].forwarding);
        assert!(!engine.ports[0].trees[0].learning);

        engine.ports[0].trees[1].learn = false;
        engine.ports[0].trees[1].forward = false;
        assert!(step::<StateTransition, _>(&mut engine, &mut host, 0, 1));
        assert!(!step::<StateTransition, _>(&mut engine, &mut host, 0, 1));
        assert_eq!(
            host.calls,
            vec!["learn 0 1 true", "forward 0 1 true", "learn 0 1 false", "forward 0 1 false"]
        );
    }
}
