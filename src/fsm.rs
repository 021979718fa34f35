use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("no transition from {state:?} on {activator:?}")]
pub struct TransitionError<S: Debug> {
    pub state: S,
    pub activator: char,
}

/// A deterministic automaton whose edges are labeled with single characters.
#[derive(Clone, Debug)]
pub struct Fsm<S> {
    transitions: HashMap<(S, char), S>,
    initial: S,
    current: S,
}

impl<S: Copy + Eq + Hash + Debug> Fsm<S> {
    pub fn new(initial: S) -> Self {
        Self {
            transitions: HashMap::new(),
            initial,
            current: initial,
        }
    }

    pub fn set_initial_state(&mut self, state: S) {
        self.initial = state;
        self.reset();
    }

    pub fn add_transition(&mut self, from: S, to: S, activator: char) {
        self.transitions.insert((from, activator), to);
    }

    /// Follow the edge labeled `activator` out of the current state.
    ///
    /// # Errors
    /// If the current state has no such edge. The current state is left unchanged.
    pub fn transition(&mut self, activator: char) -> Result<S, TransitionError<S>> {
        let next = *self
            .transitions
            .get(&(self.current, activator))
            .ok_or(TransitionError {
                state: self.current,
                activator,
            })?;
        self.current = next;
        Ok(next)
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    pub fn current(&self) -> S {
        self.current
    }
}
