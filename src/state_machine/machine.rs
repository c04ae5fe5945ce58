use super::errors::{StateMachineError, StateMachineResult};
use super::events::StateMachineEvent;
use super::topology::{MachineState, Topology};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Per-entity runtime state machine.
///
/// Holds the shared topology of its kind and the entity's current state. It is
/// not synchronized; the owning entity wraps it in its own lock.
pub struct StateMachine<S, E: StateMachineEvent, O> {
    topology: Arc<Topology<S, E, O>>,
    entity: String,
    current_state: S,
}

impl<S: MachineState, E: StateMachineEvent, O> StateMachine<S, E, O> {
    pub(super) fn new(topology: Arc<Topology<S, E, O>>, entity: String) -> Self {
        let current_state = topology.initial_state();
        Self {
            topology,
            entity,
            current_state,
        }
    }

    /// Identity of the owning entity, used in errors and logs
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn current_state(&self) -> S {
        self.current_state
    }

    /// Overwrite the current state without consulting the topology.
    ///
    /// Only meant for restoring a previously captured state.
    pub fn set_state(&mut self, state: S) {
        self.current_state = state;
    }

    pub fn topology(&self) -> &Arc<Topology<S, E, O>> {
        &self.topology
    }

    /// Check whether an event of `event_kind` would be accepted right now
    pub fn can_fire(&self, event_kind: E::Kind) -> bool {
        self.topology
            .transition(self.current_state, event_kind)
            .is_some()
    }

    /// Apply `event` to the current state.
    ///
    /// Runs the transition action (if any) with `owner` before advancing. On an
    /// unregistered `(state, event kind)` pair the state is left untouched.
    pub fn fire(&mut self, owner: &mut O, event: &E) -> StateMachineResult<S> {
        let event_kind = event.kind();
        let Some(transition) = self.topology.transition(self.current_state, event_kind) else {
            return Err(StateMachineError::InvalidTransition {
                entity: self.entity.clone(),
                current_state: self.current_state.to_string(),
                event_kind: event_kind.to_string(),
            });
        };

        if let Some(action) = transition.action() {
            debug!(
                entity = %self.entity,
                event = %event_kind,
                action = action.description(),
                "Executing transition action"
            );
            action.execute(owner, event);
        }

        let target_state = transition.to_state();
        self.current_state = target_state;
        Ok(target_state)
    }
}

impl<S: MachineState, E: StateMachineEvent, O> fmt::Debug for StateMachine<S, E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("entity", &self.entity)
            .field("current_state", &self.current_state)
            .finish()
    }
}
