//! # Transition Topology
//!
//! Declarative construction of the transition table for one entity kind.
//!
//! A [`TopologyBuilder`] collects `(from, event kind) -> to` rows, each with an
//! optional [`TransitionAction`]. [`TopologyBuilder::install`] validates the
//! table and freezes it into a [`Topology`], which is then shared behind an
//! `Arc` by every [`StateMachine`] of that kind.
//!
//! ```rust
//! use cluster_lifecycle::state_machine::{JobEvent, JobEventType, JobState, TopologyBuilder};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # fn main() -> Result<(), cluster_lifecycle::state_machine::StateMachineError> {
//! let topology = TopologyBuilder::<JobState, JobEvent, ()>::new(JobState::Init)
//!     .add_transition(JobState::Init, JobEventType::InProgress, JobState::InProgress)?
//!     .add_transition(JobState::InProgress, JobEventType::Completed, JobState::Completed)?
//!     .install()?;
//!
//! let mut machine = Arc::new(topology).make("job example");
//! let job_id = Uuid::new_v4();
//! machine.fire(&mut (), &JobEvent::new(job_id, JobEventType::InProgress))?;
//! assert_eq!(machine.current_state(), JobState::InProgress);
//! # Ok(())
//! # }
//! ```

use super::actions::TransitionAction;
use super::errors::{malformed_topology, StateMachineResult};
use super::events::StateMachineEvent;
use super::machine::StateMachine;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Bounds every state type must satisfy to be used in a topology
pub trait MachineState: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> MachineState for T where T: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

/// One registered row of a transition table
pub struct Transition<S, E: StateMachineEvent, O> {
    from: S,
    event_kind: E::Kind,
    to: S,
    action: Option<Arc<dyn TransitionAction<O, E>>>,
}

impl<S: MachineState, E: StateMachineEvent, O> Transition<S, E, O> {
    pub fn from_state(&self) -> S {
        self.from
    }

    pub fn event_kind(&self) -> E::Kind {
        self.event_kind
    }

    pub fn to_state(&self) -> S {
        self.to
    }

    pub fn action(&self) -> Option<&dyn TransitionAction<O, E>> {
        self.action.as_deref()
    }
}

impl<S: MachineState, E: StateMachineEvent, O> fmt::Debug for Transition<S, E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("event_kind", &self.event_kind)
            .field("to", &self.to)
            .field("action", &self.action.as_ref().map(|a| a.description()))
            .finish()
    }
}

/// Mutable builder for a transition table; consumed by [`TopologyBuilder::install`]
pub struct TopologyBuilder<S, E: StateMachineEvent, O> {
    initial_state: S,
    transitions: HashMap<(S, E::Kind), Transition<S, E, O>>,
}

impl<S: MachineState, E: StateMachineEvent, O> TopologyBuilder<S, E, O> {
    /// Begin a topology whose instances start in `initial_state`
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            transitions: HashMap::new(),
        }
    }

    /// Register a transition without an action
    pub fn add_transition(self, from: S, event_kind: E::Kind, to: S) -> StateMachineResult<Self> {
        self.register(from, event_kind, to, None)
    }

    /// Register a transition whose action runs when it fires
    pub fn add_transition_with_action<A>(
        self,
        from: S,
        event_kind: E::Kind,
        to: S,
        action: A,
    ) -> StateMachineResult<Self>
    where
        A: TransitionAction<O, E> + 'static,
    {
        self.register(from, event_kind, to, Some(Arc::new(action)))
    }

    /// Register a transition sharing an already allocated action
    pub fn add_transition_with_shared_action(
        self,
        from: S,
        event_kind: E::Kind,
        to: S,
        action: Arc<dyn TransitionAction<O, E>>,
    ) -> StateMachineResult<Self> {
        self.register(from, event_kind, to, Some(action))
    }

    fn register(
        mut self,
        from: S,
        event_kind: E::Kind,
        to: S,
        action: Option<Arc<dyn TransitionAction<O, E>>>,
    ) -> StateMachineResult<Self> {
        if let Some(existing) = self.transitions.get(&(from, event_kind)) {
            return Err(malformed_topology(format!(
                "duplicate transition for state {from} and event {event_kind} (already targets {})",
                existing.to
            )));
        }

        self.transitions.insert(
            (from, event_kind),
            Transition {
                from,
                event_kind,
                to,
                action,
            },
        );
        Ok(self)
    }

    /// Freeze the table.
    ///
    /// Fails when no transition was registered or when a state named by the
    /// table cannot be reached from the initial state.
    pub fn install(self) -> StateMachineResult<Topology<S, E, O>> {
        if self.transitions.is_empty() {
            return Err(malformed_topology("no transitions registered"));
        }

        let mut adjacency: HashMap<S, Vec<S>> = HashMap::new();
        let mut referenced: HashSet<S> = HashSet::new();
        for transition in self.transitions.values() {
            adjacency
                .entry(transition.from)
                .or_default()
                .push(transition.to);
            referenced.insert(transition.from);
            referenced.insert(transition.to);
        }

        let mut reached = HashSet::from([self.initial_state]);
        let mut queue = VecDeque::from([self.initial_state]);
        while let Some(state) = queue.pop_front() {
            for next in adjacency.get(&state).into_iter().flatten() {
                if reached.insert(*next) {
                    queue.push_back(*next);
                }
            }
        }

        let mut unreachable: Vec<String> = referenced
            .difference(&reached)
            .map(|state| state.to_string())
            .collect();
        if !unreachable.is_empty() {
            unreachable.sort();
            return Err(malformed_topology(format!(
                "states unreachable from initial state {}: {}",
                self.initial_state,
                unreachable.join(", ")
            )));
        }

        Ok(Topology {
            initial_state: self.initial_state,
            transitions: self.transitions,
        })
    }
}

/// Immutable transition table shared by every instance of one entity kind
pub struct Topology<S, E: StateMachineEvent, O> {
    initial_state: S,
    transitions: HashMap<(S, E::Kind), Transition<S, E, O>>,
}

impl<S: MachineState, E: StateMachineEvent, O> Topology<S, E, O> {
    pub fn initial_state(&self) -> S {
        self.initial_state
    }

    /// Look up the transition registered for `(from, event_kind)`
    pub fn transition(&self, from: S, event_kind: E::Kind) -> Option<&Transition<S, E, O>> {
        self.transitions.get(&(from, event_kind))
    }

    /// Target state for `(from, event_kind)`, if registered
    pub fn target_state(&self, from: S, event_kind: E::Kind) -> Option<S> {
        self.transition(from, event_kind).map(Transition::to_state)
    }

    /// Event kinds accepted while in `state`
    pub fn permitted_events(&self, state: S) -> Vec<E::Kind> {
        self.transitions
            .values()
            .filter(|transition| transition.from == state)
            .map(|transition| transition.event_kind)
            .collect()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition<S, E, O>> {
        self.transitions.values()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Create a runtime instance in the initial state, bound to `entity`
    pub fn make(self: &Arc<Self>, entity: impl Into<String>) -> StateMachine<S, E, O> {
        StateMachine::new(Arc::clone(self), entity.into())
    }
}

impl<S: MachineState, E: StateMachineEvent, O> fmt::Debug for Topology<S, E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topology")
            .field("initial_state", &self.initial_state)
            .field("transitions", &self.transitions.len())
            .finish()
    }
}
