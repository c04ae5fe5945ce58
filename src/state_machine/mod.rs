// State machine module for entity lifecycles
//
// A topology is an immutable transition table shared by every entity of one
// kind; each entity drives its own StateMachine over it.

pub mod actions;
pub mod errors;
pub mod events;
pub mod machine;
pub mod states;
pub mod topology;

// Re-export main types for convenient access
pub use actions::TransitionAction;
pub use errors::{StateMachineError, StateMachineResult};
pub use events::{
    JobEvent, JobEventType, NodeEvent, NodeEventPayload, NodeEventType,
    ServiceComponentHostEvent, ServiceComponentHostEventType, StateMachineEvent,
};
pub use machine::StateMachine;
pub use states::{JobState, NodeState, ServiceComponentHostState};
pub use topology::{MachineState, Topology, TopologyBuilder, Transition};
