use crate::models::node::HostInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

/// An occurrence delivered to a state machine.
///
/// The machine dispatches on [`StateMachineEvent::kind`]; the rest of the value
/// is payload handed to the transition action.
pub trait StateMachineEvent {
    type Kind: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

/// Kinds of events that drive the host lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeEventType {
    RegistrationRequest,
    Verified,
    HeartbeatHealthy,
    HeartbeatTimedOut,
    HeartbeatUnhealthy,
}

impl NodeEventType {
    pub const ALL: [NodeEventType; 5] = [
        Self::RegistrationRequest,
        Self::Verified,
        Self::HeartbeatHealthy,
        Self::HeartbeatTimedOut,
        Self::HeartbeatUnhealthy,
    ];

    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RegistrationRequest => "node_registration_request",
            Self::Verified => "node_verified",
            Self::HeartbeatHealthy => "node_heartbeat_healthy",
            Self::HeartbeatTimedOut => "node_heartbeat_timed_out",
            Self::HeartbeatUnhealthy => "node_heartbeat_unhealthy",
        }
    }
}

impl fmt::Display for NodeEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

impl std::str::FromStr for NodeEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.event_type() == lowered)
            .ok_or_else(|| format!("Invalid node event type: {s}"))
    }
}

/// Payload carried by a host event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum NodeEventPayload {
    /// Host contacted the server and reported its hardware
    RegistrationRequest(HostInfo),
    /// Host passed verification
    Verified,
    HeartbeatHealthy,
    HeartbeatTimedOut,
    /// Heartbeat arrived but the host reported a problem
    HeartbeatUnhealthy { reason: String },
}

/// Event addressed to one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEvent {
    pub hostname: String,
    pub timestamp: DateTime<Utc>,
    pub payload: NodeEventPayload,
}

impl NodeEvent {
    pub fn new(hostname: impl Into<String>, payload: NodeEventPayload) -> Self {
        Self {
            hostname: hostname.into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn registration_request(hostname: impl Into<String>, host_info: HostInfo) -> Self {
        Self::new(hostname, NodeEventPayload::RegistrationRequest(host_info))
    }

    pub fn verified(hostname: impl Into<String>) -> Self {
        Self::new(hostname, NodeEventPayload::Verified)
    }

    pub fn heartbeat_healthy(hostname: impl Into<String>) -> Self {
        Self::new(hostname, NodeEventPayload::HeartbeatHealthy)
    }

    pub fn heartbeat_timed_out(hostname: impl Into<String>) -> Self {
        Self::new(hostname, NodeEventPayload::HeartbeatTimedOut)
    }

    pub fn heartbeat_unhealthy(hostname: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            hostname,
            NodeEventPayload::HeartbeatUnhealthy {
                reason: reason.into(),
            },
        )
    }

    /// Override the event timestamp (replayed or externally stamped events)
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl StateMachineEvent for NodeEvent {
    type Kind = NodeEventType;

    fn kind(&self) -> NodeEventType {
        match self.payload {
            NodeEventPayload::RegistrationRequest(_) => NodeEventType::RegistrationRequest,
            NodeEventPayload::Verified => NodeEventType::Verified,
            NodeEventPayload::HeartbeatHealthy => NodeEventType::HeartbeatHealthy,
            NodeEventPayload::HeartbeatTimedOut => NodeEventType::HeartbeatTimedOut,
            NodeEventPayload::HeartbeatUnhealthy { .. } => NodeEventType::HeartbeatUnhealthy,
        }
    }
}

/// Kinds of events that drive a job slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobEventType {
    Init,
    InProgress,
    Completed,
    Failed,
}

impl JobEventType {
    pub const ALL: [JobEventType; 4] = [Self::Init, Self::InProgress, Self::Completed, Self::Failed];

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Init => "job_init",
            Self::InProgress => "job_in_progress",
            Self::Completed => "job_completed",
            Self::Failed => "job_failed",
        }
    }
}

impl fmt::Display for JobEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

impl std::str::FromStr for JobEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.event_type() == lowered)
            .ok_or_else(|| format!("Invalid job event type: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEvent {
    pub job_id: Uuid,
    pub kind: JobEventType,
    pub timestamp: DateTime<Utc>,
}

impl JobEvent {
    pub fn new(job_id: Uuid, kind: JobEventType) -> Self {
        Self {
            job_id,
            kind,
            timestamp: Utc::now(),
        }
    }
}

impl StateMachineEvent for JobEvent {
    type Kind = JobEventType;

    fn kind(&self) -> JobEventType {
        self.kind
    }
}

/// Kinds of events that drive a service component host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceComponentHostEventType {
    /// Progress report for the running operation
    OpInProgress,
    OpSucceeded,
    OpFailed,
    /// Retry the failed operation
    OpRestart,
    Install,
    Start,
    Stop,
    Uninstall,
    Wipeout,
}

impl ServiceComponentHostEventType {
    pub const ALL: [ServiceComponentHostEventType; 9] = [
        Self::OpInProgress,
        Self::OpSucceeded,
        Self::OpFailed,
        Self::OpRestart,
        Self::Install,
        Self::Start,
        Self::Stop,
        Self::Uninstall,
        Self::Wipeout,
    ];

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OpInProgress => "op_in_progress",
            Self::OpSucceeded => "op_succeeded",
            Self::OpFailed => "op_failed",
            Self::OpRestart => "op_restart",
            Self::Install => "install",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Uninstall => "uninstall",
            Self::Wipeout => "wipeout",
        }
    }

    /// Check if this event is a user command rather than an operation report
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Self::Install | Self::Start | Self::Stop | Self::Uninstall | Self::Wipeout
        )
    }
}

impl fmt::Display for ServiceComponentHostEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

impl std::str::FromStr for ServiceComponentHostEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.event_type() == lowered)
            .ok_or_else(|| format!("Invalid service component host event type: {s}"))
    }
}

/// Event addressed to one component on one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceComponentHostEvent {
    pub service_component: String,
    pub host_name: String,
    pub kind: ServiceComponentHostEventType,
    pub timestamp: DateTime<Utc>,
    /// Operation output, e.g. the failure reason of an OP_FAILED report
    pub message: Option<String>,
}

impl ServiceComponentHostEvent {
    pub fn new(
        service_component: impl Into<String>,
        host_name: impl Into<String>,
        kind: ServiceComponentHostEventType,
    ) -> Self {
        Self {
            service_component: service_component.into(),
            host_name: host_name.into(),
            kind,
            timestamp: Utc::now(),
            message: None,
        }
    }

    /// Create an OP_FAILED event with the given failure reason
    pub fn op_failed(
        service_component: impl Into<String>,
        host_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            service_component,
            host_name,
            ServiceComponentHostEventType::OpFailed,
        )
        .with_message(reason)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl StateMachineEvent for ServiceComponentHostEvent {
    type Kind = ServiceComponentHostEventType;

    fn kind(&self) -> ServiceComponentHostEventType {
        self.kind
    }
}
