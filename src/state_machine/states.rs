use serde::{Deserialize, Serialize};
use std::fmt;

/// Registration and health status of a physical host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Host has not contacted the server yet
    Init,
    /// Registration received, verification pending
    WaitingForVerification,
    /// Host is verified and its last heartbeat reported healthy
    Healthy,
    /// Last heartbeat reported a problem on the host
    Unhealthy,
    /// No heartbeat was received within the expected interval
    HeartbeatLost,
}

impl NodeState {
    pub const ALL: [NodeState; 5] = [
        Self::Init,
        Self::WaitingForVerification,
        Self::Healthy,
        Self::Unhealthy,
        Self::HeartbeatLost,
    ];

    /// Check if the host can be scheduled work
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Check if the host finished registration at least once
    pub fn is_registered(&self) -> bool {
        !matches!(self, Self::Init | Self::WaitingForVerification)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::WaitingForVerification => write!(f, "waiting_for_verification"),
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::HeartbeatLost => write!(f, "heartbeat_lost"),
        }
    }
}

impl std::str::FromStr for NodeState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "init" => Ok(Self::Init),
            "waiting_for_verification" => Ok(Self::WaitingForVerification),
            "healthy" => Ok(Self::Healthy),
            "unhealthy" => Ok(Self::Unhealthy),
            "heartbeat_lost" => Ok(Self::HeartbeatLost),
            _ => Err(format!("Invalid node state: {s}")),
        }
    }
}

/// Progress of a single orchestration action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Slot is idle and ready to run
    Init,
    /// Action is running on the target
    InProgress,
    /// Action finished successfully
    Completed,
    /// Action finished with an error
    Failed,
}

impl JobState {
    pub const ALL: [JobState; 4] = [Self::Init, Self::InProgress, Self::Completed, Self::Failed];

    /// Check if the job reached an outcome and can only be re-initialized
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "init" => Ok(Self::Init),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid job state: {s}")),
        }
    }
}

/// Install/start/stop progress of one service component placed on one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceComponentHostState {
    Init,
    Installing,
    InstallFailed,
    Installed,
    Starting,
    StartFailed,
    Started,
    Stopping,
    StopFailed,
    Uninstalling,
    UninstallFailed,
    Uninstalled,
    /// Declared but no transition leads here
    WipingOut,
    /// Declared but no transition leads here
    WipeoutFailed,
}

impl ServiceComponentHostState {
    pub const ALL: [ServiceComponentHostState; 14] = [
        Self::Init,
        Self::Installing,
        Self::InstallFailed,
        Self::Installed,
        Self::Starting,
        Self::StartFailed,
        Self::Started,
        Self::Stopping,
        Self::StopFailed,
        Self::Uninstalling,
        Self::UninstallFailed,
        Self::Uninstalled,
        Self::WipingOut,
        Self::WipeoutFailed,
    ];

    /// Check if the last operation on this component failed
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            Self::InstallFailed
                | Self::StartFailed
                | Self::StopFailed
                | Self::UninstallFailed
                | Self::WipeoutFailed
        )
    }

    /// Check if an operation is currently running on this component
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::Installing
                | Self::Starting
                | Self::Stopping
                | Self::Uninstalling
                | Self::WipingOut
        )
    }
}

impl fmt::Display for ServiceComponentHostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Installing => "installing",
            Self::InstallFailed => "install_failed",
            Self::Installed => "installed",
            Self::Starting => "starting",
            Self::StartFailed => "start_failed",
            Self::Started => "started",
            Self::Stopping => "stopping",
            Self::StopFailed => "stop_failed",
            Self::Uninstalling => "uninstalling",
            Self::UninstallFailed => "uninstall_failed",
            Self::Uninstalled => "uninstalled",
            Self::WipingOut => "wiping_out",
            Self::WipeoutFailed => "wipeout_failed",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ServiceComponentHostState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|state| state.to_string() == lowered)
            .ok_or_else(|| format!("Invalid service component host state: {s}"))
    }
}

/// Default state for new hosts
impl Default for NodeState {
    fn default() -> Self {
        Self::Init
    }
}

/// Default state for new jobs
impl Default for JobState {
    fn default() -> Self {
        Self::Init
    }
}

/// Default state for new service component hosts
impl Default for ServiceComponentHostState {
    fn default() -> Self {
        Self::Init
    }
}
