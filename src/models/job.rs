//! # Job
//!
//! A reusable slot tracking one orchestration action. A finished job (COMPLETED
//! or FAILED) returns to INIT on re-init rather than being discarded, so callers
//! that need history must record each transition themselves.

use crate::error::{LifecycleError, Result};
use crate::logging::{
    log_invalid_transition, log_misaddressed_event, log_state_restored, log_state_transition,
};
use crate::state_machine::actions::{
    FinishJobAction, RecordJobProgressAction, ResetJobAction, StartJobAction,
};
use crate::state_machine::errors::StateMachineResult;
use crate::state_machine::events::{JobEvent, JobEventType, StateMachineEvent};
use crate::state_machine::machine::StateMachine;
use crate::state_machine::states::JobState;
use crate::state_machine::topology::{Topology, TopologyBuilder};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

pub type JobTopology = Topology<JobState, JobEvent, JobTimeline>;

static JOB_TOPOLOGY: OnceLock<Arc<JobTopology>> = OnceLock::new();

/// Timing facts maintained by job transition actions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTimeline {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Progress pings received since the run started
    pub progress_updates: u64,
}

/// Build the job transition table
pub fn build_job_topology() -> StateMachineResult<JobTopology> {
    use JobEventType as Event;

    TopologyBuilder::<JobState, JobEvent, JobTimeline>::new(JobState::Init)
        .add_transition_with_action(
            JobState::Init,
            Event::InProgress,
            JobState::InProgress,
            StartJobAction,
        )?
        .add_transition_with_action(
            JobState::InProgress,
            Event::InProgress,
            JobState::InProgress,
            RecordJobProgressAction,
        )?
        .add_transition_with_action(
            JobState::InProgress,
            Event::Completed,
            JobState::Completed,
            FinishJobAction,
        )?
        .add_transition_with_action(
            JobState::InProgress,
            Event::Failed,
            JobState::Failed,
            FinishJobAction,
        )?
        .add_transition_with_action(JobState::Completed, Event::Init, JobState::Init, ResetJobAction)?
        .add_transition_with_action(JobState::Failed, Event::Init, JobState::Init, ResetJobAction)?
        .install()
}

/// Shared job topology, built on first use
pub fn job_topology() -> &'static Arc<JobTopology> {
    JOB_TOPOLOGY.get_or_init(|| {
        Arc::new(build_job_topology().expect("job lifecycle topology must be well formed"))
    })
}

struct JobInner {
    state_machine: StateMachine<JobState, JobEvent, JobTimeline>,
    timeline: JobTimeline,
}

/// Thread-safe job slot
pub struct Job {
    job_id: Uuid,
    inner: RwLock<JobInner>,
}

impl Job {
    /// Create a job slot with a fresh identifier
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(job_id: Uuid) -> Self {
        Self {
            job_id,
            inner: RwLock::new(JobInner {
                state_machine: job_topology().make(format!("job {job_id}")),
                timeline: JobTimeline::default(),
            }),
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn state(&self) -> JobState {
        self.inner.read().state_machine.current_state()
    }

    /// Overwrite the state without validation (snapshot restore)
    pub fn set_state(&self, state: JobState) {
        let mut inner = self.inner.write();
        let previous = inner.state_machine.current_state();
        inner.state_machine.set_state(state);
        log_state_restored("job", &self.job_id.to_string(), previous, state);
    }

    pub fn timeline(&self) -> JobTimeline {
        self.inner.read().timeline.clone()
    }

    /// Build an event addressed to this job
    pub fn event(&self, kind: JobEventType) -> JobEvent {
        JobEvent::new(self.job_id, kind)
    }

    pub fn handle_event(&self, event: &JobEvent) -> Result<JobState> {
        if event.job_id != self.job_id {
            log_misaddressed_event("job", &self.job_id.to_string(), &event.job_id.to_string(), event.kind());
            return Err(LifecycleError::misaddressed(
                format!("job {}", self.job_id),
                format!("job {}", event.job_id),
            ));
        }

        let mut guard = self.inner.write();
        let JobInner {
            state_machine,
            timeline,
        } = &mut *guard;
        let previous = state_machine.current_state();

        match state_machine.fire(timeline, event) {
            Ok(state) => {
                log_state_transition("job", &self.job_id.to_string(), previous, state, event.kind());
                Ok(state)
            }
            Err(e) => {
                log_invalid_transition("job", &self.job_id.to_string(), previous, event.kind());
                Err(e.into())
            }
        }
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("job_id", &self.job_id)
            .field("state", &self.state())
            .finish()
    }
}
