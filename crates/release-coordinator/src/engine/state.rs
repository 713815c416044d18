//! Release and task lifecycles.
//!
//! Both entities share the same guard logic: a state and a named transition
//! either produce the next state or an [`IllegalTransition`]. Nothing is
//! written to the store until the guard has accepted the move.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A transition that is not permitted from the entity's current state.
///
/// Callers treat this as a race that a concurrent actor already resolved and
/// discard the attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot {transition} {entity} in state {from}")]
pub struct IllegalTransition {
    pub entity: &'static str,
    pub from: String,
    pub transition: String,
}

/// Shared transition-table behaviour for guarded entities.
pub trait Lifecycle: Copy + Eq + fmt::Display + Sized {
    type Transition: Copy + fmt::Display;

    /// Entity name used in error messages.
    const ENTITY: &'static str;

    /// Look up the transition table. `None` means the move is not allowed.
    fn target(self, transition: Self::Transition) -> Option<Self>;

    /// Terminal states never transition again.
    fn is_terminal(self) -> bool;

    /// Guarded transition.
    fn apply(self, transition: Self::Transition) -> Result<Self, IllegalTransition> {
        self.target(transition)
            .ok_or_else(|| self.illegal(transition))
    }

    /// The error reported when `transition` cannot be taken from this state,
    /// including when a compare-and-set write found the state already moved.
    fn illegal(self, transition: Self::Transition) -> IllegalTransition {
        IllegalTransition {
            entity: Self::ENTITY,
            from: self.to_string(),
            transition: transition.to_string(),
        }
    }

    /// Whether the transition is allowed from this state.
    fn can(self, transition: Self::Transition) -> bool {
        self.target(transition).is_some()
    }
}

/// Release state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseState {
    Waiting,
    Initializing,
    Running,
    Staged,
    Publishing,
    Published,
    Canceling,
    Canceled,
    Failed,
}

/// Named release transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseTransition {
    Initialize,
    Start,
    Stage,
    Publish,
    Complete,
    Cancel,
    Canceled,
    Fail,
}

impl ReleaseState {
    pub const ALL: [ReleaseState; 9] = [
        ReleaseState::Waiting,
        ReleaseState::Initializing,
        ReleaseState::Running,
        ReleaseState::Staged,
        ReleaseState::Publishing,
        ReleaseState::Published,
        ReleaseState::Canceling,
        ReleaseState::Canceled,
        ReleaseState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseState::Waiting => "waiting",
            ReleaseState::Initializing => "initializing",
            ReleaseState::Running => "running",
            ReleaseState::Staged => "staged",
            ReleaseState::Publishing => "publishing",
            ReleaseState::Published => "published",
            ReleaseState::Canceling => "canceling",
            ReleaseState::Canceled => "canceled",
            ReleaseState::Failed => "failed",
        }
    }
}

impl Lifecycle for ReleaseState {
    type Transition = ReleaseTransition;

    const ENTITY: &'static str = "release";

    fn target(self, transition: ReleaseTransition) -> Option<Self> {
        use ReleaseState::*;
        use ReleaseTransition as T;

        match (self, transition) {
            (Waiting, T::Initialize) => Some(Initializing),
            (Initializing, T::Start) => Some(Running),
            (Running, T::Stage) => Some(Staged),
            (Staged, T::Publish) => Some(Publishing),
            (Publishing, T::Complete) => Some(Published),
            (Waiting | Initializing | Running | Staged | Publishing | Canceling, T::Cancel) => {
                Some(Canceling)
            }
            (Canceling, T::Canceled) => Some(Canceled),
            (Waiting | Initializing | Running | Staged | Publishing | Canceling, T::Fail) => {
                Some(Failed)
            }
            _ => None,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(
            self,
            ReleaseState::Published | ReleaseState::Canceled | ReleaseState::Failed
        )
    }
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReleaseState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("Unknown release state: {}", s))
    }
}

impl fmt::Display for ReleaseTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReleaseTransition::Initialize => "initialize",
            ReleaseTransition::Start => "start",
            ReleaseTransition::Stage => "stage",
            ReleaseTransition::Publish => "publish",
            ReleaseTransition::Complete => "complete",
            ReleaseTransition::Cancel => "cancel",
            ReleaseTransition::Canceled => "mark canceled",
            ReleaseTransition::Fail => "fail",
        };
        f.write_str(s)
    }
}

/// Task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Waiting,
    Initialized,
    Running,
    Staged,
    Publishing,
    Published,
    Rejected,
    Failed,
    Canceled,
}

/// Named task transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTransition {
    Initialize,
    Start,
    Stage,
    Publish,
    Complete,
    Reject,
    Fail,
    Cancel,
}

impl TaskState {
    pub const ALL: [TaskState; 9] = [
        TaskState::Waiting,
        TaskState::Initialized,
        TaskState::Running,
        TaskState::Staged,
        TaskState::Publishing,
        TaskState::Published,
        TaskState::Rejected,
        TaskState::Failed,
        TaskState::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Waiting => "waiting",
            TaskState::Initialized => "initialized",
            TaskState::Running => "running",
            TaskState::Staged => "staged",
            TaskState::Publishing => "publishing",
            TaskState::Published => "published",
            TaskState::Rejected => "rejected",
            TaskState::Failed => "failed",
            TaskState::Canceled => "canceled",
        }
    }

    /// Failed, canceled or rejected: the task can no longer contribute to
    /// its release.
    pub fn is_unsuccessful(&self) -> bool {
        matches!(
            self,
            TaskState::Failed | TaskState::Canceled | TaskState::Rejected
        )
    }
}

impl Lifecycle for TaskState {
    type Transition = TaskTransition;

    const ENTITY: &'static str = "task";

    fn target(self, transition: TaskTransition) -> Option<Self> {
        use TaskState::*;
        use TaskTransition as T;

        if self.is_terminal() {
            return None;
        }

        match (self, transition) {
            (Waiting, T::Initialize) => Some(Initialized),
            (Initialized, T::Start) => Some(Running),
            (Running, T::Stage) => Some(Staged),
            (Staged, T::Publish) => Some(Publishing),
            (Publishing, T::Complete) => Some(Published),
            (Waiting, T::Reject) => Some(Rejected),
            (_, T::Fail) => Some(Failed),
            (_, T::Cancel) => Some(Canceled),
            _ => None,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Published | TaskState::Failed | TaskState::Canceled | TaskState::Rejected
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("Unknown task state: {}", s))
    }
}

impl fmt::Display for TaskTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskTransition::Initialize => "initialize",
            TaskTransition::Start => "start",
            TaskTransition::Stage => "stage",
            TaskTransition::Publish => "publish",
            TaskTransition::Complete => "complete",
            TaskTransition::Reject => "reject",
            TaskTransition::Fail => "fail",
            TaskTransition::Cancel => "cancel",
        };
        f.write_str(s)
    }
}
