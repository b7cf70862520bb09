//! UI event types.
//!
//! Everything the reducer reacts to: terminal input, timer ticks, session
//! change notifications and the results of collaborator calls.

use crossterm::event::Event;
use gatehouse_core::auth::{AuthError, Session, SessionChange, SignUpOutcome};

use crate::common::{TaskCompleted, TaskKind};

#[derive(Debug)]
pub enum UiEvent {
    /// Runtime is up and subscribed; time to query the current session.
    Started,

    /// Periodic timer (notification expiry, redraw cadence).
    Tick,

    /// Raw terminal input.
    Terminal(Event),

    /// Backend reported a session change.
    SessionChanged(SessionChange),

    /// Answer to the startup session query.
    SessionLoaded(Result<Option<Session>, AuthError>),

    SignInFinished(Result<(), AuthError>),

    SignUpFinished(Result<SignUpOutcome, AuthError>),

    PasswordResetFinished(Result<(), AuthError>),

    SignOutFinished(Result<(), AuthError>),

    /// Wraps a task result; dropped unless the task is still the active one.
    TaskCompleted {
        kind: TaskKind,
        completed: TaskCompleted<Box<UiEvent>>,
    },
}
