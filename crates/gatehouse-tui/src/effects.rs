//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! Each collaborator call carries the task id the reducer registered for it,
//! so the completion can be matched back.

use gatehouse_core::auth::Credentials;

use crate::common::TaskId;

#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Ask the backend for the current session.
    LoadSession { task: TaskId },

    SignIn {
        task: TaskId,
        credentials: Credentials,
    },

    SignUp {
        task: TaskId,
        credentials: Credentials,
    },

    RequestPasswordReset {
        task: TaskId,
        email: String,
        redirect_url: Option<String>,
    },

    SignOut { task: TaskId },
}
