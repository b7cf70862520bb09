//! Application state composition.
//!
//! ```text
//! AppState
//! ├── session: SessionState        (cached session + view selector)
//! ├── auth_form: AuthForm          (email/password + focus)
//! ├── reset_form: ResetForm        (email + focus)
//! ├── notification: NotificationState
//! ├── task_seq: TaskSeq            (async task id generator)
//! ├── tasks: Tasks                 (busy flags per collaborator call)
//! └── options: UiOptions
//! ```

use crate::common::{TaskSeq, Tasks};
use crate::features::forms::{AuthForm, ResetForm};
use crate::features::notification::NotificationState;
use crate::features::session::SessionState;

/// Static settings the UI needs from the caller.
#[derive(Debug, Clone, Default)]
pub struct UiOptions {
    /// Shown in the header, e.g. the service host.
    pub backend_label: String,
    /// Passed along with password reset requests.
    pub reset_redirect: Option<String>,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub should_quit: bool,
    pub session: SessionState,
    pub auth_form: AuthForm,
    pub reset_form: ResetForm,
    pub notification: NotificationState,
    pub task_seq: TaskSeq,
    pub tasks: Tasks,
    pub options: UiOptions,
}

impl AppState {
    pub fn new(options: UiOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}
