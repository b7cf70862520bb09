//! Session controller.
//!
//! Holds the cached session and the view selector. Session presence always
//! wins: a present session forces `Account`, an absent one forces `Auth`
//! whenever the backend reports a change. The only local navigation is
//! between `Auth` and `PasswordReset` while signed out.

use gatehouse_core::auth::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Auth,
    Account,
    PasswordReset,
}

#[derive(Debug, Default)]
pub struct SessionState {
    session: Option<Session>,
    view: View,
    /// Set once a change notification has been applied. A startup answer
    /// arriving after that is older than what we already show.
    change_applied: bool,
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Applies the startup query result. Returns false if it was discarded.
    pub fn on_startup(&mut self, session: Option<Session>) -> bool {
        if self.change_applied {
            return false;
        }
        self.set_session(session);
        true
    }

    /// Applies a change notification, overriding any manual navigation.
    pub fn on_session_changed(&mut self, session: Option<Session>) {
        self.change_applied = true;
        self.set_session(session);
    }

    /// `Auth` to `PasswordReset`. Returns whether the view changed.
    pub fn request_password_reset(&mut self) -> bool {
        if self.session.is_some() || self.view != View::Auth {
            return false;
        }
        self.view = View::PasswordReset;
        true
    }

    /// `PasswordReset` back to `Auth`. Returns whether the view changed.
    pub fn back(&mut self) -> bool {
        if self.view != View::PasswordReset {
            return false;
        }
        self.view = View::Auth;
        true
    }

    fn set_session(&mut self, session: Option<Session>) {
        self.view = if session.is_some() {
            View::Account
        } else {
            View::Auth
        };
        self.session = session;
    }
}
