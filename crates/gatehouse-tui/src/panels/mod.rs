//! Panel content builders.
//!
//! Each panel turns the slice of state it needs into lines; `render` decides
//! which one is shown and where.

pub mod account;
pub mod auth;
pub mod password_reset;
pub mod render_utils;

pub use account::account_panel_lines;
pub use auth::auth_panel_lines;
pub use password_reset::reset_panel_lines;
pub use render_utils::InputHint;

pub const AUTH_HINTS: &[InputHint<'static>] = &[
    InputHint::new("Tab", "next"),
    InputHint::new("Enter", "select"),
    InputHint::new("Esc", "dismiss"),
    InputHint::new("Ctrl+C", "quit"),
];

pub const ACCOUNT_HINTS: &[InputHint<'static>] = &[
    InputHint::new("Enter", "sign out"),
    InputHint::new("Esc", "dismiss"),
    InputHint::new("Ctrl+C", "quit"),
];

pub const RESET_HINTS: &[InputHint<'static>] = &[
    InputHint::new("Tab", "next"),
    InputHint::new("Enter", "select"),
    InputHint::new("Esc", "back"),
    InputHint::new("Ctrl+C", "quit"),
];
