//! Feature slices for the TUI (state/update/render per slice).

pub mod forms;
pub mod notification;
pub mod session;
