//! Full-screen sign-in UI for gatehouse.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod panels;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr, stdout};
use std::sync::Arc;

use anyhow::Result;
use gatehouse_core::auth::AuthBackend;
pub use runtime::{Dispatcher, TuiRuntime};
pub use state::UiOptions;

/// Runs the interactive UI until the user quits.
///
/// # Errors
/// Returns an error if stdout is not a terminal or the terminal fails.
pub async fn run_interactive(options: UiOptions, backend: Arc<dyn AuthBackend>) -> Result<()> {
    if !stdout().is_terminal() {
        anyhow::bail!(
            "The interactive UI requires a terminal.\n\
             Use `gatehouse status`, `gatehouse login` or `gatehouse logout` instead."
        );
    }

    let mut runtime = TuiRuntime::new(options, backend)?;
    runtime.run()?;
    drop(runtime);

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
