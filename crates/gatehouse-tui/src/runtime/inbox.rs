//! Inbox channel types.
//!
//! Every async source (task completions, session change notifications)
//! sends `UiEvent`s into one unbounded channel that the runtime drains each
//! frame.

use gatehouse_core::auth::SessionListener;
use tokio::sync::mpsc;

use crate::events::UiEvent;

pub type UiEventSender = mpsc::UnboundedSender<UiEvent>;
pub type UiEventReceiver = mpsc::UnboundedReceiver<UiEvent>;

/// Forwards backend session changes into the inbox.
///
/// Sending fails only once the runtime is gone, at which point the change
/// has nowhere to go.
pub fn session_listener(tx: UiEventSender) -> SessionListener {
    Box::new(move |change| {
        let _ = tx.send(UiEvent::SessionChanged(change.clone()));
    })
}
