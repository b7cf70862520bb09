//! TUI runtime - owns terminal, runs event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here.
//! The reducer stays pure and produces effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! - Spawned handlers and the session subscription send `UiEvent`s to `inbox_tx`
//! - The runtime drains `inbox_rx` each frame
//!
//! Structure:
//! - `mod.rs`: `TuiRuntime` (terminal, event loop) around `Dispatcher`
//!   (state, backend, inbox, effect dispatch)
//! - `inbox.rs`: Inbox channel types
//! - `handlers.rs`: Backend calls as async functions returning `UiEvent`

mod handlers;
mod inbox;

use std::future::Future;
use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use gatehouse_core::auth::{AuthBackend, Subscription};
use gatehouse_core::interrupt;
use inbox::{UiEventReceiver, UiEventSender};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::common::{TaskCompleted, TaskId, TaskKind};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, UiOptions};
use crate::{render, terminal, update};

/// Poll duration while something is in flight or the user is typing.
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll duration when idle. Longer timeout reduces CPU usage.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// State, backend and inbox, without a terminal.
///
/// Holds the session subscription for as long as it lives; dropping it
/// releases the subscription.
pub struct Dispatcher {
    pub state: AppState,
    backend: Arc<dyn AuthBackend>,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    subscription: Option<Subscription>,
}

impl Dispatcher {
    /// Creates the dispatcher and subscribes to session changes.
    ///
    /// The subscription is registered before the startup query is sent, so
    /// no change can slip between the two.
    pub fn new(options: UiOptions, backend: Arc<dyn AuthBackend>) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let subscription = backend.subscribe(inbox::session_listener(inbox_tx.clone()));
        Self {
            state: AppState::new(options),
            backend,
            inbox_tx,
            inbox_rx,
            subscription: Some(subscription),
        }
    }

    /// Sends `Started` through the reducer, which queries the session.
    pub fn start(&mut self) {
        self.dispatch_event(UiEvent::Started);
    }

    /// Releases the session subscription. Later changes are not delivered.
    pub fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            debug!("session subscription released");
        }
    }

    pub fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        self.execute_effects(effects);
    }

    /// Drains all events currently in the inbox.
    fn collect_inbox_events(&mut self, events: &mut Vec<UiEvent>) {
        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }
    }

    /// Waits for the next inbox event and runs it through the reducer.
    ///
    /// Returns false once the inbox is closed.
    pub async fn process_next(&mut self) -> bool {
        match self.inbox_rx.recv().await {
            Some(event) => {
                self.dispatch_event(event);
                true
            }
            None => false,
        }
    }

    /// Executes effects returned by the reducer.
    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns a backend call and posts its result as a task completion.
    fn spawn_task<F, Fut>(&self, kind: TaskKind, id: TaskId, f: F)
    where
        F: FnOnce(Arc<dyn AuthBackend>) -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let inner = f(backend).await;
            let completed = TaskCompleted {
                id,
                result: Box::new(inner),
            };
            let _ = tx.send(UiEvent::TaskCompleted { kind, completed });
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::LoadSession { task } => {
                self.spawn_task(TaskKind::SessionQuery, task, handlers::load_session);
            }
            UiEffect::SignIn { task, credentials } => {
                self.spawn_task(TaskKind::SignIn, task, move |backend| {
                    handlers::sign_in(backend, credentials)
                });
            }
            UiEffect::SignUp { task, credentials } => {
                self.spawn_task(TaskKind::SignUp, task, move |backend| {
                    handlers::sign_up(backend, credentials)
                });
            }
            UiEffect::RequestPasswordReset {
                task,
                email,
                redirect_url,
            } => {
                self.spawn_task(TaskKind::PasswordReset, task, move |backend| {
                    handlers::request_password_reset(backend, email, redirect_url)
                });
            }
            UiEffect::SignOut { task } => {
                self.spawn_task(TaskKind::SignOut, task, handlers::sign_out);
            }
        }
    }
}

/// Full-screen TUI runtime.
///
/// Owns the terminal and the dispatcher. Terminal state is restored on
/// drop, panic, or a second Ctrl+C.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub dispatcher: Dispatcher,
    /// Last time a Tick event was emitted.
    last_tick: Instant,
    /// Last time a terminal event was received (fast polling while typing).
    last_terminal_event: Instant,
}

impl TuiRuntime {
    /// Creates a new TUI runtime.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(options: UiOptions, backend: Arc<dyn AuthBackend>) -> Result<Self> {
        // Panic hook goes in BEFORE entering the alternate screen.
        terminal::install_panic_hook();
        interrupt::set_restore_hook(|| {
            let _ = terminal::restore_terminal();
        });
        interrupt::reset();

        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let now = Instant::now();
        Ok(Self {
            terminal,
            dispatcher: Dispatcher::new(options, backend),
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Runs the main event loop until the user quits.
    ///
    /// # Errors
    /// Returns an error if reading input or drawing fails.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;
        info!("ui started");

        self.dispatcher.start();
        let result = self.event_loop();

        self.dispatcher.unsubscribe();
        let _ = terminal::disable_input_features();
        info!("ui stopped");

        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.dispatcher.state.should_quit {
            if interrupt::is_interrupted() {
                self.dispatcher.state.should_quit = true;
                break;
            }

            let events = self.collect_events()?;
            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }
                self.dispatcher.dispatch_event(event);
                dirty = true;
            }

            if dirty {
                let state = &self.dispatcher.state;
                self.terminal.draw(|frame| {
                    render::render(state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    /// Collects events from the inbox and the terminal, plus a Tick when due.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let recent_terminal_activity = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let tick_interval =
            if self.dispatcher.state.tasks.is_any_running() || recent_terminal_activity {
                FRAME_DURATION
            } else {
                IDLE_POLL_DURATION
            };

        self.dispatcher.collect_inbox_events(&mut events);

        // Block until the next tick only when there is nothing to process yet.
        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
    }
}
