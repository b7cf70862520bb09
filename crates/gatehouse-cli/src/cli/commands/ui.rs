//! Interactive UI command handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use gatehouse_core::auth::AuthBackend;
use gatehouse_core::config::{BackendKind, Config};
use gatehouse_tui::UiOptions;

pub async fn run(config: &Config, backend: Arc<dyn AuthBackend>) -> Result<()> {
    let options = UiOptions {
        backend_label: backend_label(config),
        reset_redirect: config.effective_reset_redirect(),
    };

    gatehouse_tui::run_interactive(options, backend)
        .await
        .context("interactive UI failed")
}

/// Service host for the hosted backend, a fixed label for the demo one.
fn backend_label(config: &Config) -> String {
    match config.backend {
        BackendKind::Hosted => config
            .effective_service_url()
            .ok()
            .and_then(|raw| {
                url::Url::parse(&raw)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string))
            })
            .unwrap_or_else(|| BackendKind::Hosted.to_string()),
        BackendKind::Memory => "offline demo".to_string(),
    }
}
