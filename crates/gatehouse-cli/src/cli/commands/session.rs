//! One-shot session command handlers.

use std::future::Future;
use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use gatehouse_core::auth::{AuthBackend, AuthResult, Credentials};
use gatehouse_core::interrupt;
use gatehouse_tui::features::forms::validate_email;
use gatehouse_tui::update::RESET_SENT_MESSAGE;

/// Awaits a backend call, giving up with `InterruptedError` on Ctrl+C.
async fn interruptible<T>(call: impl Future<Output = AuthResult<T>>) -> Result<T> {
    tokio::select! {
        result = call => Ok(result?),
        () = interrupt::wait_for_interrupt() => Err(interrupt::InterruptedError.into()),
    }
}

/// Reads one line from stdin as the password. Prompts when stdin is a terminal.
fn read_password() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
        io::stderr().flush()?;
    }

    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        anyhow::bail!("No password provided on stdin");
    }
    Ok(password.to_string())
}

fn checked_email(email: &str) -> Result<String> {
    validate_email(email).map_err(anyhow::Error::msg)?;
    Ok(email.trim().to_string())
}

pub async fn status(backend: &dyn AuthBackend) -> Result<()> {
    let session = interruptible(backend.current_session())
        .await
        .context("check session")?;
    match session {
        Some(session) => println!("Signed in as {}", session.email()),
        None => println!("Not signed in"),
    }
    Ok(())
}

pub async fn login(backend: &dyn AuthBackend, email: &str) -> Result<()> {
    let email = checked_email(email)?;
    let password = read_password()?;
    interruptible(backend.sign_in(Credentials::new(email.clone(), password)))
        .await
        .context("sign in")?;
    println!("Signed in as {email}");
    Ok(())
}

pub async fn signup(backend: &dyn AuthBackend, email: &str) -> Result<()> {
    let email = checked_email(email)?;
    let password = read_password()?;
    let outcome = interruptible(backend.sign_up(Credentials::new(email, password)))
        .await
        .context("sign up")?;
    println!("{}", outcome.message());
    Ok(())
}

pub async fn reset_password(
    backend: &dyn AuthBackend,
    email: &str,
    redirect_url: Option<String>,
) -> Result<()> {
    let email = checked_email(email)?;
    interruptible(backend.request_password_reset(email, redirect_url))
        .await
        .context("request password reset")?;
    println!("{RESET_SENT_MESSAGE}");
    Ok(())
}

pub async fn logout(backend: &dyn AuthBackend) -> Result<()> {
    interruptible(backend.sign_out()).await.context("sign out")?;
    println!("Signed out");
    Ok(())
}
