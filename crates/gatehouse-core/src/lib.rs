//! Core Gatehouse library (auth backends, session model, config, logging).

pub mod auth;
pub mod config;
pub mod interrupt;
pub mod logging;
