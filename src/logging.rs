/*
 * Logging Module
 *
 * Installs env_logger as the backend for the `log` facade. RUST_LOG always
 * wins; without it the level comes from the verbose flag.
 *
 * Levels used across the crate:
 * - info: simulation setup and bulk population changes
 * - debug: configuration loading, flock registration, individual spawns
 * - trace: per-tick progress
 * - warn: rejected queued spawn requests
 */

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initialize the global logger. `verbose` lowers the default filter to
/// debug.
pub fn init(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();

    // Fails only when a logger is already installed, which tests do repeatedly
    let _ = builder.try_init();
}
