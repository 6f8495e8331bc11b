/*
 * Viewer Module
 *
 * Interactive nannou front end for the simulation. The host loop lives here:
 * every frame it applies UI edits between ticks, advances the simulation by
 * the frame time unless paused, and draws the agent snapshot.
 *
 * Controls:
 * - Space: grow the first flock by the configured increment
 * - P: pause, D: debug overlay, R: reset the camera
 * - Drag to pan, scroll to zoom
 */

use std::sync::OnceLock;

use crate::config::SimulationConfig;

pub mod app;
pub mod camera;
pub mod input;
pub mod renderer;
pub mod ui;

// nannou's model function takes no arguments, so the startup configuration
// is parked here until the window exists
static STARTUP_CONFIG: OnceLock<SimulationConfig> = OnceLock::new();

/// Open the viewer window and run until it is closed.
pub fn run(config: SimulationConfig) {
    // A second call keeps the first configuration; nannou only runs once per process
    let _ = STARTUP_CONFIG.set(config);
    nannou::app(app::model).update(app::update).run();
}

pub(crate) fn startup_config() -> SimulationConfig {
    STARTUP_CONFIG.get().cloned().unwrap_or_default()
}
