/*
 * Application Module
 *
 * The viewer's nannou model and per-frame update. UI edits, queued growth
 * and camera changes are applied first, then the simulation ticks once with
 * the frame's elapsed time. Mutations and ticks both run on the nannou
 * update thread, so they never overlap.
 */

use std::time::Duration;

use log::{error, info, warn};
use nannou::prelude::*;
use nannou_egui::Egui;

use super::camera::Camera;
use super::{input, renderer, startup_config, ui};
use crate::simulation::Simulation;

// Longest frame fed to a single tick, so a stalled window does not teleport the flock
const MAX_FRAME_TIME: Duration = Duration::from_millis(100);

pub struct Model {
    pub simulation: Simulation,
    pub egui: Egui,
    pub camera: Camera,
    pub mouse_position: Vec2,
    pub ui: ui::UiState,
    pub fps: f32,
    pub frame_time: Duration,
}

// Initialize the model
pub fn model(app: &App) -> Model {
    let (window_width, window_height) = match app.primary_monitor() {
        Some(monitor) => {
            let size = monitor.size();
            (size.width as f32 * 0.8, size.height as f32 * 0.8)
        }
        None => (1280.0, 800.0),
    };

    let window_id = match app
        .new_window()
        .title("Flocking Simulation")
        .size(window_width as u32, window_height as u32)
        .view(renderer::view)
        .key_pressed(input::key_pressed)
        .mouse_moved(input::mouse_moved)
        .mouse_pressed(input::mouse_pressed)
        .mouse_released(input::mouse_released)
        .mouse_wheel(input::mouse_wheel)
        .raw_event(input::raw_window_event)
        .build()
    {
        Ok(id) => id,
        Err(err) => {
            error!("failed to open the viewer window: {err:?}");
            std::process::exit(1);
        }
    };
    let Some(window) = app.window(window_id) else {
        error!("viewer window closed during startup");
        std::process::exit(1);
    };
    let egui = Egui::from_window(&window);

    let mut simulation = match Simulation::from_config(startup_config()) {
        Ok(simulation) => simulation,
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    };
    match simulation.populate() {
        Ok(spawned) => info!("viewer started with {spawned} agents"),
        Err(err) => warn!("initial population failed: {err}"),
    }

    let camera = Camera::fit(simulation.bounds(), window.rect());

    Model {
        simulation,
        egui,
        camera,
        mouse_position: Vec2::ZERO,
        ui: ui::UiState::default(),
        fps: 0.0,
        frame_time: Duration::ZERO,
    }
}

// Update the model
pub fn update(app: &App, model: &mut Model, update: Update) {
    model.fps = app.fps();
    model.frame_time = update.since_last;

    ui::update_ui(&mut model.egui, &mut model.simulation, &mut model.ui, model.fps);

    if std::mem::take(&mut model.ui.grow_requested) {
        if let Err(err) = model.simulation.grow_default() {
            warn!("could not grow flock: {err}");
        }
    }
    if std::mem::take(&mut model.ui.reset_camera) {
        model.camera.reset(model.simulation.bounds(), app.window_rect());
    }

    if model.ui.paused {
        return;
    }
    let elapsed = update.since_last.min(MAX_FRAME_TIME).as_secs_f32();
    if let Err(err) = model.simulation.tick(elapsed) {
        warn!("tick failed: {err}");
    }
}
