/*
 * UI Module
 *
 * egui controls for the viewer. Edits are made on copies of the selected
 * flock's FlockConfig and of the SimulationParams, then committed through
 * the simulation so they are validated and applied between ticks.
 */

use log::warn;
use nannou_egui::{egui, Egui};

use super::app::Model;
use crate::bounds::BoundsMode;
use crate::flock::FlockId;
use crate::params::{FlockConfig, NeighborStrategy, SeparationNormalization, SimulationParams};
use crate::simulation::Simulation;

#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub paused: bool,
    pub show_debug: bool,
    pub selected_flock: usize,
    pub grow_requested: bool,
    pub reset_camera: bool,
}

pub fn update_ui(egui: &mut Egui, simulation: &mut Simulation, state: &mut UiState, fps: f32) {
    let flock = FlockId(state.selected_flock);
    let Ok(current_config) = simulation.registry().config(flock).cloned() else {
        state.selected_flock = 0;
        return;
    };
    let current_params = simulation.params().clone();
    let mut config = current_config.clone();
    let mut params = current_params.clone();

    let ctx = egui.begin_frame();

    egui::Window::new("Simulation Controls")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.collapsing("Flock", |ui| {
                egui::ComboBox::from_label("Selected flock")
                    .selected_text(config.name.clone())
                    .show_ui(ui, |ui| {
                        for flock in simulation.registry().iter() {
                            ui.selectable_value(&mut state.selected_flock, flock.id().0, flock.name());
                        }
                    });
                let members = simulation.members(flock).map_or(0, |members| members.len());
                ui.label(format!("Members: {members}"));
                if ui.button(format!("Add {} boids", params.boid_increment)).clicked() {
                    state.grow_requested = true;
                }
            });

            ui.collapsing("Flocking Behavior", |ui| flock_controls(ui, &mut config));

            ui.collapsing("Simulation", |ui| simulation_controls(ui, &mut params));

            ui.collapsing("Performance", |ui| {
                let stats = simulation.last_stats();
                ui.label(format!("FPS: {fps:.1}"));
                ui.label(format!("Tick time: {:.2} ms", stats.duration.as_secs_f64() * 1000.0));
                ui.label(format!("Agents: {}", stats.agents));
                ui.label(format!("Batches: {} x {}", stats.batches, stats.batch_size));
                ui.label(format!("Throughput: {:.0} agents/s", stats.throughput()));
            });

            ui.checkbox(&mut state.show_debug, "Show Debug Info");
            ui.checkbox(&mut state.paused, "Pause Simulation");
            if ui.button("Reset Camera").clicked() {
                state.reset_camera = true;
            }
        });

    if config != current_config {
        if let Err(err) = simulation.update_flock_config(flock, config) {
            warn!("rejected flock settings: {err}");
        }
    }
    if params != current_params {
        if let Err(err) = simulation.set_params(params) {
            warn!("rejected simulation settings: {err}");
        }
    }
}

fn flock_controls(ui: &mut egui::Ui, config: &mut FlockConfig) {
    ui.checkbox(&mut config.use_alignment_rule, "Alignment");
    ui.add(egui::Slider::new(&mut config.weight_alignment, FlockConfig::get_weight_range()).text("Alignment Weight"));
    ui.checkbox(&mut config.use_separation_rule, "Separation");
    ui.add(egui::Slider::new(&mut config.weight_separation, FlockConfig::get_weight_range()).text("Separation Weight"));
    ui.checkbox(&mut config.use_cohesion_rule, "Cohesion");
    ui.add(egui::Slider::new(&mut config.weight_cohesion, FlockConfig::get_weight_range()).text("Cohesion Weight"));

    ui.separator();
    ui.add(egui::Slider::new(&mut config.visibility, FlockConfig::get_radius_range()).text("Visibility"));
    ui.add(egui::Slider::new(&mut config.separation_distance, FlockConfig::get_radius_range()).text("Separation Distance"));
    ui.add(egui::Slider::new(&mut config.max_speed, FlockConfig::get_max_speed_range()).text("Max Speed"));
    ui.add(egui::Slider::new(&mut config.max_rotation_speed, FlockConfig::get_max_speed_range()).text("Max Rotation Speed"));
}

fn simulation_controls(ui: &mut egui::Ui, params: &mut SimulationParams) {
    ui.add(egui::Slider::new(&mut params.batch_size, SimulationParams::get_batch_size_range()).text("Batch Size"));
    ui.add(egui::Slider::new(&mut params.perturbation, SimulationParams::get_noise_range()).text("Perturbation"));
    ui.add(egui::Slider::new(&mut params.wander, SimulationParams::get_noise_range()).text("Wander"));
    ui.checkbox(&mut params.enable_parallel, "Enable Parallel Processing");
    ui.checkbox(&mut params.integrate_speed, "Integrate Speed");
    ui.checkbox(&mut params.limit_rotation, "Limit Rotation");

    ui.horizontal(|ui| {
        ui.label("Neighbours:");
        ui.radio_value(&mut params.neighbor_strategy, NeighborStrategy::BruteForce, "Brute force");
        ui.radio_value(&mut params.neighbor_strategy, NeighborStrategy::Grid, "Grid");
    });
    ui.horizontal(|ui| {
        ui.label("Separation speed:");
        ui.radio_value(&mut params.separation_normalization, SeparationNormalization::AlignmentCount, "Per neighbour");
        ui.radio_value(&mut params.separation_normalization, SeparationNormalization::OwnCount, "Per close neighbour");
    });
    ui.horizontal(|ui| {
        ui.label("Edges:");
        ui.radio_value(&mut params.bounds_mode, BoundsMode::Free, "Free");
        ui.radio_value(&mut params.bounds_mode, BoundsMode::Clamp, "Clamp");
        ui.radio_value(&mut params.bounds_mode, BoundsMode::Wrap, "Wrap");
    });
}

// Text overlay in the top-left corner of the window
pub fn draw_debug_info(draw: &nannou::Draw, model: &Model, window_rect: nannou::geom::Rect, drawn: usize) {
    let margin = 20.0;
    let line_height = 20.0;
    let panel_width = 220.0;

    let stats = model.simulation.last_stats();
    let size = model.simulation.bounds().size();
    let debug_texts = [
        format!("FPS: {:.1}", model.fps),
        format!("Frame time: {:.2} ms", model.frame_time.as_secs_f64() * 1000.0),
        format!("Tick: {} (generation {})", stats.tick, stats.generation),
        format!("Agents: {} ({} drawn)", stats.agents, drawn),
        format!("Flocks: {}", model.simulation.registry().len()),
        format!("Zoom: {:.2}x", model.camera.zoom),
        format!("World Size: {:.0}x{:.0}", size.x, size.y),
    ];

    let panel_height = line_height * debug_texts.len() as f32 + margin;
    draw.rect()
        .x_y(window_rect.left() + panel_width / 2.0, window_rect.top() - panel_height / 2.0)
        .w_h(panel_width, panel_height)
        .color(nannou::color::rgba(0.0, 0.0, 0.0, 0.7));

    let text_x = window_rect.left() + margin;
    let text_y = window_rect.top() - margin;
    for (i, text) in debug_texts.iter().enumerate() {
        draw.text(text)
            .x_y(text_x + 80.0, text_y - i as f32 * line_height)
            .color(nannou::color::WHITE)
            .font_size(14);
    }
}
