/*
 * Renderer Module
 *
 * Draws the current agent snapshot, the simulation bounds, obstacles and,
 * when enabled, the debug overlay. Only agents inside the visible area
 * (plus a small margin) are drawn.
 */

use log::warn;
use nannou::prelude::*;

use super::app::Model;
use super::ui;
use crate::flock::FlockId;
use crate::BOID_SIZE;

// One colour per flock, cycled when there are more flocks than entries
const FLOCK_COLORS: [(u8, u8, u8); 6] = [
    (220, 220, 220),
    (255, 140, 90),
    (110, 190, 255),
    (150, 230, 120),
    (240, 200, 80),
    (200, 130, 240),
];

fn flock_color(flock: FlockId) -> Rgb<u8> {
    let (r, g, b) = FLOCK_COLORS[flock.0 % FLOCK_COLORS.len()];
    rgb(r, g, b)
}

pub fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(BLACK);

    let window_rect = app.window_rect();
    let camera = &model.camera;
    let bounds = model.simulation.bounds();

    let corner_min = camera.world_to_screen(vec2(bounds.min.x, bounds.min.y), window_rect);
    let corner_max = camera.world_to_screen(vec2(bounds.max.x, bounds.max.y), window_rect);
    let world_rect = Rect::from_corners(corner_min, corner_max);
    draw.rect()
        .xy(world_rect.xy())
        .wh(world_rect.wh())
        .no_fill()
        .stroke_weight(1.0)
        .stroke(rgba(0.3, 0.3, 0.3, 1.0));

    for obstacle in model.simulation.obstacles() {
        let center = camera.world_to_screen(vec2(obstacle.position.x, obstacle.position.y), window_rect);
        draw.ellipse()
            .xy(center)
            .radius(obstacle.radius * camera.zoom)
            .color(rgba(0.5, 0.2, 0.2, 0.8));
    }

    // Margin is in world units so a boid half off-screen still draws
    let margin = BOID_SIZE * 2.0 / camera.zoom;
    let area = camera.visible_area(window_rect);
    let visible = Rect::from_corners(
        pt2(area.left() - margin, area.bottom() - margin),
        pt2(area.right() + margin, area.top() + margin),
    );

    let triangle = [
        pt2(BOID_SIZE, 0.0),
        pt2(-BOID_SIZE, BOID_SIZE / 2.0),
        pt2(-BOID_SIZE, -BOID_SIZE / 2.0),
    ];
    let mut drawn = 0;
    for agent in model.simulation.agents() {
        let world = vec2(agent.position.x, agent.position.y);
        if !visible.contains(world) {
            continue;
        }
        let screen = camera.world_to_screen(world, window_rect);
        let angle = agent.direction.y.atan2(agent.direction.x);
        draw.polygon()
            .color(flock_color(agent.flock))
            .points(triangle.iter().cloned())
            .xy(screen)
            .rotate(angle);
        drawn += 1;
    }

    if model.ui.show_debug {
        draw_selected_radii(&draw, model, window_rect);
        ui::draw_debug_info(&draw, model, window_rect, drawn);
    }

    if let Err(err) = draw.to_frame(app, &frame) {
        warn!("failed to draw frame: {err:?}");
    }
    if let Err(err) = model.egui.draw_to_frame(&frame) {
        warn!("failed to draw ui: {err:?}");
    }
}

// Visibility and separation radii around the first member of the selected flock
fn draw_selected_radii(draw: &Draw, model: &Model, window_rect: Rect) {
    let flock = FlockId(model.ui.selected_flock);
    let (Ok(config), Ok(members)) = (
        model.simulation.registry().config(flock),
        model.simulation.members(flock),
    ) else {
        return;
    };
    let Some((position, direction)) = members.first().and_then(|&agent| model.simulation.store().get(agent)) else {
        return;
    };

    let camera = &model.camera;
    let screen = camera.world_to_screen(vec2(position.x, position.y), window_rect);
    draw.ellipse()
        .xy(screen)
        .radius(config.separation_distance * camera.zoom)
        .no_fill()
        .stroke(RED)
        .stroke_weight(1.0);
    draw.ellipse()
        .xy(screen)
        .radius(config.visibility * camera.zoom)
        .no_fill()
        .stroke(GREEN)
        .stroke_weight(1.0);
    draw.arrow()
        .start(screen)
        .end(screen + vec2(direction.x, direction.y) * BOID_SIZE * 4.0)
        .color(YELLOW)
        .stroke_weight(2.0);
}
