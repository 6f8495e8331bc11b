/*
 * Camera Module
 *
 * Zoom and pan for the viewer, with conversions between world space and
 * screen space. The initial zoom fits the simulation bounds to the window.
 */

use nannou::prelude::*;

use crate::bounds::Bounds;

// Fraction of the window the bounds fill after a reset
const FIT_MARGIN: f32 = 0.9;

pub struct Camera {
    pub position: Vec2,
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub is_dragging: bool,
    pub last_cursor_pos: Vec2,
}

impl Camera {
    /// A camera that shows all of `bounds` inside `window_rect`.
    pub fn fit(bounds: &Bounds, window_rect: Rect) -> Self {
        let mut camera = Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.01,
            max_zoom: 1.0,
            is_dragging: false,
            last_cursor_pos: Vec2::ZERO,
        };
        camera.reset(bounds, window_rect);
        camera
    }

    pub fn reset(&mut self, bounds: &Bounds, window_rect: Rect) {
        let size = bounds.size();
        let center = bounds.center();
        let fit = (window_rect.w() / size.x).min(window_rect.h() / size.y) * FIT_MARGIN;

        self.position = vec2(center.x, center.y);
        self.zoom = fit;
        self.min_zoom = fit * 0.05;
        self.max_zoom = fit * 50.0;
        self.is_dragging = false;
    }

    // Convert a point from world space to screen space
    pub fn world_to_screen(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - self.position) * self.zoom + window_rect.xy()
    }

    // Convert a point from screen space to world space
    pub fn screen_to_world(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - window_rect.xy()) / self.zoom + self.position
    }

    /// World-space rectangle currently on screen.
    pub fn visible_area(&self, window_rect: Rect) -> Rect {
        let bottom_left = self.screen_to_world(vec2(window_rect.left(), window_rect.bottom()), window_rect);
        let top_right = self.screen_to_world(vec2(window_rect.right(), window_rect.top()), window_rect);
        Rect::from_corners(bottom_left, top_right)
    }

    // Zoom around the cursor so the point under it stays put
    pub fn zoom(&mut self, scroll_delta: Vec2, cursor_position: Vec2, window_rect: Rect) {
        let zoom_factor = 1.0 + scroll_delta.y * 0.1;
        let cursor_world_before = self.screen_to_world(cursor_position, window_rect);

        self.zoom = (self.zoom * zoom_factor).clamp(self.min_zoom, self.max_zoom);

        let cursor_world_after = self.screen_to_world(cursor_position, window_rect);
        self.position += cursor_world_before - cursor_world_after;
    }

    pub fn start_drag(&mut self, position: Vec2) {
        self.last_cursor_pos = position;
        self.is_dragging = true;
    }

    pub fn drag(&mut self, position: Vec2) {
        if !self.is_dragging {
            return;
        }
        let delta = position - self.last_cursor_pos;
        if delta.length_squared() > 0.0 {
            self.position -= delta / self.zoom;
            self.last_cursor_pos = position;
        }
    }

    pub fn end_drag(&mut self) {
        self.is_dragging = false;
    }
}
