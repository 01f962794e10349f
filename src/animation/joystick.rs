// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use rand::Rng;
use tracing::debug;

use super::geometry::{ControlArea, Point, Rect};
use super::waypoint::WaypointAnimator;

/// How close to a border of the bounding rectangle a press must land to grab it.
pub const RESIZE_TOLERANCE: f64 = 10.0;

/// The part of the bounding rectangle being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Left,
    Right,
    Top,
    Bottom,
}

impl ResizeHandle {
    /// Finds the handle under a point. Corners win over edges.
    pub fn hit(rect: &Rect, point: Point, tolerance: f64) -> Option<ResizeHandle> {
        let near = |a: f64, b: f64| (a - b).abs() < tolerance;
        let left = near(point.x, rect.x);
        let right = near(point.x, rect.right());
        let top = near(point.y, rect.y);
        let bottom = near(point.y, rect.bottom());
        let within_x = point.x >= rect.x && point.x <= rect.right();
        let within_y = point.y >= rect.y && point.y <= rect.bottom();

        match (left, right, top, bottom) {
            (true, _, true, _) => Some(ResizeHandle::TopLeft),
            (_, true, true, _) => Some(ResizeHandle::TopRight),
            (true, _, _, true) => Some(ResizeHandle::BottomLeft),
            (_, true, _, true) => Some(ResizeHandle::BottomRight),
            (true, _, _, _) if within_y => Some(ResizeHandle::Left),
            (_, true, _, _) if within_y => Some(ResizeHandle::Right),
            (_, _, true, _) if within_x => Some(ResizeHandle::Top),
            (_, _, _, true) if within_x => Some(ResizeHandle::Bottom),
            _ => None,
        }
    }

    fn moves_left(&self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::BottomLeft | ResizeHandle::Left
        )
    }

    fn moves_right(&self) -> bool {
        matches!(
            self,
            ResizeHandle::TopRight | ResizeHandle::BottomRight | ResizeHandle::Right
        )
    }

    fn moves_top(&self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::TopRight | ResizeHandle::Top
        )
    }

    fn moves_bottom(&self) -> bool {
        matches!(
            self,
            ResizeHandle::BottomLeft | ResizeHandle::BottomRight | ResizeHandle::Bottom
        )
    }

    /// Drags this handle of the rectangle to the point. The opposite edges stay put,
    /// and the result is at least `min_size` on each side and inside the region
    /// the knob may occupy.
    pub fn resize(&self, rect: &Rect, point: Point, min_size: f64, area: &ControlArea) -> Rect {
        let point = area.inner().clamp(point);
        let mut result = *rect;

        if self.moves_left() {
            result.x = point.x.min(rect.right() - min_size);
            result.width = rect.right() - result.x;
        }
        if self.moves_right() {
            result.width = (point.x - rect.x).max(min_size);
        }
        if self.moves_top() {
            result.y = point.y.min(rect.bottom() - min_size);
            result.height = rect.bottom() - result.y;
        }
        if self.moves_bottom() {
            result.height = (point.y - rect.y).max(min_size);
        }

        fit(result, min_size, area)
    }
}

/// Keeps a rectangle inside the area's inner region with at least `min_size` per
/// side, so the animation never has to leave it.
fn fit(rect: Rect, min_size: f64, area: &ControlArea) -> Rect {
    let inner = area.inner();
    let min_size = if min_size.is_finite() {
        min_size.clamp(0.0, inner.width)
    } else {
        0.0
    };
    let x = rect.x.clamp(inner.x, inner.right() - min_size);
    let y = rect.y.clamp(inner.y, inner.bottom() - min_size);
    Rect::new(
        x,
        y,
        rect.width.max(min_size).min(inner.right() - x),
        rect.height.max(min_size).min(inner.bottom() - y),
    )
}

/// The pan/tilt pointer. Manual input and the waypoint animation are mutually
/// exclusive: while the animator is seeking, drags produce no positions.
pub struct Joystick<R: Rng> {
    area: ControlArea,
    /// The region the animation picks waypoints in.
    bounds: Rect,
    position: Point,
    dragging: bool,
    resizing: Option<ResizeHandle>,
    min_bounds_size: f64,
    animator: WaypointAnimator<R>,
}

impl<R: Rng> Joystick<R> {
    /// Creates a joystick centred in the area.
    pub fn new(
        area: ControlArea,
        bounds: Rect,
        min_bounds_size: f64,
        animator: WaypointAnimator<R>,
    ) -> Joystick<R> {
        Joystick {
            area,
            bounds: fit(bounds, min_bounds_size, &area),
            position: area.outer().center(),
            dragging: false,
            resizing: None,
            min_bounds_size,
            animator,
        }
    }

    /// Presses at a point. A press on the border of the bounding rectangle starts
    /// a resize; anywhere else it moves the knob there and starts a drag. Returns
    /// the new position if the knob moved.
    pub fn press(&mut self, point: Point) -> Option<Point> {
        if let Some(handle) = ResizeHandle::hit(&self.bounds, point, RESIZE_TOLERANCE) {
            debug!(handle = ?handle, "Resizing animation bounds.");
            self.resizing = Some(handle);
            return None;
        }
        if self.animator.is_seeking() {
            return None;
        }

        self.dragging = true;
        self.move_to(point)
    }

    /// Drags to a point. Returns the new position if the knob moved.
    pub fn drag(&mut self, point: Point) -> Option<Point> {
        if let Some(handle) = self.resizing {
            self.bounds = handle.resize(&self.bounds, point, self.min_bounds_size, &self.area);
            return None;
        }
        if !self.dragging || self.animator.is_seeking() {
            return None;
        }

        self.move_to(point)
    }

    /// Ends a drag or resize.
    pub fn release(&mut self) {
        if let Some(handle) = self.resizing.take() {
            debug!(
                handle = ?handle,
                bounds = self.bounds.to_string(),
                "Animation bounds resized."
            );
        }
        self.dragging = false;
    }

    fn move_to(&mut self, point: Point) -> Option<Point> {
        self.position = self.area.inner().clamp(point);
        Some(self.position)
    }

    /// Hands the knob to the animator. Any drag in progress is cancelled.
    pub fn start_animation(&mut self) {
        self.dragging = false;
        self.animator.start(self.position, self.bounds, &self.area);
    }

    /// Takes the knob back from the animator. The knob stays where the animation
    /// left it.
    pub fn stop_animation(&mut self) {
        self.animator.stop();
    }

    /// Advances the animation by one tick. Returns the new position if it moved.
    pub fn tick(&mut self) -> Option<Point> {
        let position = self.animator.tick(self.bounds, &self.area)?;
        self.position = position;
        Some(position)
    }

    /// Sets the animation bounds. The rectangle is fitted into the inner region.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = fit(bounds, self.min_bounds_size, &self.area);
    }

    /// Gets the animation bounds.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Gets the knob position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Gets the knob position mapped to [0, 1] per axis.
    pub fn normalized(&self) -> Point {
        self.area.normalize(self.position)
    }

    /// Gets the control area.
    pub fn area(&self) -> &ControlArea {
        &self.area
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn resizing(&self) -> Option<ResizeHandle> {
        self.resizing
    }

    /// Gets the animator.
    pub fn animator(&self) -> &WaypointAnimator<R> {
        &self.animator
    }

    /// Gets the animator mutably, to change its speed.
    pub fn animator_mut(&mut self) -> &mut WaypointAnimator<R> {
        &mut self.animator
    }
}
