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

use std::time::Duration;

use rand::Rng;
use tracing::{debug, trace};

use super::geometry::{ControlArea, Point, Rect};

/// The default distance at which a waypoint counts as reached.
pub const DEFAULT_EPSILON: f64 = 2.0;

/// Whether the animator is driving the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Idle,
    Seeking,
}

/// Moves a position towards randomly chosen waypoints inside a bounding rectangle,
/// one fixed step per tick.
pub struct WaypointAnimator<R: Rng> {
    rng: R,
    state: AnimationState,
    position: Point,
    target: Option<Point>,
    /// Control area units per second.
    speed: f64,
    tick_interval: Duration,
    epsilon: f64,
}

impl<R: Rng> WaypointAnimator<R> {
    /// Creates an idle animator.
    pub fn new(rng: R, speed: f64, tick_interval: Duration, epsilon: f64) -> WaypointAnimator<R> {
        WaypointAnimator {
            rng,
            state: AnimationState::Idle,
            position: Point::default(),
            target: None,
            speed: speed.max(0.0),
            tick_interval,
            epsilon: epsilon.max(f64::EPSILON),
        }
    }

    /// Starts seeking from the given position towards a first waypoint picked
    /// inside `bounds`.
    pub fn start(&mut self, position: Point, bounds: Rect, area: &ControlArea) {
        let effective = effective_region(bounds, area);
        self.position = position;
        self.state = AnimationState::Seeking;
        let target = self.pick_target(&effective);
        debug!(
            position = position.to_string(),
            target = target.to_string(),
            "Animation started."
        );
    }

    /// Stops seeking. The position is kept and nothing further is emitted.
    pub fn stop(&mut self) {
        if self.state == AnimationState::Seeking {
            debug!(position = self.position.to_string(), "Animation stopped.");
        }
        self.state = AnimationState::Idle;
        self.target = None;
    }

    /// Advances the animation by one tick. Returns the new position if it changed.
    ///
    /// The position always ends up inside the intersection of `bounds` and the
    /// area's inner region. A waypoint that no longer lies in that region, because
    /// the bounds changed, is replaced before moving.
    pub fn tick(&mut self, bounds: Rect, area: &ControlArea) -> Option<Point> {
        if self.state == AnimationState::Idle {
            return None;
        }

        let effective = effective_region(bounds, area);

        let clamped = effective.clamp(self.position);
        let mut moved = clamped != self.position;
        self.position = clamped;

        let target = match self.target {
            Some(target) if effective.contains(target) => target,
            _ => self.pick_target(&effective),
        };

        let distance = self.position.distance_to(target);
        if distance < self.epsilon {
            self.pick_target(&effective);
            return moved.then_some(self.position);
        }

        let step = self.speed * self.tick_interval.as_secs_f64();
        if step >= distance {
            self.position = target;
        } else {
            self.position = Point::new(
                self.position.x + (target.x - self.position.x) / distance * step,
                self.position.y + (target.y - self.position.y) / distance * step,
            );
        }
        self.position = effective.clamp(self.position);
        moved |= step > 0.0;

        moved.then_some(self.position)
    }

    fn pick_target(&mut self, region: &Rect) -> Point {
        let target = Point::new(
            region.x + self.rng.gen::<f64>() * region.width,
            region.y + self.rng.gen::<f64>() * region.height,
        );
        trace!(target = target.to_string(), "New waypoint.");
        self.target = Some(target);
        target
    }

    /// Gets the state.
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Returns true while the animator drives the position.
    pub fn is_seeking(&self) -> bool {
        self.state == AnimationState::Seeking
    }

    /// Gets the current position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Gets the current waypoint.
    pub fn target(&self) -> Option<Point> {
        self.target
    }

    /// Gets the speed in control area units per second.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Sets the speed in control area units per second.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.max(0.0);
    }

    /// Gets the interval the animator expects to be ticked at.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

/// The part of `bounds` the knob centre may occupy. Bounds lying entirely in the
/// margin fall back to the inner region.
fn effective_region(bounds: Rect, area: &ControlArea) -> Rect {
    let inner = area.inner();
    bounds.intersect(&inner).unwrap_or(inner)
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn animator(speed: f64) -> WaypointAnimator<StdRng> {
        WaypointAnimator::new(
            StdRng::seed_from_u64(7),
            speed,
            Duration::from_millis(50),
            DEFAULT_EPSILON,
        )
    }

    #[test]
    fn test_idle_ticks_do_nothing() {
        let mut animator = animator(20.0);
        let area = ControlArea::default();
        assert_eq!(None, animator.tick(area.inner(), &area));
        assert_eq!(AnimationState::Idle, animator.state());
    }

    #[test]
    fn test_start_picks_first_waypoint() {
        let area = ControlArea::default();
        let bounds = Rect::new(120.0, 30.0, 40.0, 25.0);
        let mut animator = WaypointAnimator::new(
            StdRng::seed_from_u64(1),
            20.0,
            Duration::from_millis(50),
            DEFAULT_EPSILON,
        );
        animator.start(Point::new(100.0, 100.0), bounds, &area);

        assert_eq!(AnimationState::Seeking, animator.state());
        assert_eq!(Point::new(100.0, 100.0), animator.position());
        let target = animator.target().expect("target");
        assert!(bounds.contains(target), "{} outside {}", target, bounds);
    }

    #[test]
    fn test_position_stays_in_bounds() {
        let area = ControlArea::default();
        let bounds = Rect::new(50.0, 50.0, 100.0, 100.0);
        let mut animator = animator(400.0);
        animator.start(Point::new(100.0, 100.0), bounds, &area);

        let mut moves = 0;
        for _ in 0..10_000 {
            if let Some(position) = animator.tick(bounds, &area) {
                moves += 1;
                assert!(bounds.contains(position), "{} escaped", position);
            }
            assert!(bounds.contains(animator.position()));
            if let Some(target) = animator.target() {
                assert!(bounds.contains(target));
            }
        }
        assert!(moves > 5_000);
    }

    #[test]
    fn test_bounds_partly_in_margin_use_inner_region() {
        let area = ControlArea::default();
        let bounds = Rect::new(0.0, 0.0, 40.0, 40.0);
        let effective = Rect::new(15.0, 15.0, 25.0, 25.0);
        let mut animator = animator(100.0);
        animator.start(Point::new(100.0, 100.0), bounds, &area);
        assert!(effective.contains(animator.target().expect("target")));

        // The first tick pulls the position into the region.
        assert!(animator.tick(bounds, &area).is_some());
        for _ in 0..1_000 {
            animator.tick(bounds, &area);
            assert!(effective.contains(animator.position()));
        }
    }

    #[test]
    fn test_steps_do_not_overshoot() {
        let area = ControlArea::default();
        let mut animator = animator(1_000_000.0);
        animator.start(Point::new(100.0, 100.0), area.inner(), &area);

        let position = animator.tick(area.inner(), &area).expect("moved");
        let reached = animator.target().expect("target");
        assert_eq!(reached, position);

        // Arrival picks a new waypoint without moving.
        assert_eq!(None, animator.tick(area.inner(), &area));
        assert_ne!(Some(reached), animator.target());
        assert_eq!(reached, animator.position());
    }

    #[test]
    fn test_step_length_follows_speed() {
        let area = ControlArea::default();
        // 20 units per second at 50ms ticks is one unit per tick.
        let mut animator = animator(20.0);
        let start = Point::new(15.0, 15.0);
        animator.start(start, area.inner(), &area);

        let position = animator.tick(area.inner(), &area).expect("moved");
        let distance = start.distance_to(position);
        assert!((distance - 1.0).abs() < 1e-9 || animator.target() == Some(position));
    }

    #[test]
    fn test_stop_emits_nothing() {
        let area = ControlArea::default();
        let mut animator = animator(20.0);
        animator.start(Point::new(100.0, 100.0), area.inner(), &area);
        animator.tick(area.inner(), &area);
        let position = animator.position();

        animator.stop();
        assert_eq!(AnimationState::Idle, animator.state());
        assert_eq!(None, animator.target());
        assert_eq!(None, animator.tick(area.inner(), &area));
        assert_eq!(position, animator.position());
    }

    #[test]
    fn test_shrinking_bounds_while_seeking() {
        let area = ControlArea::default();
        let mut animator = animator(20.0);
        animator.start(Point::new(100.0, 100.0), area.inner(), &area);
        for _ in 0..20 {
            animator.tick(area.inner(), &area);
        }

        let shrunk = Rect::new(150.0, 20.0, 20.0, 20.0);
        let position = animator.tick(shrunk, &area).expect("clamped");
        assert!(shrunk.contains(position));
        assert!(shrunk.contains(animator.target().expect("target")));
    }

    #[test]
    fn test_zero_speed_only_clamps() {
        let area = ControlArea::default();
        let mut animator = animator(0.0);
        animator.set_speed(-5.0);
        assert_eq!(0.0, animator.speed());
        animator.start(Point::new(100.0, 100.0), area.inner(), &area);
        assert_eq!(None, animator.tick(area.inner(), &area));
    }
}
