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

use std::fmt;

/// A position in control area units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    /// The euclidean distance to another point.
    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// An axis aligned rectangle. The origin is the top left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Rect {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Returns true if the point lies inside the rectangle, edges included.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Moves the point onto the nearest position inside the rectangle.
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.x, self.right()),
            point.y.clamp(self.y, self.bottom()),
        )
    }

    /// The overlap of two rectangles, if they overlap at all.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < x || bottom < y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.1}, {:.1} {:.1}x{:.1}]",
            self.x, self.y, self.width, self.height
        )
    }
}

/// The square area the pointer moves in. The knob centre stays `margin` units away
/// from every edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlArea {
    size: f64,
    margin: f64,
}

impl ControlArea {
    /// Creates a control area. The margin is limited to less than half the size so
    /// the inner region never collapses.
    pub fn new(size: f64, margin: f64) -> ControlArea {
        let size = if size.is_finite() { size.max(1.0) } else { 1.0 };
        let margin = if margin.is_nan() { 0.0 } else { margin };
        ControlArea {
            size,
            margin: margin.clamp(0.0, size / 2.0 - 0.5),
        }
    }

    /// Gets the edge length of the area.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Gets the knob margin.
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// The whole area.
    pub fn outer(&self) -> Rect {
        Rect::new(0.0, 0.0, self.size, self.size)
    }

    /// The region the knob centre may occupy.
    pub fn inner(&self) -> Rect {
        let span = self.size - 2.0 * self.margin;
        Rect::new(self.margin, self.margin, span, span)
    }

    /// Maps a point in the inner region to [0, 1] on each axis.
    pub fn normalize(&self, point: Point) -> Point {
        let inner = self.inner();
        let point = inner.clamp(point);
        Point::new(
            (point.x - inner.x) / inner.width,
            (point.y - inner.y) / inner.height,
        )
    }
}

impl Default for ControlArea {
    fn default() -> Self {
        ControlArea::new(200.0, 15.0)
    }
}
