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

use duration_string::DurationString;
use serde::Deserialize;

use crate::animation::waypoint::DEFAULT_EPSILON;
use crate::animation::{ControlArea, Rect};

use super::error::ConfigError;

pub const DEFAULT_AREA_SIZE: f64 = 200.0;
pub const DEFAULT_MARGIN: f64 = 15.0;
/// Control area units per second.
pub const DEFAULT_SPEED: f64 = 20.0;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);
pub const DEFAULT_MIN_BOUNDS_SIZE: f64 = 20.0;

/// A rectangle in control area units.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// A YAML representation of the pan/tilt joystick and its animation.
#[derive(Deserialize, Clone, Default)]
pub struct Animation {
    /// The edge length of the square control area.
    area_size: Option<f64>,

    /// How far the knob centre stays from the edges of the area.
    margin: Option<f64>,

    /// The region waypoints are picked in. Defaults to the centre quarter of the area.
    bounds: Option<Bounds>,

    /// Control area units moved per second.
    speed: Option<f64>,

    /// How often the animation advances.
    tick_interval: Option<String>,

    /// The distance at which a waypoint counts as reached.
    epsilon: Option<f64>,

    /// The smallest the bounds may be resized to.
    min_bounds_size: Option<f64>,

    /// Seeds the waypoint generator, for repeatable runs.
    seed: Option<u64>,

    /// The pan channel name.
    pan_channel: Option<String>,

    /// The tilt channel name.
    tilt_channel: Option<String>,

    /// The movement speed channel name.
    speed_channel: Option<String>,
}

impl Animation {
    /// Rejects numbers that can't describe a position, size or speed, such as
    /// `.nan` or `.inf`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut values = vec![
            ("area_size", self.area_size),
            ("margin", self.margin),
            ("speed", self.speed),
            ("epsilon", self.epsilon),
            ("min_bounds_size", self.min_bounds_size),
        ];
        if let Some(bounds) = self.bounds {
            values.extend([
                ("bounds.x", Some(bounds.x)),
                ("bounds.y", Some(bounds.y)),
                ("bounds.width", Some(bounds.width)),
                ("bounds.height", Some(bounds.height)),
            ]);
        }

        for (field, value) in values {
            if let Some(value) = value.filter(|value| !value.is_finite()) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Gets the control area.
    pub fn area(&self) -> ControlArea {
        ControlArea::new(
            self.area_size.unwrap_or(DEFAULT_AREA_SIZE),
            self.margin.unwrap_or(DEFAULT_MARGIN),
        )
    }

    /// Gets the animation bounds.
    pub fn bounds(&self) -> Rect {
        match self.bounds {
            Some(bounds) => Rect::new(bounds.x, bounds.y, bounds.width, bounds.height),
            None => {
                let size = self.area().size();
                Rect::new(size / 4.0, size / 4.0, size / 2.0, size / 2.0)
            }
        }
    }

    /// Gets the speed in control area units per second.
    pub fn speed(&self) -> f64 {
        self.speed.unwrap_or(DEFAULT_SPEED)
    }

    /// Gets the tick interval.
    pub fn tick_interval(&self) -> Result<Duration, duration_string::Error> {
        self.tick_interval
            .as_ref()
            .map_or(Ok(DEFAULT_TICK_INTERVAL), |duration| {
                Ok(DurationString::from_string(duration.clone())?.into())
            })
    }

    /// Gets the waypoint epsilon.
    pub fn epsilon(&self) -> f64 {
        self.epsilon.unwrap_or(DEFAULT_EPSILON)
    }

    /// Gets the minimum bounds size.
    pub fn min_bounds_size(&self) -> f64 {
        self.min_bounds_size.unwrap_or(DEFAULT_MIN_BOUNDS_SIZE)
    }

    /// Gets the random seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Gets the pan channel name.
    pub fn pan_channel(&self) -> &str {
        self.pan_channel.as_deref().unwrap_or("Pan")
    }

    /// Gets the tilt channel name.
    pub fn tilt_channel(&self) -> &str {
        self.tilt_channel.as_deref().unwrap_or("Tilt")
    }

    /// Gets the movement speed channel name.
    pub fn speed_channel(&self) -> &str {
        self.speed_channel.as_deref().unwrap_or("Pan/Tilt Speed")
    }
}
