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

/// The OLA universe frames go to when none is configured.
pub const DEFAULT_OLA_UNIVERSE: u32 = 1;
/// The port olad listens on by default.
pub const DEFAULT_OLA_PORT: u16 = 9010;
pub const DEFAULT_MIN_COMMIT_INTERVAL: Duration = Duration::ZERO;

/// Where frames are sent.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// The OLA daemon.
    #[default]
    Ola,
    /// The log, for dry runs.
    Log,
}

/// A YAML representation of the DMX output configuration.
#[derive(Deserialize, Clone, Default)]
pub struct Dmx {
    /// The renderer to use.
    renderer: Option<RendererKind>,

    /// The OLA universe to send frames to.
    ola_universe: Option<u32>,

    /// The port of the OLA daemon.
    ola_port: Option<u16>,

    /// Commits closer together than this are coalesced.
    min_commit_interval: Option<String>,
}

impl Dmx {
    /// Creates a new DMX configuration.
    pub fn new(
        renderer: Option<RendererKind>,
        ola_universe: Option<u32>,
        ola_port: Option<u16>,
        min_commit_interval: Option<String>,
    ) -> Dmx {
        Dmx {
            renderer,
            ola_universe,
            ola_port,
            min_commit_interval,
        }
    }

    /// Gets the renderer kind.
    pub fn renderer(&self) -> RendererKind {
        self.renderer.unwrap_or_default()
    }

    /// Gets the OLA universe.
    pub fn ola_universe(&self) -> u32 {
        self.ola_universe.unwrap_or(DEFAULT_OLA_UNIVERSE)
    }

    /// Gets the OLA port.
    pub fn ola_port(&self) -> u16 {
        self.ola_port.unwrap_or(DEFAULT_OLA_PORT)
    }

    /// Gets the minimum interval between commits.
    pub fn min_commit_interval(&self) -> Result<Duration, duration_string::Error> {
        self.min_commit_interval
            .as_ref()
            .map_or(Ok(DEFAULT_MIN_COMMIT_INTERVAL), |duration| {
                Ok(DurationString::from_string(duration.clone())?.into())
            })
    }
}
