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
use std::error::Error;

use tracing::info;

use crate::config;

pub mod coordinator;
pub mod ola_client;
pub mod renderer;
pub mod universe;

pub use coordinator::RenderCoordinator;
pub use renderer::Renderer;
pub use universe::{InstanceId, Universe};

/// A DMX universe is 512 channels.
pub const UNIVERSE_SIZE: usize = 512;

/// Creates the renderer described by the configuration.
pub fn create_renderer(config: &config::Dmx) -> Result<Box<dyn Renderer>, Box<dyn Error>> {
    let renderer: Box<dyn Renderer> = match config.renderer() {
        config::RendererKind::Ola => Box::new(renderer::OlaRenderer::connect(
            config.ola_universe(),
            config.ola_port(),
        )?),
        config::RendererKind::Log => Box::new(renderer::LogRenderer::new()),
    };
    info!(renderer = renderer.describe(), "Renderer created.");
    Ok(renderer)
}
