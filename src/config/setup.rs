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
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;
use tracing::info;

use crate::connection::ConnectionDescriptor;
use crate::dmx::universe::PatchError;
use crate::dmx::Universe;
use crate::fixture::{FixtureInstance, FixtureLibrary};

use super::animation::Animation;
use super::dmx::Dmx;
use super::error::ConfigError;
use super::fixture::YamlFixtureProvider;

const DEFAULT_UNIVERSE_NAME: &str = "main";

/// Places a fixture in the universe.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PatchEntry {
    /// The name of the fixture definition.
    fixture: String,

    /// The mode to run the fixture in.
    mode: String,

    /// The 1-based start address.
    address: u16,
}

impl PatchEntry {
    pub fn new(fixture: &str, mode: &str, address: u16) -> PatchEntry {
        PatchEntry {
            fixture: fixture.to_string(),
            mode: mode.to_string(),
            address,
        }
    }

    /// Gets the fixture name.
    pub fn fixture(&self) -> &str {
        &self.fixture
    }

    /// Gets the mode name.
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Gets the start address.
    pub fn address(&self) -> u16 {
        self.address
    }
}

/// The configuration of a lighting setup: where the fixture definitions live, how
/// the fixtures are patched, and how the output and animation behave.
#[derive(Deserialize)]
pub struct Setup {
    /// The name of the universe.
    universe: Option<String>,

    /// Fixture definition files or directories, relative to the setup file.
    #[serde(default)]
    fixtures: Vec<String>,

    /// The patch, in order.
    #[serde(default)]
    patch: Vec<PatchEntry>,

    #[serde(default)]
    dmx: Dmx,

    #[serde(default)]
    animation: Animation,

    /// Endpoints announced by static discovery.
    #[serde(default)]
    discovery: Vec<ConnectionDescriptor>,

    /// The directory the setup file is in.
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Setup {
    /// Parses a setup from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Setup, ConfigError> {
        let mut setup = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Setup>()?;
        setup.animation.validate()?;
        setup.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(setup)
    }

    /// Gets the name of the universe.
    pub fn universe(&self) -> &str {
        self.universe.as_deref().unwrap_or(DEFAULT_UNIVERSE_NAME)
    }

    /// Gets the fixture definition paths, resolved against the setup file.
    pub fn fixture_paths(&self) -> Vec<PathBuf> {
        self.fixtures
            .iter()
            .map(|fixture| self.base_dir.join(fixture))
            .collect()
    }

    /// Gets the patch.
    pub fn patch(&self) -> &[PatchEntry] {
        &self.patch
    }

    /// Gets the DMX configuration.
    pub fn dmx(&self) -> &Dmx {
        &self.dmx
    }

    /// Gets the animation configuration.
    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    /// Gets the statically configured endpoints.
    pub fn discovery(&self) -> &[ConnectionDescriptor] {
        &self.discovery
    }

    /// Loads every fixture definition. Definitions that cannot be used are logged
    /// and left out.
    pub fn load_fixtures(&self) -> Result<FixtureLibrary, Box<dyn Error>> {
        let sources = super::fixture_sources(&self.fixture_paths())?;
        let mut library = FixtureLibrary::new();
        let loaded = library.load_all(&YamlFixtureProvider {}, &sources);
        info!(
            loaded,
            skipped = sources.len() - loaded,
            "Fixture library loaded."
        );
        Ok(library)
    }

    /// Builds the universe from the patch.
    pub fn build_universe(&self, library: &FixtureLibrary) -> Result<Universe, PatchError> {
        let mut universe = Universe::new(self.universe());
        for entry in self.patch.iter() {
            let fixture = library
                .get(entry.fixture())
                .ok_or_else(|| PatchError::UnknownFixture(entry.fixture().to_string()))?;
            universe.register(FixtureInstance::new(fixture, entry.mode(), entry.address())?)?;
        }
        Ok(universe)
    }
}
