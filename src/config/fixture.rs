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

use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::fixture::{Channel, Fixture, FixtureProvider, Links, Meta, Mode};
use crate::mapping::ranges::{ChannelRangeTable, RangeEntry};

use super::error::ConfigError;

/// A YAML fixture definition.
#[derive(Deserialize)]
pub struct FixtureDefinition {
    /// The name of the fixture.
    name: String,

    /// The categories the fixture belongs to.
    #[serde(default)]
    categories: Vec<String>,

    #[serde(default)]
    meta: Meta,

    #[serde(default)]
    links: Links,

    /// The channels the fixture offers, keyed by name.
    channels: HashMap<String, ChannelDefinition>,

    /// The modes, each an ordered channel layout.
    modes: Vec<ModeDefinition>,
}

/// A YAML representation of a channel.
#[derive(Deserialize)]
struct ChannelDefinition {
    default_value: Option<u8>,

    /// The channel carrying the fine byte.
    fine_channel: Option<String>,

    #[serde(default)]
    ranges: Vec<RangeEntry>,
}

/// A YAML representation of a mode.
#[derive(Deserialize)]
struct ModeDefinition {
    name: String,
    short_name: Option<String>,
    channels: Vec<String>,
}

impl FixtureDefinition {
    /// Parses a fixture definition from YAML.
    pub fn parse(yaml: &str, path: &str) -> Result<FixtureDefinition, ConfigError> {
        serde_yml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Reads a fixture definition file.
    pub fn deserialize(path: &Path) -> Result<FixtureDefinition, ConfigError> {
        let display = path.display().to_string();
        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        FixtureDefinition::parse(&yaml, &display)
    }

    /// Validates the definition and converts it into a fixture.
    pub fn to_fixture(self) -> Result<Fixture, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidFixture {
            fixture: self.name.clone(),
            reason,
        };

        if self.modes.is_empty() {
            return Err(invalid("no modes defined".into()));
        }

        let mut channels = HashMap::new();
        for (name, definition) in self.channels.iter() {
            if let Some(fine) = definition.fine_channel.as_deref() {
                if !self.channels.contains_key(fine) {
                    return Err(invalid(format!(
                        "channel {} uses undefined fine channel {}",
                        name, fine
                    )));
                }
            }
            let channel = Channel::new(
                name.clone(),
                definition.default_value,
                definition.fine_channel.clone(),
                definition.ranges.clone(),
            );
            ChannelRangeTable::from_channel(&channel)
                .map_err(|e| invalid(format!("channel {}: {}", name, e)))?;
            channels.insert(name.clone(), channel);
        }

        let mut modes = Vec::with_capacity(self.modes.len());
        for mode in self.modes.iter() {
            if mode.channels.is_empty() {
                return Err(invalid(format!("mode {} has no channels", mode.name)));
            }
            if let Some(unknown) = mode
                .channels
                .iter()
                .find(|channel| !channels.contains_key(channel.as_str()))
            {
                return Err(invalid(format!(
                    "mode {} uses undefined channel {}",
                    mode.name, unknown
                )));
            }
            modes.push(Mode::new(
                mode.name.clone(),
                mode.short_name.clone(),
                mode.channels.clone(),
            ));
        }

        Ok(Fixture::new(
            self.name.clone(),
            self.categories.clone(),
            self.meta.clone(),
            self.links.clone(),
            modes,
            channels,
        ))
    }
}

/// Loads fixtures from YAML definition files.
pub struct YamlFixtureProvider {}

impl FixtureProvider for YamlFixtureProvider {
    fn provide(&self, source: &str) -> Result<Fixture, Box<dyn Error>> {
        Ok(FixtureDefinition::deserialize(Path::new(source))?.to_fixture()?)
    }
}
