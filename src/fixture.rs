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
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info};

use crate::mapping::ranges::RangeEntry;

pub mod instance;

pub use instance::FixtureInstance;

/// Descriptive metadata about a fixture definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Meta {
    /// The authors of the definition.
    pub authors: Vec<String>,
    /// When the definition was created.
    pub create_date: Option<String>,
    /// When the definition was last modified.
    pub last_modify_date: Option<String>,
}

/// Links to further information about a fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Links {
    pub manual: Vec<String>,
    pub product_page: Vec<String>,
    pub video: Vec<String>,
}

/// A channel definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// The name of the channel.
    name: String,

    /// The value the channel starts at.
    default_value: Option<u8>,

    /// The name of the channel carrying the fine byte, if this is a 16 bit channel.
    fine_alias: Option<String>,

    /// The capability ranges of this channel, in ascending order.
    ranges: Vec<RangeEntry>,
}

impl Channel {
    /// Creates a new channel definition.
    pub fn new(
        name: String,
        default_value: Option<u8>,
        fine_alias: Option<String>,
        ranges: Vec<RangeEntry>,
    ) -> Channel {
        Channel {
            name,
            default_value,
            fine_alias,
            ranges,
        }
    }

    /// Gets the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the default value.
    pub fn default_value(&self) -> Option<u8> {
        self.default_value
    }

    /// Gets the fine channel alias.
    pub fn fine_alias(&self) -> Option<&str> {
        self.fine_alias.as_deref()
    }

    /// Gets the capability ranges.
    pub fn ranges(&self) -> &[RangeEntry] {
        &self.ranges
    }
}

/// A mode is a named channel layout of a fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    /// The name of the mode.
    name: String,

    /// A short name for the mode.
    short_name: Option<String>,

    /// The channels of the mode, in DMX order.
    channels: Vec<String>,
}

impl Mode {
    /// Creates a new mode.
    pub fn new(name: String, short_name: Option<String>, channels: Vec<String>) -> Mode {
        Mode {
            name,
            short_name,
            channels,
        }
    }

    /// Gets the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the short name.
    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    /// Gets the channel names in DMX order.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// The number of DMX slots this mode occupies.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if the mode contains the given channel.
    pub fn has_channel(&self, name: &str) -> bool {
        self.channel_offset(name).is_some()
    }

    /// Gets the zero based offset of the channel from the start address.
    pub fn channel_offset(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|channel| channel == name)
    }
}

/// A fixture definition. Definitions are immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    /// The name of the fixture.
    name: String,

    /// Categories, e.g. "Moving Head" or "Color Changer".
    categories: Vec<String>,

    /// Descriptive metadata.
    meta: Meta,

    /// Links to manuals and product pages.
    links: Links,

    /// The available modes.
    modes: Vec<Mode>,

    /// The available channels by name.
    channels: HashMap<String, Channel>,
}

impl Fixture {
    /// Creates a new fixture definition.
    pub fn new(
        name: String,
        categories: Vec<String>,
        meta: Meta,
        links: Links,
        modes: Vec<Mode>,
        channels: HashMap<String, Channel>,
    ) -> Fixture {
        Fixture {
            name,
            categories,
            meta,
            links,
            modes,
            channels,
        }
    }

    /// Gets the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the categories.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Gets the metadata.
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Gets the links.
    pub fn links(&self) -> &Links {
        &self.links
    }

    /// Gets the modes.
    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    /// Gets the index of the mode with the given name.
    pub fn mode_index(&self, name: &str) -> Option<usize> {
        self.modes.iter().position(|mode| mode.name() == name)
    }

    /// Gets the mode with the given name.
    pub fn mode(&self, name: &str) -> Option<&Mode> {
        self.modes.iter().find(|mode| mode.name() == name)
    }

    /// Gets the available channels.
    pub fn channels(&self) -> &HashMap<String, Channel> {
        &self.channels
    }

    /// Gets a channel definition by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.categories.is_empty() {
            write!(f, " [{}]", self.categories.join(", "))?;
        }
        Ok(())
    }
}

/// Supplies fixture definitions from some source, e.g. a definition file.
pub trait FixtureProvider {
    /// Loads the fixture definition identified by the given source.
    fn provide(&self, source: &str) -> Result<Fixture, Box<dyn Error>>;
}

/// The set of fixture definitions loaded for a session, keyed by fixture name.
#[derive(Default)]
pub struct FixtureLibrary {
    fixtures: HashMap<String, Arc<Fixture>>,
}

impl FixtureLibrary {
    /// Creates a new, empty library.
    pub fn new() -> FixtureLibrary {
        FixtureLibrary {
            fixtures: HashMap::new(),
        }
    }

    /// Loads every source through the provider. Sources that fail to load are
    /// logged and skipped; the returned count is the number of fixtures loaded.
    pub fn load_all<P: FixtureProvider + ?Sized>(&mut self, provider: &P, sources: &[String]) -> usize {
        let mut loaded = 0;
        for source in sources {
            match provider.provide(source) {
                Ok(fixture) => {
                    info!(
                        fixture = fixture.name(),
                        source = source.as_str(),
                        "Loaded fixture definition."
                    );
                    self.insert(fixture);
                    loaded += 1;
                }
                Err(e) => error!(
                    err = e.as_ref(),
                    source = source.as_str(),
                    "Unable to load fixture definition"
                ),
            }
        }
        loaded
    }

    /// Adds a fixture to the library, replacing any fixture with the same name.
    pub fn insert(&mut self, fixture: Fixture) -> Arc<Fixture> {
        let fixture = Arc::new(fixture);
        self.fixtures
            .insert(fixture.name().to_string(), fixture.clone());
        fixture
    }

    /// Gets a fixture by name.
    pub fn get(&self, name: &str) -> Option<Arc<Fixture>> {
        self.fixtures.get(name).cloned()
    }

    /// Gets all fixtures sorted by name.
    pub fn sorted(&self) -> Vec<Arc<Fixture>> {
        let mut fixtures: Vec<Arc<Fixture>> = self.fixtures.values().cloned().collect();
        fixtures.sort_by(|a, b| a.name().cmp(b.name()));
        fixtures
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::{Channel, Fixture, Links, Meta, Mode};
    use crate::mapping::ranges::ChannelRangeTable;

    /// A five channel spot with a color and gobo wheel and no fine channels.
    pub fn tcl_spot() -> Arc<Fixture> {
        let channels = [
            Channel::new("Pan".into(), Some(128), None, vec![]),
            Channel::new("Tilt".into(), Some(128), None, vec![]),
            Channel::new(
                "Color Wheel".into(),
                None,
                None,
                ChannelRangeTable::color_wheel().entries().to_vec(),
            ),
            Channel::new(
                "Gobo Wheel".into(),
                None,
                None,
                ChannelRangeTable::gobo_wheel().entries().to_vec(),
            ),
            Channel::new("Dimmer".into(), Some(255), None, vec![]),
        ];
        fixture(
            "LED Party TCL Spot",
            vec![Mode::new(
                "5-channel".into(),
                Some("5ch".into()),
                channels.iter().map(|c| c.name().to_string()).collect(),
            )],
            channels,
        )
    }

    /// A moving head with 16 bit pan and tilt in its 11 channel mode.
    pub fn pico_spot() -> Arc<Fixture> {
        let channels = [
            Channel::new("Pan".into(), None, Some("Pan fine".into()), vec![]),
            Channel::new("Tilt".into(), None, Some("Tilt fine".into()), vec![]),
            Channel::new("Pan/Tilt Speed".into(), None, None, vec![]),
            Channel::new(
                "Color Wheel".into(),
                None,
                None,
                ChannelRangeTable::color_wheel().entries().to_vec(),
            ),
            Channel::new(
                "Gobo Wheel".into(),
                None,
                None,
                ChannelRangeTable::gobo_wheel().entries().to_vec(),
            ),
            Channel::new("Dimmer".into(), Some(255), None, vec![]),
            Channel::new("Shutter / Strobe".into(), None, None, vec![]),
            Channel::new(
                "Program".into(),
                None,
                None,
                ChannelRangeTable::picospot_program().entries().to_vec(),
            ),
            Channel::new("Program Speed".into(), Some(127), None, vec![]),
        ];
        let nine = [
            "Pan",
            "Tilt",
            "Pan/Tilt Speed",
            "Color Wheel",
            "Gobo Wheel",
            "Dimmer",
            "Shutter / Strobe",
            "Program",
            "Program Speed",
        ];
        let eleven = [
            "Pan",
            "Pan fine",
            "Tilt",
            "Tilt fine",
            "Pan/Tilt Speed",
            "Color Wheel",
            "Gobo Wheel",
            "Dimmer",
            "Shutter / Strobe",
            "Program",
            "Program Speed",
        ];
        fixture(
            "PicoSpot 20 LED",
            vec![
                Mode::new(
                    "9-channel".into(),
                    Some("9ch".into()),
                    nine.iter().map(|c| c.to_string()).collect(),
                ),
                Mode::new(
                    "11-channel".into(),
                    Some("11ch".into()),
                    eleven.iter().map(|c| c.to_string()).collect(),
                ),
            ],
            channels,
        )
    }

    /// A dimmer pack with a configurable number of identical channels.
    pub fn dimmer_pack(count: usize) -> Arc<Fixture> {
        let channels: Vec<Channel> = (1..=count)
            .map(|i| Channel::new(format!("Dimmer {}", i), None, None, vec![]))
            .collect();
        fixture(
            "Dimmer Pack",
            vec![Mode::new(
                format!("{}-channel", count),
                None,
                channels.iter().map(|c| c.name().to_string()).collect(),
            )],
            channels,
        )
    }

    fn fixture(
        name: &str,
        modes: Vec<Mode>,
        channels: impl IntoIterator<Item = Channel>,
    ) -> Arc<Fixture> {
        Arc::new(Fixture::new(
            name.into(),
            vec!["Moving Head".into()],
            Meta::default(),
            Links::default(),
            modes,
            channels
                .into_iter()
                .map(|c| (c.name().to_string(), c))
                .collect::<HashMap<String, Channel>>(),
        ))
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use super::testutil::{pico_spot, tcl_spot};
    use super::*;

    struct MapProvider;

    impl FixtureProvider for MapProvider {
        fn provide(&self, source: &str) -> Result<Fixture, Box<dyn Error>> {
            match source {
                "tcl" => Ok(tcl_spot().as_ref().clone()),
                "pico" => Ok(pico_spot().as_ref().clone()),
                _ => Err(format!("unknown source {}", source).into()),
            }
        }
    }

    #[test]
    fn test_mode_lookup() {
        let pico = pico_spot();
        let mode = pico.mode("11-channel").expect("mode");
        assert_eq!(11, mode.channel_count());
        assert_eq!(Some(1), mode.channel_offset("Pan fine"));
        assert!(mode.has_channel("Tilt fine"));
        assert!(!pico.mode("9-channel").expect("mode").has_channel("Tilt fine"));
        assert_eq!(Some(1), pico.mode_index("11-channel"));
        assert_eq!(None, pico.mode("4-channel"));
    }

    #[test]
    fn test_channel_lookup() {
        let pico = pico_spot();
        let pan = pico.channel("Pan").expect("channel");
        assert_eq!(Some("Pan fine"), pan.fine_alias());
        assert_eq!(None, pan.default_value());
        assert_eq!(Some(255), pico.channel("Dimmer").and_then(|c| c.default_value()));
    }

    #[test]
    fn test_library_skips_unusable_fixtures() {
        let mut library = FixtureLibrary::new();
        let loaded = library.load_all(
            &MapProvider,
            &["tcl".to_string(), "broken".to_string(), "pico".to_string()],
        );

        assert_eq!(2, loaded);
        assert_eq!(2, library.len());
        assert!(library.get("PicoSpot 20 LED").is_some());
        assert_eq!(
            vec!["LED Party TCL Spot", "PicoSpot 20 LED"],
            library
                .sorted()
                .iter()
                .map(|f| f.name().to_string())
                .collect::<Vec<String>>()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!("PicoSpot 20 LED [Moving Head]", pico_spot().to_string());
    }
}
