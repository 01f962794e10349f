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
use std::fmt;
use std::sync::Arc;

use crate::dmx::universe::PatchError;
use crate::dmx::UNIVERSE_SIZE;

use super::{Fixture, Mode};

/// A fixture patched into a universe: a definition, a selected mode, a start
/// address and the live values of its channels.
#[derive(Debug, Clone)]
pub struct FixtureInstance {
    /// The fixture definition.
    fixture: Arc<Fixture>,

    /// The index of the selected mode in the fixture definition.
    mode: usize,

    /// The 1-based start address in the universe.
    start_address: u16,

    /// The current value of each channel in the selected mode.
    values: HashMap<String, u8>,
}

impl FixtureInstance {
    /// Creates a new fixture instance. Channels start at their default value, or 0.
    pub fn new(
        fixture: Arc<Fixture>,
        mode_name: &str,
        start_address: u16,
    ) -> Result<FixtureInstance, PatchError> {
        let mode = fixture
            .mode_index(mode_name)
            .ok_or_else(|| PatchError::UnknownMode {
                fixture: fixture.name().to_string(),
                mode: mode_name.to_string(),
            })?;
        if start_address == 0 || usize::from(start_address) > UNIVERSE_SIZE {
            return Err(PatchError::InvalidAddress(start_address));
        }

        let values = fixture.modes()[mode]
            .channels()
            .iter()
            .map(|name| {
                let default = fixture
                    .channel(name)
                    .and_then(|channel| channel.default_value())
                    .unwrap_or(0);
                (name.clone(), default)
            })
            .collect();

        Ok(FixtureInstance {
            fixture,
            mode,
            start_address,
            values,
        })
    }

    /// Gets the fixture definition.
    pub fn fixture(&self) -> &Arc<Fixture> {
        &self.fixture
    }

    /// Gets the selected mode.
    pub fn mode(&self) -> &Mode {
        &self.fixture.modes()[self.mode]
    }

    /// Gets the 1-based start address.
    pub fn start_address(&self) -> u16 {
        self.start_address
    }

    /// Gets the last address occupied by this instance. Computed wide so that an
    /// overflowing patch can be reported instead of wrapping.
    pub fn end_address(&self) -> usize {
        usize::from(self.start_address) + self.mode().channel_count().max(1) - 1
    }

    /// Returns true if the selected mode contains the channel.
    pub fn has_channel(&self, name: &str) -> bool {
        self.mode().has_channel(name)
    }

    /// Gets the universe address of the channel, if the selected mode contains it.
    pub fn address_of(&self, name: &str) -> Option<usize> {
        self.mode()
            .channel_offset(name)
            .map(|offset| usize::from(self.start_address) + offset)
    }

    /// Gets the current value of a channel.
    pub fn get_channel_value(&self, name: &str) -> Option<u8> {
        self.values.get(name).copied()
    }

    /// Gets the fine channel that pairs with the given coarse channel, if the
    /// definition declares one and the selected mode contains it.
    pub fn fine_channel_for(&self, name: &str) -> Option<&str> {
        self.fixture
            .channel(name)
            .and_then(|channel| channel.fine_alias())
            .filter(|alias| self.has_channel(alias))
    }

    /// Stores a channel value. Returns the universe address written, or None if the
    /// selected mode lacks the channel.
    pub(crate) fn store(&mut self, name: &str, value: u8) -> Option<usize> {
        let address = self.address_of(name)?;
        self.values.insert(name.to_string(), value);
        Some(address)
    }

    /// Gets the channel values in DMX order.
    pub fn values(&self) -> Vec<(&str, u8)> {
        self.mode()
            .channels()
            .iter()
            .map(|name| (name.as_str(), self.values.get(name).copied().unwrap_or(0)))
            .collect()
    }
}

impl fmt::Display for FixtureInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) @ {}",
            self.fixture.name(),
            self.mode().name(),
            self.start_address
        )
    }
}

#[cfg(test)]
mod test {
    use crate::dmx::universe::PatchError;
    use crate::fixture::testutil::{pico_spot, tcl_spot};

    use super::FixtureInstance;

    #[test]
    fn test_new_instance_uses_defaults() {
        let instance = FixtureInstance::new(tcl_spot(), "5-channel", 1).expect("instance");
        assert_eq!(Some(128), instance.get_channel_value("Pan"));
        assert_eq!(Some(0), instance.get_channel_value("Color Wheel"));
        assert_eq!(Some(255), instance.get_channel_value("Dimmer"));
        assert_eq!(None, instance.get_channel_value("Program"));
        assert_eq!(5, instance.end_address());
    }

    #[test]
    fn test_addresses() {
        let instance = FixtureInstance::new(pico_spot(), "11-channel", 11).expect("instance");
        assert_eq!(Some(11), instance.address_of("Pan"));
        assert_eq!(Some(12), instance.address_of("Pan fine"));
        assert_eq!(Some(21), instance.address_of("Program Speed"));
        assert_eq!(None, instance.address_of("Red"));
        assert_eq!(21, instance.end_address());
    }

    #[test]
    fn test_fine_channel_depends_on_mode() {
        let eleven = FixtureInstance::new(pico_spot(), "11-channel", 1).expect("instance");
        let nine = FixtureInstance::new(pico_spot(), "9-channel", 1).expect("instance");
        let tcl = FixtureInstance::new(tcl_spot(), "5-channel", 1).expect("instance");

        assert_eq!(Some("Pan fine"), eleven.fine_channel_for("Pan"));
        assert_eq!(None, nine.fine_channel_for("Pan"));
        assert_eq!(None, tcl.fine_channel_for("Pan"));
    }

    #[test]
    fn test_store() {
        let mut instance = FixtureInstance::new(pico_spot(), "9-channel", 20).expect("instance");
        assert_eq!(Some(25), instance.store("Dimmer", 42));
        assert_eq!(Some(42), instance.get_channel_value("Dimmer"));
        assert_eq!(None, instance.store("Tilt fine", 42));
        assert_eq!(None, instance.get_channel_value("Tilt fine"));
    }

    #[test]
    fn test_invalid_instances() {
        assert!(matches!(
            FixtureInstance::new(pico_spot(), "4-channel", 1),
            Err(PatchError::UnknownMode { .. })
        ));
        assert!(matches!(
            FixtureInstance::new(pico_spot(), "9-channel", 0),
            Err(PatchError::InvalidAddress(0))
        ));
        assert!(matches!(
            FixtureInstance::new(pico_spot(), "9-channel", 513),
            Err(PatchError::InvalidAddress(513))
        ));
    }

    #[test]
    fn test_display() {
        let instance = FixtureInstance::new(pico_spot(), "9-channel", 11).expect("instance");
        assert_eq!("PicoSpot 20 LED (9-channel) @ 11", instance.to_string());
    }
}
