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

use tracing::{info, trace, warn};

use crate::fixture::FixtureInstance;

use super::UNIVERSE_SIZE;

/// Errors raised while patching fixtures into a universe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("fixture '{0}' is not defined")]
    UnknownFixture(String),

    #[error("fixture '{fixture}' has no mode named '{mode}'")]
    UnknownMode { fixture: String, mode: String },

    #[error("start address {0} is outside of the universe (1..=512)")]
    InvalidAddress(u16),

    #[error(
        "fixture '{fixture}' at {start_address} needs {channels} channels and would end at {end_address}, past 512"
    )]
    AddressOverflow {
        fixture: String,
        start_address: u16,
        channels: usize,
        end_address: usize,
    },
}

/// Identifies a fixture instance within a universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(usize);

impl InstanceId {
    /// The position of the instance in patch order.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A DMX universe: the patched fixture instances and the 512 byte frame they
/// write into.
pub struct Universe {
    /// The name of this universe.
    name: String,
    /// The fixture instances in patch order.
    instances: Vec<FixtureInstance>,
    /// The current DMX frame. Address 1 is index 0.
    buffer: [u8; UNIVERSE_SIZE],
}

impl Universe {
    /// Creates a new, empty universe.
    pub fn new(name: &str) -> Universe {
        Universe {
            name: name.to_string(),
            instances: Vec::new(),
            buffer: [0; UNIVERSE_SIZE],
        }
    }

    /// Gets the name of the universe.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Patches a fixture instance into the universe. Instances that would run past
    /// the end of the universe are rejected and not added.
    pub fn register(&mut self, instance: FixtureInstance) -> Result<InstanceId, PatchError> {
        let end_address = instance.end_address();
        if end_address > UNIVERSE_SIZE {
            return Err(PatchError::AddressOverflow {
                fixture: instance.fixture().name().to_string(),
                start_address: instance.start_address(),
                channels: instance.mode().channel_count(),
                end_address,
            });
        }

        let start = usize::from(instance.start_address());
        for existing in self.instances.iter() {
            let existing_start = usize::from(existing.start_address());
            if start <= existing.end_address() && existing_start <= end_address {
                warn!(
                    fixture = instance.to_string(),
                    overlaps = existing.to_string(),
                    "Fixture addresses overlap."
                );
            }
        }

        for (name, value) in instance.values() {
            if let Some(address) = instance.address_of(name) {
                self.buffer[address - 1] = value;
            }
        }

        info!(
            universe = self.name.as_str(),
            fixture = instance.to_string(),
            "Patched fixture."
        );
        self.instances.push(instance);
        Ok(InstanceId(self.instances.len() - 1))
    }

    /// Gets the ids of all instances in patch order.
    pub fn ids(&self) -> Vec<InstanceId> {
        (0..self.instances.len()).map(InstanceId).collect()
    }

    /// Gets the instances in patch order.
    pub fn instances(&self) -> &[FixtureInstance] {
        &self.instances
    }

    /// Gets an instance by id.
    pub fn instance(&self, id: InstanceId) -> Option<&FixtureInstance> {
        self.instances.get(id.0)
    }

    /// Gets the value at a 1-based address.
    pub fn get(&self, address: usize) -> Option<u8> {
        if address == 0 {
            return None;
        }
        self.buffer.get(address - 1).copied()
    }

    /// Gets the whole frame.
    pub fn buffer(&self) -> &[u8; UNIVERSE_SIZE] {
        &self.buffer
    }

    /// Writes a channel of an instance, keeping the instance buffer and the frame in
    /// step. Returns false if the instance does not exist or lacks the channel.
    pub(crate) fn write(&mut self, id: InstanceId, channel: &str, value: u8) -> bool {
        let Some(instance) = self.instances.get_mut(id.0) else {
            return false;
        };
        match instance.store(channel, value) {
            Some(address) => {
                trace!(address, channel, value, "Channel written.");
                self.buffer[address - 1] = value;
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Universe {} ({} fixtures):", self.name, self.instances.len())?;
        for instance in self.instances.iter() {
            writeln!(f, "- {}", instance)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::fixture::testutil::{dimmer_pack, pico_spot, tcl_spot};
    use crate::fixture::FixtureInstance;

    use super::{PatchError, Universe};

    #[test]
    fn test_register_seeds_frame() {
        let mut universe = Universe::new("main");
        let id = universe
            .register(FixtureInstance::new(tcl_spot(), "5-channel", 6).expect("instance"))
            .expect("register");

        assert_eq!(0, id.index());
        assert_eq!(Some(0), universe.get(5));
        assert_eq!(Some(128), universe.get(6));
        assert_eq!(Some(128), universe.get(7));
        assert_eq!(Some(255), universe.get(10));
        assert_eq!(Some(0), universe.get(11));
        assert_eq!(None, universe.get(0));
        assert_eq!(None, universe.get(513));
    }

    #[test]
    fn test_address_overflow_is_rejected() {
        let mut universe = Universe::new("main");
        let result = universe
            .register(FixtureInstance::new(dimmer_pack(20), "20-channel", 500).expect("instance"));

        assert_eq!(
            Err(PatchError::AddressOverflow {
                fixture: "Dimmer Pack".into(),
                start_address: 500,
                channels: 20,
                end_address: 519,
            }),
            result
        );
        assert!(universe.instances().is_empty());
    }

    #[test]
    fn test_last_slot_is_accepted() {
        let mut universe = Universe::new("main");
        assert!(universe
            .register(FixtureInstance::new(dimmer_pack(20), "20-channel", 493).expect("instance"))
            .is_ok());
        assert!(universe
            .register(FixtureInstance::new(dimmer_pack(1), "1-channel", 512).expect("instance"))
            .is_ok());
        assert_eq!(2, universe.ids().len());
    }

    #[test]
    fn test_write() {
        let mut universe = Universe::new("main");
        let pico = universe
            .register(FixtureInstance::new(pico_spot(), "9-channel", 11).expect("instance"))
            .expect("register");

        assert!(universe.write(pico, "Dimmer", 99));
        assert_eq!(Some(99), universe.get(16));
        assert_eq!(
            Some(99),
            universe
                .instance(pico)
                .and_then(|i| i.get_channel_value("Dimmer"))
        );

        assert!(!universe.write(pico, "Pan fine", 99));
    }

    #[test]
    fn test_overlap_is_allowed() {
        let mut universe = Universe::new("main");
        universe
            .register(FixtureInstance::new(tcl_spot(), "5-channel", 1).expect("instance"))
            .expect("register");
        assert!(universe
            .register(FixtureInstance::new(tcl_spot(), "5-channel", 3).expect("instance"))
            .is_ok());
    }
}
