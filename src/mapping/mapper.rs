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

use tracing::trace;

use crate::dmx::coordinator::CommitOutcome;
use crate::dmx::{InstanceId, RenderCoordinator, Universe};

use super::coarse_fine::encode16;

/// Clamps a raw value into the byte range.
#[inline]
pub fn clamp_byte(value: i32) -> u8 {
    value.clamp(i32::from(u8::MIN), i32::from(u8::MAX)) as u8
}

/// The fixture instances an action applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    /// Every instance in the universe.
    All,
    /// Only the listed instances.
    Only(Vec<InstanceId>),
}

impl Targets {
    fn resolve(&self, universe: &Universe) -> Vec<InstanceId> {
        match self {
            Targets::All => universe.ids(),
            Targets::Only(ids) => ids.clone(),
        }
    }
}

impl From<Vec<InstanceId>> for Targets {
    fn from(ids: Vec<InstanceId>) -> Self {
        Targets::Only(ids)
    }
}

impl From<InstanceId> for Targets {
    fn from(id: InstanceId) -> Self {
        Targets::Only(vec![id])
    }
}

/// The channel writes of one logical action.
pub struct Batch<'a> {
    universe: &'a mut Universe,
    writes: usize,
}

impl Batch<'_> {
    /// Writes a clamped value to the channel of every target that has it. Targets
    /// without the channel are skipped. Returns the number of channels written.
    pub fn set_value(&mut self, targets: &Targets, channel: &str, value: i32) -> usize {
        let value = clamp_byte(value);
        let mut written = 0;
        for id in targets.resolve(self.universe) {
            if self.universe.write(id, channel, value) {
                written += 1;
            } else {
                trace!(instance = id.index(), channel, "Instance lacks channel, skipped.");
            }
        }
        self.writes += written;
        written
    }

    /// Writes a 16 bit value. The coarse byte goes to the channel; the fine byte goes
    /// to the fine alias on targets whose mode has one. Targets without a fine
    /// channel get the coarse byte only.
    pub fn set_value16(&mut self, targets: &Targets, channel: &str, value: u16) -> usize {
        let bytes = encode16(value);
        let mut written = 0;
        for id in targets.resolve(self.universe) {
            let fine_channel = match self.universe.instance(id) {
                Some(instance) => instance.fine_channel_for(channel).map(str::to_string),
                None => continue,
            };

            if self.universe.write(id, channel, bytes.coarse) {
                written += 1;
            }
            if let Some(fine_channel) = fine_channel {
                if self.universe.write(id, &fine_channel, bytes.fine) {
                    written += 1;
                }
            }
        }
        self.writes += written;
        written
    }

    /// The number of channels written so far in this batch.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

/// Turns control intents into channel writes on the universe's fixture instances and
/// commits each logical action exactly once.
pub struct ChannelValueMapper {
    universe: Universe,
    coordinator: RenderCoordinator,
}

impl ChannelValueMapper {
    /// Creates a new mapper that owns the universe.
    pub fn new(universe: Universe, coordinator: RenderCoordinator) -> ChannelValueMapper {
        ChannelValueMapper {
            universe,
            coordinator,
        }
    }

    /// Runs a logical action. All writes made through the batch are committed with a
    /// single render request afterwards.
    pub fn batch<F>(&mut self, action: F) -> CommitOutcome
    where
        F: FnOnce(&mut Batch<'_>),
    {
        let writes = {
            let mut batch = Batch {
                universe: &mut self.universe,
                writes: 0,
            };
            action(&mut batch);
            batch.writes
        };
        trace!(writes, "Action complete.");
        self.coordinator.commit(&self.universe)
    }

    /// Sets a channel on the targets as one logical action.
    pub fn set_value(&mut self, targets: &Targets, channel: &str, value: i32) -> CommitOutcome {
        self.batch(|batch| {
            batch.set_value(targets, channel, value);
        })
    }

    /// Sets a 16 bit channel on the targets as one logical action.
    pub fn set_value16(&mut self, targets: &Targets, channel: &str, value: u16) -> CommitOutcome {
        self.batch(|batch| {
            batch.set_value16(targets, channel, value);
        })
    }

    /// Returns true if the instance's mode has the channel.
    pub fn has_channel(&self, id: InstanceId, channel: &str) -> bool {
        self.universe
            .instance(id)
            .is_some_and(|instance| instance.has_channel(channel))
    }

    /// Gets the current value of a channel of an instance.
    pub fn get_channel_value(&self, id: InstanceId, channel: &str) -> Option<u8> {
        self.universe
            .instance(id)
            .and_then(|instance| instance.get_channel_value(channel))
    }

    /// Sends a deferred commit if one is due.
    pub fn flush(&mut self) -> Option<CommitOutcome> {
        self.coordinator.flush(&self.universe)
    }

    /// Gets the universe.
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Gets the render coordinator.
    pub fn coordinator(&self) -> &RenderCoordinator {
        &self.coordinator
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::time::Duration;

    use crate::dmx::renderer::MemoryRenderer;
    use crate::dmx::{InstanceId, RenderCoordinator, Universe};
    use crate::fixture::testutil::{pico_spot, tcl_spot};
    use crate::fixture::FixtureInstance;

    use super::ChannelValueMapper;

    /// The rig from the demo application: two TCL spots and two PicoSpots, one of
    /// them in its 16 bit mode.
    pub fn demo_rig() -> (ChannelValueMapper, MemoryRenderer, Vec<InstanceId>) {
        let mut universe = Universe::new("demo");
        let ids = vec![
            universe
                .register(FixtureInstance::new(tcl_spot(), "5-channel", 1).unwrap())
                .unwrap(),
            universe
                .register(FixtureInstance::new(tcl_spot(), "5-channel", 6).unwrap())
                .unwrap(),
            universe
                .register(FixtureInstance::new(pico_spot(), "9-channel", 11).unwrap())
                .unwrap(),
            universe
                .register(FixtureInstance::new(pico_spot(), "11-channel", 23).unwrap())
                .unwrap(),
        ];
        let renderer = MemoryRenderer::new();
        let coordinator = RenderCoordinator::new(Box::new(renderer.clone()), Duration::ZERO);
        (ChannelValueMapper::new(universe, coordinator), renderer, ids)
    }
}
