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

use crate::animation::Point;
use crate::dmx::coordinator::CommitOutcome;
use crate::fixture::Channel;

use super::coarse_fine::normalized_to_u16;
use super::mapper::{ChannelValueMapper, Targets};
use super::ranges::{ChannelRangeTable, RangeTableError};

/// Errors raised by controls.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("no control for channel {0}")]
    UnknownChannel(String),

    #[error("channel {channel} has no range named {label}")]
    UnknownLabel { channel: String, label: String },

    #[error("channel {0} has no ranges")]
    NoRanges(String),

    #[error("invalid ranges for channel {channel}: {source}")]
    InvalidRanges {
        channel: String,
        source: RangeTableError,
    },
}

/// Selects a named range on one or more channels that share a range table, such as
/// the color wheels of different fixtures.
pub struct RangeSelector {
    channels: Vec<String>,
    table: ChannelRangeTable,
}

impl RangeSelector {
    /// Creates a selector writing to the given channel names.
    pub fn new(channels: Vec<String>, table: ChannelRangeTable) -> RangeSelector {
        RangeSelector { channels, table }
    }

    /// Creates a selector from a fixture channel definition.
    pub fn for_channel(channel: &Channel) -> Result<RangeSelector, ControlError> {
        let table = ChannelRangeTable::from_channel(channel)
            .map_err(|source| ControlError::InvalidRanges {
                channel: channel.name().to_string(),
                source,
            })?
            .ok_or_else(|| ControlError::NoRanges(channel.name().to_string()))?;
        Ok(RangeSelector::new(vec![channel.name().to_string()], table))
    }

    /// Writes the start byte of the labelled range to every configured channel in
    /// one action. An unknown label writes nothing.
    pub fn select(
        &self,
        mapper: &mut ChannelValueMapper,
        targets: &Targets,
        label: &str,
    ) -> Result<CommitOutcome, ControlError> {
        let value = self
            .table
            .select_by_label(label)
            .ok_or_else(|| ControlError::UnknownLabel {
                channel: self.channels.join(", "),
                label: label.to_string(),
            })?;

        Ok(mapper.batch(|batch| {
            for channel in self.channels.iter() {
                batch.set_value(targets, channel, i32::from(value));
            }
        }))
    }

    /// Gets the channel names this selector writes.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Gets the range table.
    pub fn table(&self) -> &ChannelRangeTable {
        &self.table
    }
}

/// A continuous control over a single channel.
pub struct Slider {
    channel: String,
}

impl Slider {
    pub fn new(channel: &str) -> Slider {
        Slider {
            channel: channel.to_string(),
        }
    }

    /// Maps a fraction in [0, 1] to a byte. Out of range fractions are clamped.
    pub fn percent_to_byte(percent: f64) -> u8 {
        if percent.is_nan() {
            return 0;
        }
        (percent.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// Sets the channel to the fraction of its full range.
    pub fn set(
        &self,
        mapper: &mut ChannelValueMapper,
        targets: &Targets,
        percent: f64,
    ) -> CommitOutcome {
        mapper.set_value(
            targets,
            &self.channel,
            i32::from(Slider::percent_to_byte(percent)),
        )
    }

    /// Gets the channel name.
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

/// What a pan/tilt position means physically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readout {
    pub pan_degrees: f64,
    pub tilt_degrees: f64,
    pub speed: u8,
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pan: {:.0}°, Tilt: {:.0}°, Speed: {}",
            self.pan_degrees, self.tilt_degrees, self.speed
        )
    }
}

/// Maps a 2D pointer to pan and tilt. Each axis is written as a 16 bit value, with
/// the fine byte going to fixtures whose mode has a fine channel. The movement
/// speed channel is rewritten with every position.
pub struct PanTiltControl {
    pan: String,
    tilt: String,
    speed_channel: String,
    speed: u8,
    last: (u16, u16),
}

impl PanTiltControl {
    pub fn new(pan: &str, tilt: &str, speed_channel: &str) -> PanTiltControl {
        PanTiltControl {
            pan: pan.to_string(),
            tilt: tilt.to_string(),
            speed_channel: speed_channel.to_string(),
            speed: 127,
            last: (u16::MAX / 2, u16::MAX / 2),
        }
    }

    /// Applies a normalized pointer position in one action.
    pub fn apply(
        &mut self,
        mapper: &mut ChannelValueMapper,
        targets: &Targets,
        normalized: Point,
    ) -> CommitOutcome {
        let pan = normalized_to_u16(normalized.x);
        let tilt = normalized_to_u16(normalized.y);
        self.last = (pan, tilt);

        let speed = self.speed;
        mapper.batch(|batch| {
            batch.set_value16(targets, &self.pan, pan);
            batch.set_value16(targets, &self.tilt, tilt);
            batch.set_value(targets, &self.speed_channel, i32::from(speed));
        })
    }

    /// Sets the movement speed. Zero is the fastest movement.
    pub fn set_speed(
        &mut self,
        mapper: &mut ChannelValueMapper,
        targets: &Targets,
        speed: u8,
    ) -> CommitOutcome {
        self.speed = speed;
        mapper.set_value(targets, &self.speed_channel, i32::from(speed))
    }

    /// Gets the movement speed.
    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// The last applied position in degrees. Tilt is reported upside down, 180 at
    /// the top of the area.
    pub fn readout(&self) -> Readout {
        let (pan, tilt) = self.last;
        let max = f64::from(u16::MAX);
        Readout {
            pan_degrees: f64::from(pan) / max * 360.0,
            tilt_degrees: 180.0 - f64::from(tilt) / max * 180.0,
            speed: self.speed,
        }
    }
}

impl Default for PanTiltControl {
    fn default() -> Self {
        PanTiltControl::new("Pan", "Tilt", "Pan/Tilt Speed")
    }
}

#[cfg(test)]
mod test {
    use crate::mapping::mapper::testutil::demo_rig;
    use crate::mapping::ranges::RangeEntry;

    use super::*;

    #[test]
    fn test_range_selector() {
        let (mut mapper, renderer, ids) = demo_rig();
        let selector = RangeSelector::new(
            vec!["Color Wheel".into()],
            ChannelRangeTable::color_wheel(),
        );

        let outcome = selector
            .select(&mut mapper, &Targets::All, "Blue")
            .expect("select");
        assert_eq!(CommitOutcome::Rendered, outcome);
        for id in ids {
            assert_eq!(Some(55), mapper.get_channel_value(id, "Color Wheel"));
        }
        assert_eq!(1, renderer.count());
    }

    #[test]
    fn test_range_selector_unknown_label_writes_nothing() {
        let (mut mapper, renderer, _) = demo_rig();
        let selector = RangeSelector::new(
            vec!["Program".into()],
            ChannelRangeTable::picospot_program(),
        );

        assert!(matches!(
            selector.select(&mut mapper, &Targets::All, "Program 42"),
            Err(ControlError::UnknownLabel { .. })
        ));
        assert_eq!(0, renderer.count());
        assert_eq!(0, mapper.coordinator().commits());
    }

    #[test]
    fn test_range_selector_for_channel() {
        let ranged = Channel::new(
            "Gobo".into(),
            None,
            None,
            vec![RangeEntry::new(0, "Open"), RangeEntry::new(128, "Spin")],
        );
        let selector = RangeSelector::for_channel(&ranged).expect("selector");
        assert_eq!(&["Gobo".to_string()], selector.channels());
        assert_eq!("Spin", selector.table().lookup(200));

        let plain = Channel::new("Dimmer".into(), None, None, vec![]);
        assert!(matches!(
            RangeSelector::for_channel(&plain),
            Err(ControlError::NoRanges(_))
        ));

        let broken = Channel::new("Broken".into(), None, None, vec![RangeEntry::new(3, "A")]);
        assert!(matches!(
            RangeSelector::for_channel(&broken),
            Err(ControlError::InvalidRanges { .. })
        ));
    }

    #[test]
    fn test_percent_to_byte() {
        assert_eq!(0, Slider::percent_to_byte(0.0));
        assert_eq!(128, Slider::percent_to_byte(0.5));
        assert_eq!(255, Slider::percent_to_byte(1.0));
        assert_eq!(255, Slider::percent_to_byte(1.5));
        assert_eq!(0, Slider::percent_to_byte(-0.5));
        assert_eq!(0, Slider::percent_to_byte(f64::NAN));
    }

    #[test]
    fn test_slider() {
        let (mut mapper, renderer, ids) = demo_rig();
        let slider = Slider::new("Dimmer");

        slider.set(&mut mapper, &Targets::from(ids[1]), 0.2);
        assert_eq!(Some(51), mapper.get_channel_value(ids[1], "Dimmer"));
        assert_eq!(Some(255), mapper.get_channel_value(ids[0], "Dimmer"));
        assert_eq!(1, renderer.count());
    }

    #[test]
    fn test_pan_tilt_apply() {
        let (mut mapper, renderer, ids) = demo_rig();
        let (tcl, eleven) = (ids[0], ids[3]);
        let mut control = PanTiltControl::default();

        control.apply(&mut mapper, &Targets::All, Point::new(1.0, 0.5));

        assert_eq!(Some(255), mapper.get_channel_value(tcl, "Pan"));
        assert_eq!(Some(255), mapper.get_channel_value(eleven, "Pan"));
        assert_eq!(Some(255), mapper.get_channel_value(eleven, "Pan fine"));
        // 0.5 * 65535 truncates to 32767.
        assert_eq!(Some(127), mapper.get_channel_value(eleven, "Tilt"));
        assert_eq!(Some(255), mapper.get_channel_value(eleven, "Tilt fine"));
        assert_eq!(Some(127), mapper.get_channel_value(eleven, "Pan/Tilt Speed"));
        assert_eq!(None, mapper.get_channel_value(tcl, "Pan/Tilt Speed"));
        assert_eq!(1, renderer.count());
    }

    #[test]
    fn test_pan_tilt_speed_and_readout() {
        let (mut mapper, _, ids) = demo_rig();
        let mut control = PanTiltControl::default();

        control.set_speed(&mut mapper, &Targets::All, 0);
        assert_eq!(Some(0), mapper.get_channel_value(ids[2], "Pan/Tilt Speed"));

        control.apply(&mut mapper, &Targets::All, Point::new(0.5, 0.0));
        let readout = control.readout();
        assert!((readout.pan_degrees - 180.0).abs() < 0.01);
        assert_eq!(180.0, readout.tilt_degrees);
        assert_eq!("Pan: 180°, Tilt: 180°, Speed: 0", readout.to_string());

        control.apply(&mut mapper, &Targets::All, Point::new(0.0, 1.0));
        assert_eq!(0.0, control.readout().tilt_degrees);
    }
}
