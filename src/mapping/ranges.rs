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

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fixture::Channel;

/// A decorative payload attached to a range entry. The engine never interprets
/// these; they exist so that a display layer can show something next to the label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeMarker {
    /// A single color, as a hex string.
    Color(String),
    /// Two colors shown side by side, for split color wheel slots.
    Split(String, String),
    /// A path to an image (gobo pictures, icons).
    Image(String),
    /// A short text badge.
    Text(String),
}

/// A single named range of DMX values. The range ends where the next entry begins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RangeEntry {
    /// The first DMX value of this range.
    pub start: u8,
    /// The label of this range.
    pub label: String,
    /// An optional decorative payload.
    #[serde(default)]
    pub marker: Option<RangeMarker>,
}

impl RangeEntry {
    /// Creates a new range entry without a marker.
    pub fn new(start: u8, label: &str) -> RangeEntry {
        RangeEntry {
            start,
            label: label.to_string(),
            marker: None,
        }
    }

    /// Attaches a marker to this entry.
    pub fn with_marker(mut self, marker: RangeMarker) -> RangeEntry {
        self.marker = Some(marker);
        self
    }
}

/// Errors raised when a range table is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeTableError {
    #[error("range table has no entries")]
    Empty,

    #[error("range table must start at 0, but '{label}' starts at {start}")]
    NotStartingAtZero { label: String, start: u8 },

    #[error("range '{label}' ({start}) must start after '{previous}' ({previous_start})")]
    Unsorted {
        label: String,
        start: u8,
        previous: String,
        previous_start: u8,
    },

    #[error("duplicate range label '{0}'")]
    DuplicateLabel(String),
}

/// A sorted table mapping DMX values to labels.
///
/// Entries are sorted by start, never overlap, and the first entry starts at 0, so
/// every byte value maps to exactly one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRangeTable {
    entries: Vec<RangeEntry>,
}

impl ChannelRangeTable {
    /// Creates a new range table, validating the entries.
    pub fn new(entries: Vec<RangeEntry>) -> Result<ChannelRangeTable, RangeTableError> {
        let first = entries.first().ok_or(RangeTableError::Empty)?;
        if first.start != 0 {
            return Err(RangeTableError::NotStartingAtZero {
                label: first.label.clone(),
                start: first.start,
            });
        }

        for pair in entries.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if current.start <= previous.start {
                return Err(RangeTableError::Unsorted {
                    label: current.label.clone(),
                    start: current.start,
                    previous: previous.label.clone(),
                    previous_start: previous.start,
                });
            }
        }

        let mut labels = HashSet::new();
        for entry in entries.iter() {
            if !labels.insert(entry.label.as_str()) {
                return Err(RangeTableError::DuplicateLabel(entry.label.clone()));
            }
        }

        Ok(ChannelRangeTable { entries })
    }

    /// Builds a range table from the capability ranges of a channel. Channels
    /// without ranges are continuous and have no table.
    pub fn from_channel(channel: &Channel) -> Result<Option<ChannelRangeTable>, RangeTableError> {
        if channel.ranges().is_empty() {
            return Ok(None);
        }
        ChannelRangeTable::new(channel.ranges().to_vec()).map(Some)
    }

    /// Gets the entries of the table.
    pub fn entries(&self) -> &[RangeEntry] {
        &self.entries
    }

    /// Gets the index of the entry containing the given value.
    fn index_of(&self, value: u8) -> usize {
        // The first entry starts at 0, so the partition point is always at least 1.
        self.entries.partition_point(|entry| entry.start <= value) - 1
    }

    /// Gets the entry containing the given value.
    pub fn entry_for(&self, value: u8) -> &RangeEntry {
        &self.entries[self.index_of(value)]
    }

    /// Gets the label of the entry containing the given value.
    pub fn lookup(&self, value: u8) -> &str {
        &self.entry_for(value).label
    }

    /// Gets the last value covered by the entry at the given index.
    pub fn end_of(&self, index: usize) -> Option<u8> {
        self.entries.get(index)?;
        Some(match self.entries.get(index + 1) {
            Some(next) => next.start - 1,
            None => u8::MAX,
        })
    }

    /// Selects a range by label. The representative value of a range is its start.
    pub fn select_by_label(&self, label: &str) -> Option<u8> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.start)
    }

    /// The color wheel of the LED Party TCL spot.
    pub fn color_wheel() -> ChannelRangeTable {
        let solid = |start, label: &str, color: &str| {
            RangeEntry::new(start, label).with_marker(RangeMarker::Color(color.to_string()))
        };
        let split = |start, label: &str, left: &str, right: &str| {
            RangeEntry::new(start, label)
                .with_marker(RangeMarker::Split(left.to_string(), right.to_string()))
        };

        ChannelRangeTable {
            entries: vec![
                solid(0, "White", "#FFFFFF"),
                solid(11, "Red", "#FF0000"),
                solid(22, "Orange", "#FFA500"),
                solid(33, "Yellow", "#FFFF00"),
                solid(44, "Green", "#008000"),
                solid(55, "Blue", "#0000FF"),
                solid(66, "Cyan", "#00FFFF"),
                solid(77, "Purple", "#800080"),
                split(88, "White-Red", "#FFFFFF", "#FF0000"),
                split(99, "Red-Orange", "#FF0000", "#FFA500"),
                split(110, "Orange-Yellow", "#FFA500", "#FFFF00"),
                split(121, "Yellow-Green", "#FFFF00", "#008000"),
                split(132, "Green-Blue", "#008000", "#0000FF"),
                split(143, "Blue-Cyan", "#0000FF", "#00FFFF"),
                split(154, "Cyan-Purple", "#00FFFF", "#800080"),
                split(165, "Purple-White", "#800080", "#FFFFFF"),
                RangeEntry::new(176, "Rotation"),
            ],
        }
    }

    /// The gobo wheel shared by the LED Party TCL spot and the PicoSpot.
    pub fn gobo_wheel() -> ChannelRangeTable {
        let gobo = |start, label: &str, image: &str| {
            RangeEntry::new(start, label).with_marker(RangeMarker::Image(image.to_string()))
        };

        ChannelRangeTable {
            entries: vec![
                gobo(0, "Open", "gobo/open.jpg"),
                gobo(16, "Gobo 1", "gobo/gobo-1.jpg"),
                gobo(32, "Gobo 2", "gobo/gobo-2.jpg"),
                gobo(47, "Gobo 3", "gobo/gobo-3.jpg"),
                gobo(63, "Gobo 4", "gobo/gobo-4.jpg"),
                gobo(79, "Gobo 5", "gobo/gobo-5.jpg"),
                gobo(94, "Gobo 6", "gobo/gobo-6.jpg"),
                gobo(110, "Gobo 7", "gobo/gobo-7.jpg"),
                RangeEntry::new(125, "Gobo 1 shake"),
                RangeEntry::new(141, "Gobo 2 shake"),
                RangeEntry::new(157, "Gobo 3 shake"),
                RangeEntry::new(172, "Gobo 4 shake"),
                RangeEntry::new(188, "Gobo 5 shake"),
                RangeEntry::new(204, "Gobo 6 shake"),
                RangeEntry::new(219, "Gobo 7 shake"),
                RangeEntry::new(250, "Rotation"),
            ],
        }
    }

    /// The program channel of the PicoSpot 20 LED.
    pub fn picospot_program() -> ChannelRangeTable {
        let text = |start, label: &str, badge: &str| {
            RangeEntry::new(start, label).with_marker(RangeMarker::Text(badge.to_string()))
        };

        let mut entries = vec![
            RangeEntry::new(0, "None").with_marker(RangeMarker::Image("icon/none.png".into())),
            RangeEntry::new(50, "White").with_marker(RangeMarker::Color("#FFFFFF".into())),
        ];
        entries.extend((2..=9).map(|scene| {
            RangeEntry::new(40 + scene * 10, &format!("Scene {:02}", scene))
        }));
        entries.extend((1..=9).map(|program| {
            text(
                130 + program * 10,
                &format!("Program {}", program),
                &format!("P{}", program),
            )
        }));
        entries.push(RangeEntry::new(230, "Empty"));
        entries.push(
            RangeEntry::new(250, "Sound").with_marker(RangeMarker::Image("icon/sound-waves.png".into())),
        );

        ChannelRangeTable { entries }
    }
}

impl fmt::Display for ChannelRangeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, entry) in self.entries.iter().enumerate() {
            let end = self.end_of(index).unwrap_or(u8::MAX);
            writeln!(f, "{:>3} .. {:>3}: {}", entry.start, end, entry.label)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn colors() -> ChannelRangeTable {
        ChannelRangeTable::new(vec![
            RangeEntry::new(0, "White"),
            RangeEntry::new(11, "Red"),
            RangeEntry::new(22, "Orange"),
        ])
        .expect("valid table")
    }

    #[test]
    fn test_lookup_scenario() {
        let table = colors();
        assert_eq!("White", table.lookup(0));
        assert_eq!("White", table.lookup(10));
        assert_eq!("Red", table.lookup(11));
        assert_eq!("Red", table.lookup(15));
        assert_eq!("Red", table.lookup(21));
        assert_eq!("Orange", table.lookup(22));
        assert_eq!("Orange", table.lookup(255));
    }

    #[test]
    fn test_lookup_every_byte() {
        for table in [
            ChannelRangeTable::color_wheel(),
            ChannelRangeTable::gobo_wheel(),
            ChannelRangeTable::picospot_program(),
        ] {
            let entries = table.entries();
            for value in 0..=u8::MAX {
                let entry = table.entry_for(value);
                let index = entries.iter().position(|e| e == entry).unwrap();
                assert!(entry.start <= value);
                if let Some(next) = entries.get(index + 1) {
                    assert!(next.start > value);
                } else {
                    assert_eq!(index, entries.len() - 1);
                }
            }
        }
    }

    #[test]
    fn test_builtin_tables_are_valid() {
        for table in [
            ChannelRangeTable::color_wheel(),
            ChannelRangeTable::gobo_wheel(),
            ChannelRangeTable::picospot_program(),
        ] {
            assert_eq!(
                Ok(table.clone()),
                ChannelRangeTable::new(table.entries().to_vec())
            );
        }
    }

    #[test]
    fn test_select_by_label() {
        let table = colors();
        assert_eq!(Some(0), table.select_by_label("White"));
        assert_eq!(Some(11), table.select_by_label("Red"));
        assert_eq!(Some(22), table.select_by_label("Orange"));
        assert_eq!(None, table.select_by_label("Magenta"));

        let program = ChannelRangeTable::picospot_program();
        assert_eq!(Some(140), program.select_by_label("Program 1"));
        assert_eq!(Some(60), program.select_by_label("Scene 02"));
        assert_eq!(Some(250), program.select_by_label("Sound"));
    }

    #[test]
    fn test_end_of() {
        let table = colors();
        assert_eq!(Some(10), table.end_of(0));
        assert_eq!(Some(21), table.end_of(1));
        assert_eq!(Some(255), table.end_of(2));
        assert_eq!(None, table.end_of(3));
    }

    #[test]
    fn test_rejects_malformed_tables() {
        assert_eq!(Err(RangeTableError::Empty), ChannelRangeTable::new(vec![]));

        assert!(matches!(
            ChannelRangeTable::new(vec![RangeEntry::new(5, "Open")]),
            Err(RangeTableError::NotStartingAtZero { start: 5, .. })
        ));

        assert!(matches!(
            ChannelRangeTable::new(vec![
                RangeEntry::new(0, "White"),
                RangeEntry::new(22, "Orange"),
                RangeEntry::new(11, "Red"),
            ]),
            Err(RangeTableError::Unsorted { start: 11, .. })
        ));

        // Two entries with the same start overlap completely.
        assert!(matches!(
            ChannelRangeTable::new(vec![
                RangeEntry::new(0, "White"),
                RangeEntry::new(11, "Red"),
                RangeEntry::new(11, "Orange"),
            ]),
            Err(RangeTableError::Unsorted { .. })
        ));

        assert_eq!(
            Err(RangeTableError::DuplicateLabel("Red".into())),
            ChannelRangeTable::new(vec![
                RangeEntry::new(0, "Red"),
                RangeEntry::new(11, "Red"),
            ])
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            "  0 ..  10: White\n 11 ..  21: Red\n 22 .. 255: Orange\n",
            colors().to_string()
        );
    }
}
