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
use std::fs;
use std::path::PathBuf;

use tracing::debug;

mod animation;
mod dmx;
mod error;
mod fixture;
mod setup;

pub use animation::{Animation, Bounds};
pub use dmx::{Dmx, RendererKind};
pub use error::ConfigError;
pub use fixture::{FixtureDefinition, YamlFixtureProvider};
pub use setup::{PatchEntry, Setup};

/// Expands the given paths into fixture definition files. Directories are searched
/// recursively for YAML files; plain files are taken as they are.
pub fn fixture_sources(paths: &[PathBuf]) -> Result<Vec<String>, Box<dyn Error>> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<Result<_, _>>()?;
            entries.sort();

            for entry in entries {
                let is_yaml = entry
                    .extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml");
                if entry.is_dir() || is_yaml {
                    sources.extend(fixture_sources(&[entry])?);
                }
            }
        } else {
            sources.push(path.display().to_string());
        }
    }
    debug!(count = sources.len(), "Found fixture definition files.");
    Ok(sources)
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::fixture_sources;

    #[test]
    fn test_fixture_sources() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).expect("mkdir");
        fs::write(dir.path().join("b.yaml"), "").expect("write");
        fs::write(dir.path().join("a.yml"), "").expect("write");
        fs::write(dir.path().join("notes.txt"), "").expect("write");
        fs::write(nested.join("c.yaml"), "").expect("write");
        let explicit = dir.path().join("notes.txt");

        let sources = fixture_sources(&[dir.path().to_path_buf(), explicit]).expect("sources");
        let names: Vec<String> = sources
            .iter()
            .map(|source| {
                source
                    .trim_start_matches(dir.path().to_str().unwrap())
                    .to_string()
            })
            .collect();
        assert_eq!(
            vec!["/a.yml", "/b.yaml", "/nested/c.yaml", "/notes.txt"],
            names
        );
    }
}
