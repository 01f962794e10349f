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
use std::path::PathBuf;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use duration_string::DurationString;
use tracing_subscriber::EnvFilter;

use dmxctl::config::Setup;
use dmxctl::connection::{ConnectionEvent, StaticDiscovery};
use dmxctl::dmx::{self, renderer::MemoryRenderer};
use dmxctl::mapping::ChannelRangeTable;
use dmxctl::Session;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Maps control intents onto DMX512 fixture channels."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the fixture definitions a setup loads.
    Fixtures {
        /// The path to the setup file.
        setup: String,
    },
    /// Verifies the patch of a setup and prints the universe.
    Patch {
        /// The path to the setup file.
        setup: String,
    },
    /// Prints the range table of a fixture channel.
    Ranges {
        /// The path to the setup file.
        setup: String,
        /// The name of the fixture.
        fixture: String,
        /// The name of the channel.
        channel: String,
    },
    /// Sets a channel on every patched fixture that has it and prints the frame.
    Set {
        /// The path to the setup file.
        setup: String,
        /// The name of the channel.
        channel: String,
        /// The value. Values outside 0-255 are clamped.
        #[arg(allow_hyphen_values = true)]
        value: i32,
    },
    /// Runs the pan/tilt waypoint animation through the configured renderer.
    Animate {
        /// The path to the setup file.
        setup: String,
        /// How long to run for.
        #[arg(short, long, default_value = "10s")]
        duration: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fixtures { setup } => {
            let setup = Setup::deserialize(&PathBuf::from(&setup))?;
            let library = setup.load_fixtures()?;
            if library.is_empty() {
                println!("No fixtures found.");
                return Ok(());
            }

            println!("Fixtures (count: {}):", library.len());
            for fixture in library.sorted() {
                println!("- {}", fixture);
                for mode in fixture.modes() {
                    println!(
                        "  - {} ({} channels): {}",
                        mode.name(),
                        mode.channel_count(),
                        mode.channels().join(", ")
                    );
                }
            }
        }
        Commands::Patch { setup } => {
            let setup = Setup::deserialize(&PathBuf::from(&setup))?;
            let library = setup.load_fixtures()?;
            let universe = setup.build_universe(&library)?;
            print!("{}", universe);
            for instance in universe.instances() {
                println!(
                    "  {} .. {}: {}",
                    instance.start_address(),
                    instance.end_address(),
                    instance.mode().channels().join(", ")
                );
            }
        }
        Commands::Ranges {
            setup,
            fixture,
            channel,
        } => {
            let setup = Setup::deserialize(&PathBuf::from(&setup))?;
            let library = setup.load_fixtures()?;
            let definition = library
                .get(&fixture)
                .ok_or_else(|| format!("fixture {} not found", fixture))?;
            let definition = definition
                .channel(&channel)
                .ok_or_else(|| format!("fixture {} has no channel {}", fixture, channel))?;
            match ChannelRangeTable::from_channel(definition)? {
                Some(table) => print!("{}", table),
                None => println!("{} has no ranges.", channel),
            }
        }
        Commands::Set {
            setup,
            channel,
            value,
        } => {
            let setup = Setup::deserialize(&PathBuf::from(&setup))?;
            let library = setup.load_fixtures()?;
            let renderer = MemoryRenderer::new();
            let mut session = Session::from_setup(&setup, &library, Box::new(renderer.clone()))?;
            session.set_value(&channel, value);

            let frame = renderer.last().ok_or("no frame was rendered")?;
            for instance in session.mapper().universe().instances() {
                println!("{}", instance);
                for name in instance.mode().channels() {
                    if let Some(address) = instance.address_of(name) {
                        println!("  {:>3} {:<20} {}", address, name, frame[address - 1]);
                    }
                }
            }
        }
        Commands::Animate { setup, duration } => {
            let duration: Duration = DurationString::from_string(duration)?.into();
            let setup = Setup::deserialize(&PathBuf::from(&setup))?;
            let library = setup.load_fixtures()?;
            let renderer = dmx::create_renderer(setup.dmx())?;
            let mut session = Session::from_setup(&setup, &library, renderer)?;

            let events = session.subscribe();
            if !setup.discovery().is_empty() {
                session.start_discovery(StaticDiscovery::new(setup.discovery().to_vec()));
                session.wait_for_discovery(Duration::from_secs(5));
            }
            if let Some(connection) = session.connect_first_available() {
                println!("Connecting to {}", connection);
            }

            session.start_animation();
            session.run(duration);

            for event in events.try_iter() {
                match event {
                    ConnectionEvent::Connected(connection) => {
                        println!("Connected: {}", connection)
                    }
                    ConnectionEvent::Disconnected(connection) => {
                        println!("Disconnected: {}", connection)
                    }
                }
            }
            println!("{}", session.readout());
        }
    }

    Ok(())
}
