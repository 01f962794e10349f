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
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ola::DmxBuffer;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use super::ola_client::{to_dmx_buffer, OlaClient, RealOlaClient};
use super::{Universe, UNIVERSE_SIZE};

/// Errors reported by a renderer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("renderer {0} is disconnected")]
    Disconnected(String),

    #[error("unable to transmit frame: {0}")]
    Transmission(String),
}

/// Transmits universe frames. Rendering is fire-and-forget: a renderer may queue
/// the frame and return before it has been transmitted.
pub trait Renderer: Send {
    /// Hands the current state of the universe to the renderer.
    fn render(&self, universe: &Universe) -> Result<(), RenderError>;

    /// A short description of the renderer for logging.
    fn describe(&self) -> String;
}

/// Renders universes to an OLA universe. Frames are handed to a sender thread that
/// owns the OLA connection.
pub struct OlaRenderer {
    /// The OLA universe to send to.
    universe: u32,
    /// Queues frames for the sender thread.
    sender: Option<Sender<DmxBuffer>>,
    /// The sender thread.
    handle: Option<JoinHandle<()>>,
    /// Set by the sender thread when a transmission fails.
    failed: Arc<AtomicBool>,
}

impl OlaRenderer {
    /// Connects to the OLA daemon.
    pub fn connect(universe: u32, port: u16) -> Result<OlaRenderer, Box<dyn Error>> {
        let client = RealOlaClient::connect(port)?;
        info!(universe, port, "Connected to OLA.");
        Ok(OlaRenderer::with_client(universe, Box::new(client)))
    }

    /// Creates a renderer that sends through the given client.
    pub fn with_client(universe: u32, mut client: Box<dyn OlaClient>) -> OlaRenderer {
        let (sender, receiver) = mpsc::channel::<DmxBuffer>();
        let failed = Arc::new(AtomicBool::new(false));

        let handle = {
            let failed = failed.clone();
            thread::spawn(move || {
                // Exits once the renderer drops its sender.
                while let Ok(buffer) = receiver.recv() {
                    match client.send_dmx(universe, &buffer) {
                        Ok(()) => failed.store(false, Ordering::Relaxed),
                        Err(e) => {
                            failed.store(true, Ordering::Relaxed);
                            error!(
                                err = e.to_string(),
                                "Error sending DMX frame to universe {}", universe
                            );
                        }
                    }
                }
            })
        };

        OlaRenderer {
            universe,
            sender: Some(sender),
            handle: Some(handle),
            failed,
        }
    }

    /// Returns true if the most recent transmission failed.
    pub fn last_transmission_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }
}

impl Renderer for OlaRenderer {
    fn render(&self, universe: &Universe) -> Result<(), RenderError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| RenderError::Disconnected(self.describe()))?;
        sender
            .send(to_dmx_buffer(universe.buffer()))
            .map_err(|_| RenderError::Disconnected(self.describe()))
    }

    fn describe(&self) -> String {
        format!("OLA universe {}", self.universe)
    }
}

impl Drop for OlaRenderer {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Error joining OLA sender thread");
            }
        }
    }
}

/// Logs frames instead of transmitting them.
#[derive(Default)]
pub struct LogRenderer {}

impl LogRenderer {
    pub fn new() -> LogRenderer {
        LogRenderer {}
    }
}

impl Renderer for LogRenderer {
    fn render(&self, universe: &Universe) -> Result<(), RenderError> {
        let active: Vec<String> = universe
            .buffer()
            .iter()
            .enumerate()
            .filter(|(_, value)| **value > 0)
            .map(|(index, value)| format!("{}={}", index + 1, value))
            .collect();
        debug!(
            universe = universe.name(),
            active = active.join(" "),
            "Rendered frame."
        );
        Ok(())
    }

    fn describe(&self) -> String {
        "log".to_string()
    }
}

/// Keeps rendered frames in memory. Clones share the same frames.
#[derive(Clone, Default)]
pub struct MemoryRenderer {
    frames: Arc<Mutex<Vec<[u8; UNIVERSE_SIZE]>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryRenderer {
    pub fn new() -> MemoryRenderer {
        MemoryRenderer::default()
    }

    /// Makes subsequent renders fail, to simulate a lost transport.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// The number of frames rendered.
    pub fn count(&self) -> usize {
        self.frames.lock().len()
    }

    /// The most recently rendered frame.
    pub fn last(&self) -> Option<[u8; UNIVERSE_SIZE]> {
        self.frames.lock().last().copied()
    }
}

impl Renderer for MemoryRenderer {
    fn render(&self, universe: &Universe) -> Result<(), RenderError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(RenderError::Transmission("memory renderer set to fail".into()));
        }
        self.frames.lock().push(*universe.buffer());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod test {
    use crate::dmx::ola_client::mock::MockOlaClient;
    use crate::dmx::Universe;
    use crate::fixture::testutil::tcl_spot;
    use crate::fixture::FixtureInstance;
    use crate::test::eventually;

    use super::*;

    fn universe() -> Universe {
        let mut universe = Universe::new("test");
        universe
            .register(FixtureInstance::new(tcl_spot(), "5-channel", 1).expect("instance"))
            .expect("register");
        universe
    }

    #[test]
    fn test_ola_renderer_sends_frames() {
        let client = MockOlaClient::new();
        let renderer = OlaRenderer::with_client(3, Box::new(client.clone()));

        renderer.render(&universe()).expect("render");

        eventually(|| client.count() == 1, "frame was never sent");
        let frame = client.last().unwrap();
        assert_eq!(3, frame.universe);
        assert_eq!([128u8, 128, 0, 0, 255], frame.buffer.as_slice()[0..5]);
        assert!(!renderer.last_transmission_failed());
    }

    #[test]
    fn test_ola_renderer_reports_failed_transmissions() {
        let renderer = OlaRenderer::with_client(1, Box::new(MockOlaClient::failing()));

        // Transmission is fire-and-forget, so the render itself succeeds.
        assert!(renderer.render(&universe()).is_ok());
        eventually(
            || renderer.last_transmission_failed(),
            "failure was never recorded",
        );
    }

    #[test]
    fn test_memory_renderer() {
        let renderer = MemoryRenderer::new();
        let handle = renderer.clone();

        renderer.render(&universe()).expect("render");
        assert_eq!(1, handle.count());
        assert_eq!(Some(255), handle.last().map(|frame| frame[4]));

        handle.set_failing(true);
        assert!(matches!(
            renderer.render(&universe()),
            Err(RenderError::Transmission(_))
        ));
        assert_eq!(1, handle.count());
    }

    #[test]
    fn test_log_renderer() {
        assert!(LogRenderer::new().render(&universe()).is_ok());
    }
}
