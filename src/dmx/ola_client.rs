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

use ola::DmxBuffer;

/// The transport side of the OLA renderer.
pub trait OlaClient: Send {
    /// Sends a frame to an OLA universe.
    fn send_dmx(&mut self, universe: u32, buffer: &DmxBuffer) -> Result<(), Box<dyn Error>>;
}

/// An OLA client backed by the OLA streaming client.
pub struct RealOlaClient {
    client: ola::StreamingClient<std::net::TcpStream>,
}

impl RealOlaClient {
    /// Connects to the OLA daemon on the given port.
    pub fn connect(port: u16) -> Result<RealOlaClient, Box<dyn Error>> {
        let config = ola::client::StreamingClientConfig {
            server_port: port,
            ..Default::default()
        };
        Ok(RealOlaClient {
            client: ola::connect_with_config(config)?,
        })
    }
}

impl OlaClient for RealOlaClient {
    fn send_dmx(&mut self, universe: u32, buffer: &DmxBuffer) -> Result<(), Box<dyn Error>> {
        self.client.send_dmx(universe, buffer)?;
        Ok(())
    }
}

/// Copies a frame into an OLA buffer.
pub fn to_dmx_buffer(frame: &[u8]) -> DmxBuffer {
    let mut buffer = DmxBuffer::new();
    for (index, value) in frame.iter().enumerate() {
        buffer.set_channel(index, *value);
    }
    buffer
}
