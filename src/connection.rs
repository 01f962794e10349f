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
use std::fmt;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use serde::Deserialize;
use tracing::{debug, error, info};

/// Describes an endpoint a renderer could transmit to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConnectionDescriptor {
    /// A USB/serial DMX interface.
    Serial {
        path: String,
        #[serde(default)]
        description: Option<String>,
    },
    /// A network node, e.g. an Art-Net or sACN interface.
    Network {
        name: String,
        address: String,
        #[serde(default)]
        protocol: Option<String>,
    },
}

impl ConnectionDescriptor {
    /// Gets the address used to open the connection.
    pub fn address(&self) -> &str {
        match self {
            ConnectionDescriptor::Serial { path, .. } => path,
            ConnectionDescriptor::Network { address, .. } => address,
        }
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionDescriptor::Serial { path, description } => {
                write!(f, "serial {}", path)?;
                if let Some(description) = description {
                    write!(f, " ({})", description)?;
                }
                Ok(())
            }
            ConnectionDescriptor::Network {
                name,
                address,
                protocol,
            } => {
                write!(f, "network {} @ {}", name, address)?;
                if let Some(protocol) = protocol {
                    write!(f, " [{}]", protocol)?;
                }
                Ok(())
            }
        }
    }
}

/// Errors from a discovery run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    #[error("discovery failed: {0}")]
    Failed(String),

    #[error("discovery worker exited without a result")]
    WorkerExited,
}

/// Finds connection endpoints. Discovery may block, so it is run off the control
/// thread by [spawn_discovery].
pub trait DiscoveryProvider: Send + 'static {
    /// Lists the endpoints currently available.
    fn discover(&self) -> Result<Vec<ConnectionDescriptor>, Box<dyn Error + Send + Sync>>;

    /// A short description of the provider for logging.
    fn describe(&self) -> String;
}

/// Lists a fixed set of endpoints, typically from configuration.
pub struct StaticDiscovery {
    descriptors: Vec<ConnectionDescriptor>,
}

impl StaticDiscovery {
    pub fn new(descriptors: Vec<ConnectionDescriptor>) -> StaticDiscovery {
        StaticDiscovery { descriptors }
    }
}

impl DiscoveryProvider for StaticDiscovery {
    fn discover(&self) -> Result<Vec<ConnectionDescriptor>, Box<dyn Error + Send + Sync>> {
        Ok(self.descriptors.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// A discovery run in progress on a worker thread.
pub struct DiscoveryHandle {
    provider: String,
    receiver: Receiver<Result<Vec<ConnectionDescriptor>, DiscoveryError>>,
    join: Option<JoinHandle<()>>,
}

/// Runs the provider on a worker thread. The result is only ever delivered to the
/// thread that polls the returned handle.
pub fn spawn_discovery<P: DiscoveryProvider>(provider: P) -> DiscoveryHandle {
    let (sender, receiver): (Sender<_>, Receiver<_>) = crossbeam_channel::bounded(1);
    let description = provider.describe();
    debug!(provider = description.as_str(), "Starting discovery.");

    let join = thread::spawn(move || {
        let result = provider
            .discover()
            .map_err(|e| DiscoveryError::Failed(e.to_string()));
        if sender.send(result).is_err() {
            debug!("Discovery handle dropped before the result arrived.");
        }
    });

    DiscoveryHandle {
        provider: description,
        receiver,
        join: Some(join),
    }
}

impl DiscoveryHandle {
    /// Returns the result if the worker has finished, without blocking. The
    /// result is returned once; afterwards this returns None.
    pub fn try_results(&mut self) -> Option<Result<Vec<ConnectionDescriptor>, DiscoveryError>> {
        self.join.as_ref()?;

        let result = match self.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(DiscoveryError::WorkerExited),
        };

        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!(provider = self.provider.as_str(), "Discovery worker panicked");
            }
        }

        match &result {
            Ok(descriptors) => info!(
                provider = self.provider.as_str(),
                found = descriptors.len(),
                "Discovery complete."
            ),
            Err(e) => error!(provider = self.provider.as_str(), err = e.to_string(), "Discovery failed"),
        }
        Some(result)
    }

    /// Returns true once the result has been collected.
    pub fn is_done(&self) -> bool {
        self.join.is_none()
    }
}

/// A change in connectivity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected(ConnectionDescriptor),
    Disconnected(ConnectionDescriptor),
}

/// Tracks whether the output is connected and notifies subscribers when that
/// changes. Repeated reports of the same state publish nothing.
#[derive(Default)]
pub struct ConnectionMonitor {
    current: Option<ConnectionDescriptor>,
    subscribers: Vec<Sender<ConnectionEvent>>,
}

impl ConnectionMonitor {
    pub fn new() -> ConnectionMonitor {
        ConnectionMonitor::default()
    }

    /// Subscribes to connectivity changes.
    pub fn subscribe(&mut self) -> Receiver<ConnectionEvent> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Reports that the output is connected to the endpoint.
    pub fn connected(&mut self, descriptor: &ConnectionDescriptor) {
        if self.current.as_ref() == Some(descriptor) {
            return;
        }
        if let Some(previous) = self.current.take() {
            self.publish(ConnectionEvent::Disconnected(previous));
        }
        info!(connection = descriptor.to_string(), "Connected.");
        self.current = Some(descriptor.clone());
        self.publish(ConnectionEvent::Connected(descriptor.clone()));
    }

    /// Reports that the output lost its connection.
    pub fn disconnected(&mut self) {
        if let Some(previous) = self.current.take() {
            info!(connection = previous.to_string(), "Disconnected.");
            self.publish(ConnectionEvent::Disconnected(previous));
        }
    }

    /// Returns true while connected.
    pub fn is_connected(&self) -> bool {
        self.current.is_some()
    }

    /// Gets the endpoint currently connected to.
    pub fn current(&self) -> Option<&ConnectionDescriptor> {
        self.current.as_ref()
    }

    fn publish(&mut self, event: ConnectionEvent) {
        // Subscribers that have gone away are dropped.
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
