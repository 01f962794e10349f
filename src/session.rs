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
use std::collections::BTreeMap;
use std::error::Error;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, span, warn, Level};

use crate::animation::{Joystick, Point, WaypointAnimator};
use crate::config::Setup;
use crate::connection::{
    spawn_discovery, ConnectionDescriptor, ConnectionEvent, ConnectionMonitor, DiscoveryHandle,
    DiscoveryProvider,
};
use crate::dmx::coordinator::CommitOutcome;
use crate::dmx::{RenderCoordinator, Renderer};
use crate::fixture::FixtureLibrary;
use crate::mapping::controls::Readout;
use crate::mapping::{
    ChannelValueMapper, ControlError, PanTiltControl, RangeSelector, Slider, Targets,
};

/// Everything a control surface talks to, driven from a single control thread.
/// Discovery results from worker threads are collected by [Session::poll_discovery]
/// on that same thread.
pub struct Session<R: Rng = StdRng> {
    mapper: ChannelValueMapper,
    targets: Targets,
    joystick: Joystick<R>,
    pan_tilt: PanTiltControl,
    /// Range selectors keyed by channel name.
    selectors: BTreeMap<String, RangeSelector>,
    /// Sliders keyed by channel name, for channels without ranges.
    sliders: BTreeMap<String, Slider>,
    monitor: ConnectionMonitor,
    discovery: Vec<DiscoveryHandle>,
    available: Vec<ConnectionDescriptor>,
    selected: Option<ConnectionDescriptor>,
}

impl Session<StdRng> {
    /// Builds a session from a setup. The universe is patched from the library and
    /// frames go to the given renderer.
    pub fn from_setup(
        setup: &Setup,
        library: &FixtureLibrary,
        renderer: Box<dyn Renderer>,
    ) -> Result<Session<StdRng>, Box<dyn Error>> {
        let universe = setup.build_universe(library)?;
        let coordinator = RenderCoordinator::new(renderer, setup.dmx().min_commit_interval()?);

        let animation = setup.animation();
        let rng = match animation.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let animator = WaypointAnimator::new(
            rng,
            animation.speed(),
            animation.tick_interval()?,
            animation.epsilon(),
        );
        let joystick = Joystick::new(
            animation.area(),
            animation.bounds(),
            animation.min_bounds_size(),
            animator,
        );
        let pan_tilt = PanTiltControl::new(
            animation.pan_channel(),
            animation.tilt_channel(),
            animation.speed_channel(),
        );

        Ok(Session::new(
            ChannelValueMapper::new(universe, coordinator),
            joystick,
            pan_tilt,
        ))
    }
}

impl<R: Rng> Session<R> {
    /// Creates a session controlling every instance in the mapper's universe. A
    /// range selector is created for every patched channel with ranges and a slider
    /// for every other channel.
    pub fn new(
        mapper: ChannelValueMapper,
        joystick: Joystick<R>,
        pan_tilt: PanTiltControl,
    ) -> Session<R> {
        let mut selectors = BTreeMap::new();
        let mut sliders = BTreeMap::new();

        for instance in mapper.universe().instances() {
            for name in instance.mode().channels() {
                if selectors.contains_key(name) || sliders.contains_key(name) {
                    continue;
                }
                let Some(channel) = instance.fixture().channel(name) else {
                    continue;
                };
                match RangeSelector::for_channel(channel) {
                    Ok(selector) => {
                        selectors.insert(name.clone(), selector);
                    }
                    Err(ControlError::NoRanges(_)) => {
                        sliders.insert(name.clone(), Slider::new(name));
                    }
                    Err(e) => debug!(err = e.to_string(), "Channel left without a control."),
                }
            }
        }
        debug!(
            selectors = selectors.len(),
            sliders = sliders.len(),
            "Controls created."
        );

        Session {
            mapper,
            targets: Targets::All,
            joystick,
            pan_tilt,
            selectors,
            sliders,
            monitor: ConnectionMonitor::new(),
            discovery: Vec::new(),
            available: Vec::new(),
            selected: None,
        }
    }

    /// Restricts subsequent actions to the given targets.
    pub fn set_targets(&mut self, targets: Targets) {
        self.targets = targets;
    }

    /// Selects a named range on a channel.
    pub fn select_range(
        &mut self,
        channel: &str,
        label: &str,
    ) -> Result<CommitOutcome, ControlError> {
        let selector = self
            .selectors
            .get(channel)
            .ok_or_else(|| ControlError::UnknownChannel(channel.to_string()))?;
        let outcome = selector.select(&mut self.mapper, &self.targets, label)?;
        self.observe(&outcome);
        Ok(outcome)
    }

    /// Moves a slider to a fraction of its range.
    pub fn set_slider(
        &mut self,
        channel: &str,
        percent: f64,
    ) -> Result<CommitOutcome, ControlError> {
        let slider = self
            .sliders
            .get(channel)
            .ok_or_else(|| ControlError::UnknownChannel(channel.to_string()))?;
        let outcome = slider.set(&mut self.mapper, &self.targets, percent);
        self.observe(&outcome);
        Ok(outcome)
    }

    /// Writes a raw value to a channel.
    pub fn set_value(&mut self, channel: &str, value: i32) -> CommitOutcome {
        let outcome = self.mapper.set_value(&self.targets, channel, value);
        self.observe(&outcome);
        outcome
    }

    /// Presses the joystick.
    pub fn press(&mut self, point: Point) -> Option<CommitOutcome> {
        let position = self.joystick.press(point);
        self.apply_position(position)
    }

    /// Drags the joystick.
    pub fn drag(&mut self, point: Point) -> Option<CommitOutcome> {
        let position = self.joystick.drag(point);
        self.apply_position(position)
    }

    /// Releases the joystick.
    pub fn release(&mut self) {
        self.joystick.release();
    }

    /// Sets the fixtures' pan/tilt movement speed. Zero is fastest.
    pub fn set_movement_speed(&mut self, speed: u8) -> CommitOutcome {
        let outcome = self.pan_tilt.set_speed(&mut self.mapper, &self.targets, speed);
        self.observe(&outcome);
        outcome
    }

    /// Hands the joystick to the waypoint animation. The fixtures are set to their
    /// fastest movement so they keep up with the animation.
    pub fn start_animation(&mut self) -> CommitOutcome {
        self.joystick.start_animation();
        info!("Animation enabled.");
        self.set_movement_speed(0)
    }

    /// Takes the joystick back from the animation.
    pub fn stop_animation(&mut self) {
        self.joystick.stop_animation();
        info!("Animation disabled.");
    }

    /// Runs one animation tick and sends any deferred commit that is due.
    pub fn tick(&mut self) -> Option<CommitOutcome> {
        let position = self.joystick.tick();
        let applied = self.apply_position(position);

        let flushed = self.mapper.flush();
        if let Some(outcome) = &flushed {
            self.observe(outcome);
        }
        applied.or(flushed)
    }

    fn apply_position(&mut self, position: Option<Point>) -> Option<CommitOutcome> {
        position?;
        let normalized = self.joystick.normalized();
        let outcome = self.pan_tilt.apply(&mut self.mapper, &self.targets, normalized);
        self.observe(&outcome);
        Some(outcome)
    }

    /// Starts a discovery run on a worker thread.
    pub fn start_discovery<P: DiscoveryProvider>(&mut self, provider: P) {
        self.discovery.push(spawn_discovery(provider));
    }

    /// Collects finished discovery runs. Returns the number of new endpoints.
    pub fn poll_discovery(&mut self) -> usize {
        let mut found = 0;
        for handle in self.discovery.iter_mut() {
            if let Some(Ok(descriptors)) = handle.try_results() {
                for descriptor in descriptors {
                    if !self.available.contains(&descriptor) {
                        self.available.push(descriptor);
                        found += 1;
                    }
                }
            }
        }
        self.discovery.retain(|handle| !handle.is_done());
        found
    }

    /// Returns true while discovery runs are outstanding.
    pub fn is_discovering(&self) -> bool {
        !self.discovery.is_empty()
    }

    /// Gets the endpoints found so far.
    pub fn available(&self) -> &[ConnectionDescriptor] {
        &self.available
    }

    /// Chooses the endpoint the output is sent to. It is reported connected until a
    /// commit fails.
    pub fn connect(&mut self, descriptor: ConnectionDescriptor) {
        self.monitor.connected(&descriptor);
        self.selected = Some(descriptor);
    }

    /// Connects to the first endpoint found so far, if any.
    pub fn connect_first_available(&mut self) -> Option<ConnectionDescriptor> {
        let descriptor = self.available.first()?.clone();
        self.connect(descriptor.clone());
        Some(descriptor)
    }

    /// Polls discovery on the calling thread until every run has finished or the
    /// timeout passes. Returns the number of new endpoints.
    pub fn wait_for_discovery(&mut self, timeout: Duration) -> usize {
        let start = Instant::now();
        let mut found = self.poll_discovery();
        while self.is_discovering() && start.elapsed() < timeout {
            spin_sleep::sleep(Duration::from_millis(5));
            found += self.poll_discovery();
        }
        if self.is_discovering() {
            warn!(timeout = ?timeout, "Discovery still running.");
        }
        found
    }

    /// Forgets the chosen endpoint.
    pub fn disconnect(&mut self) {
        self.selected = None;
        self.monitor.disconnected();
    }

    /// Subscribes to connectivity changes.
    pub fn subscribe(&mut self) -> crossbeam_channel::Receiver<ConnectionEvent> {
        self.monitor.subscribe()
    }

    /// Returns true while the chosen endpoint is accepting frames.
    pub fn is_connected(&self) -> bool {
        self.monitor.is_connected()
    }

    fn observe(&mut self, outcome: &CommitOutcome) {
        match outcome {
            CommitOutcome::Rendered => {
                if let Some(selected) = &self.selected {
                    self.monitor.connected(selected);
                }
            }
            CommitOutcome::Failed(_) => self.monitor.disconnected(),
            CommitOutcome::Deferred => {}
        }
    }

    /// Runs the control loop on the calling thread for the given duration, polling
    /// discovery and ticking the animation at the animation's tick interval.
    pub fn run(&mut self, duration: Duration) {
        let span = span!(Level::INFO, "session");
        let _enter = span.enter();

        let tick = self.joystick.animator().tick_interval();
        info!(duration = ?duration, tick = ?tick, "Session running.");

        let start = Instant::now();
        let mut next = start;
        let mut ticks: u64 = 0;
        while start.elapsed() < duration {
            self.poll_discovery();
            self.tick();
            ticks += 1;

            next += tick;
            spin_sleep::sleep(next.saturating_duration_since(Instant::now()));
        }

        info!(
            ticks,
            commits = self.mapper.coordinator().commits(),
            failures = self.mapper.coordinator().failures(),
            "Session finished."
        );
    }

    /// Gets the mapper.
    pub fn mapper(&self) -> &ChannelValueMapper {
        &self.mapper
    }

    /// Gets the joystick.
    pub fn joystick(&self) -> &Joystick<R> {
        &self.joystick
    }

    /// Gets the joystick mutably, e.g. to resize the animation bounds.
    pub fn joystick_mut(&mut self) -> &mut Joystick<R> {
        &mut self.joystick
    }

    /// Gets the range selectors keyed by channel.
    pub fn selectors(&self) -> &BTreeMap<String, RangeSelector> {
        &self.selectors
    }

    /// Gets the sliders keyed by channel.
    pub fn sliders(&self) -> &BTreeMap<String, Slider> {
        &self.sliders
    }

    /// Describes the last applied pan/tilt position.
    pub fn readout(&self) -> Readout {
        self.pan_tilt.readout()
    }
}
