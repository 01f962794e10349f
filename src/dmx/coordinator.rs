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

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::renderer::{RenderError, Renderer};
use super::Universe;

/// What happened to a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The universe was handed to the renderer.
    Rendered,
    /// The commit arrived within the minimum interval and will go out on the next flush.
    Deferred,
    /// The renderer reported a failure. Channel state is unaffected.
    Failed(RenderError),
}

/// Hands the universe to the renderer once per logical action, no matter how many
/// channel writes the action made.
pub struct RenderCoordinator {
    /// The renderer that transmits frames.
    renderer: Box<dyn Renderer>,
    /// Commits closer together than this are coalesced. Zero disables coalescing.
    min_interval: Duration,
    /// When the renderer was last invoked.
    last_dispatch: Option<Instant>,
    /// True if a deferred commit is waiting for a flush.
    pending: bool,
    /// The number of commits requested.
    commits: u64,
    /// The number of renders that failed.
    failures: u64,
}

impl RenderCoordinator {
    /// Creates a new render coordinator.
    pub fn new(renderer: Box<dyn Renderer>, min_interval: Duration) -> RenderCoordinator {
        RenderCoordinator {
            renderer,
            min_interval,
            last_dispatch: None,
            pending: false,
            commits: 0,
            failures: 0,
        }
    }

    /// Commits the current state of the universe.
    pub fn commit(&mut self, universe: &Universe) -> CommitOutcome {
        self.commits += 1;

        if let Some(last_dispatch) = self.last_dispatch {
            if !self.min_interval.is_zero() && last_dispatch.elapsed() < self.min_interval {
                self.pending = true;
                return CommitOutcome::Deferred;
            }
        }

        self.dispatch(universe)
    }

    /// Dispatches a deferred commit once the minimum interval has passed. Returns
    /// None if there was nothing to send or it is still too early.
    pub fn flush(&mut self, universe: &Universe) -> Option<CommitOutcome> {
        if !self.pending {
            return None;
        }
        if let Some(last_dispatch) = self.last_dispatch {
            if last_dispatch.elapsed() < self.min_interval {
                return None;
            }
        }
        Some(self.dispatch(universe))
    }

    fn dispatch(&mut self, universe: &Universe) -> CommitOutcome {
        self.pending = false;
        self.last_dispatch = Some(Instant::now());

        match self.renderer.render(universe) {
            Ok(()) => {
                debug!(
                    universe = universe.name(),
                    renderer = self.renderer.describe(),
                    "Committed universe."
                );
                CommitOutcome::Rendered
            }
            Err(e) => {
                self.failures += 1;
                warn!(
                    err = e.to_string(),
                    renderer = self.renderer.describe(),
                    "Unable to render universe."
                );
                CommitOutcome::Failed(e)
            }
        }
    }

    /// The number of commits requested so far.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// The number of renders that failed so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Returns true if a deferred commit is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Describes the renderer.
    pub fn renderer(&self) -> String {
        self.renderer.describe()
    }
}
