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

//! Drives the reconcile pass at a fixed rate.

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::sfx::SoundPlayer;

/// Shortest interval a ticker will run at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// What a ticker run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Number of reconcile passes.
    pub ticks: u64,
    /// Channels recycled across all passes.
    pub recycled: usize,
    /// True if the player went idle before the timeout.
    pub idle: bool,
}

/// Runs the player's reconcile pass once per interval.
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    interval: Duration,
}

impl Ticker {
    /// Creates a ticker. Intervals shorter than [`MIN_INTERVAL`] are raised to it.
    pub fn new(interval: Duration) -> Ticker {
        if interval < MIN_INTERVAL {
            warn!(
                interval = ?interval,
                minimum = ?MIN_INTERVAL,
                "Tick interval too short, raising it"
            );
        }
        Ticker {
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Reconciles the player every interval until it is idle or `timeout` has passed.
    /// The first pass runs immediately.
    pub async fn run_until_idle(&self, player: &mut SoundPlayer, timeout: Duration) -> TickReport {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // A timeout too long to represent never expires.
        let deadline = Instant::now().checked_add(timeout);
        let mut report = TickReport::default();

        loop {
            interval.tick().await;
            report.ticks += 1;
            report.recycled += player.reconcile();

            if player.is_idle() {
                report.idle = true;
                break;
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                info!(
                    in_use = player.pool().in_use_count(),
                    "Timed out waiting for playback to finish"
                );
                break;
            }
        }

        debug!(
            ticks = report.ticks,
            recycled = report.recycled,
            idle = report.idle,
            "Ticker stopped"
        );
        report
    }
}
