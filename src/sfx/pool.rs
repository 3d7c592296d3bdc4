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

//! A fixed pool of playback channels.
//!
//! Channels are handed out from a FIFO free queue and only come back when a
//! reconcile pass sees that the backend has stopped playing them.

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, info};

use crate::audio::{AudioError, Backend, Channel};

/// Number of channels a pool gets when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 3;

/// Index of the primary channel.
const PRIMARY: usize = 0;

/// Owns a fixed set of channels and tracks which of them are free.
pub struct ChannelPool {
    /// Creates and destroys the channels.
    backend: Box<dyn Backend>,
    /// All channels, in creation order. The first one is the primary channel.
    /// Every channel in `free` is idle; a channel leaves `free` before it is started.
    channels: Vec<Box<dyn Channel>>,
    /// Indices of free channels, oldest first.
    free: VecDeque<usize>,
    /// Per-channel flag mirroring membership in `free`.
    queued: Vec<bool>,
    /// True between activate and deactivate.
    active: bool,
}

impl ChannelPool {
    /// Creates an inactive pool. Nothing is allocated until activation.
    pub fn new(backend: Box<dyn Backend>) -> ChannelPool {
        ChannelPool {
            backend,
            channels: Vec::new(),
            free: VecDeque::new(),
            queued: Vec::new(),
            active: false,
        }
    }

    /// Allocates `capacity` channels, marks them all free and makes the first one primary.
    ///
    /// If the backend fails part way through, the channels allocated so far are kept and
    /// the pool should be deactivated rather than used.
    pub fn activate(&mut self, capacity: usize) -> Result<(), AudioError> {
        if self.active {
            self.deactivate();
        }
        self.active = true;

        for index in 0..capacity {
            let channel = self.backend.create_channel()?;
            self.channels.push(channel);
            self.free.push_back(index);
            self.queued.push(true);
        }

        info!(
            backend = %self.backend,
            capacity,
            "Channel pool activated"
        );
        Ok(())
    }

    /// Stops and destroys every channel. Calling this on an inactive pool does nothing.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }

        let destroyed = self.channels.len();
        for channel in self.channels.drain(..) {
            self.backend.destroy_channel(channel);
        }
        self.free.clear();
        self.queued.clear();
        self.active = false;

        info!(destroyed, "Channel pool deactivated");
    }

    /// Takes the oldest free channel out of the queue. Never blocks.
    pub fn acquire_free(&mut self) -> Option<usize> {
        let index = self.free.pop_front()?;
        self.queued[index] = false;
        Some(index)
    }

    /// Takes the primary channel out of the free queue before it is started directly.
    /// Returns false if the primary was already in use or there is no primary.
    pub fn claim_primary(&mut self) -> bool {
        if !self.is_free(PRIMARY) {
            return false;
        }
        self.free.retain(|&index| index != PRIMARY);
        self.queued[PRIMARY] = false;
        true
    }

    /// Returns every channel that is out of the queue and no longer playing to the free
    /// queue, scanning in creation order. Returns how many channels were recycled.
    ///
    /// This is the only way channels become free again, so it must run every tick.
    pub fn reconcile(&mut self) -> usize {
        let mut recycled = 0;
        for (index, channel) in self.channels.iter().enumerate() {
            if self.queued[index] || channel.is_playing() {
                continue;
            }

            debug!(
                channel = index,
                clip = channel.clip().map(|clip| clip.name()),
                "Channel finished"
            );
            self.free.push_back(index);
            self.queued[index] = true;
            recycled += 1;
        }
        recycled
    }

    /// Returns the primary channel, if the pool has any channels.
    pub fn primary(&self) -> Option<&dyn Channel> {
        self.channel(PRIMARY)
    }

    /// Returns the primary channel mutably, if the pool has any channels.
    pub fn primary_mut(&mut self) -> Option<&mut dyn Channel> {
        self.channel_mut(PRIMARY)
    }

    /// Gets a channel by index.
    pub fn channel(&self, index: usize) -> Option<&dyn Channel> {
        let channel = self.channels.get(index)?;
        Some(channel.as_ref())
    }

    /// Gets a channel mutably by index.
    pub fn channel_mut(&mut self, index: usize) -> Option<&mut dyn Channel> {
        let channel = self.channels.get_mut(index)?;
        Some(channel.as_mut())
    }

    /// Returns true if the channel is sitting in the free queue.
    pub fn is_free(&self, index: usize) -> bool {
        self.queued.get(index).copied().unwrap_or(false)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the number of channels owned by the pool.
    pub fn capacity(&self) -> usize {
        self.channels.len()
    }

    /// Returns the number of channels in the free queue.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Returns the number of channels handed out and not yet recycled.
    pub fn in_use_count(&self) -> usize {
        self.channels.len() - self.free.len()
    }
}

impl Drop for ChannelPool {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl fmt::Debug for ChannelPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelPool")
            .field("backend", &self.backend.to_string())
            .field("capacity", &self.channels.len())
            .field("free", &self.free)
            .field("active", &self.active)
            .finish()
    }
}
