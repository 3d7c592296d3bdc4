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

//! The audio backend seam.
//!
//! The pool only needs a handful of operations from a playback channel, so any
//! backend that can create, configure, start, and query channels will do.

use std::{fmt, sync::Arc, time::Duration};

use crate::config;
use crate::sfx::Clip;

pub mod mock;

/// Errors reported by an audio backend.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// The backend could not allocate another playback channel.
    #[error("unable to allocate playback channel {index}: {reason}")]
    Allocation { index: usize, reason: String },

    /// No backend is known for the configured device name.
    #[error("unknown audio device '{0}'")]
    UnknownDevice(String),
}

/// A single playback slot capable of rendering one clip at a time.
pub trait Channel: fmt::Debug + Send {
    /// Assigns the clip that the next play call will render. `None` unassigns.
    fn set_clip(&mut self, clip: Option<Clip>);

    /// Returns the currently assigned clip.
    fn clip(&self) -> Option<&Clip>;

    /// Sets the pitch multiplier. 1.0 plays the clip unmodified.
    fn set_pitch(&mut self, pitch: f32);

    /// Returns the pitch multiplier.
    fn pitch(&self) -> f32;

    /// Enables or disables looping.
    fn set_looping(&mut self, looping: bool);

    /// Returns true if the channel loops its clip.
    fn is_looping(&self) -> bool;

    /// Starts the assigned clip immediately.
    fn play(&mut self);

    /// Starts the assigned clip once the delay has elapsed.
    fn play_delayed(&mut self, delay: Duration);

    /// Stops playback, including playback that has not started yet.
    fn stop(&mut self);

    /// Returns true while the channel is playing or waiting to start.
    fn is_playing(&self) -> bool;
}

/// Creates and destroys playback channels.
pub trait Backend: fmt::Display + Send {
    /// Allocates a new idle channel.
    fn create_channel(&mut self) -> Result<Box<dyn Channel>, AudioError>;

    /// Releases a channel. Anything still playing on it is stopped first.
    fn destroy_channel(&mut self, mut channel: Box<dyn Channel>) {
        channel.stop();
    }
}

/// Gets the backend for the given audio configuration.
pub fn get_backend(config: &config::Audio) -> Result<Box<dyn Backend>, AudioError> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Box::new(mock::Backend::new(
            device,
            Arc::new(mock::SystemClock::new()),
        )));
    }

    Err(AudioError::UnknownDevice(device.to_string()))
}
