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

//! Clips and the bank that resolves them by name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config;

/// A preloaded audio resource. Cheap to clone; the pool never owns clip data.
#[derive(Clone, Debug, PartialEq)]
pub struct Clip {
    name: Arc<str>,
    duration: Duration,
}

impl Clip {
    /// Creates a new clip.
    pub fn new(name: &str, duration: Duration) -> Clip {
        Clip {
            name: Arc::from(name),
            duration,
        }
    }

    /// Returns the clip name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the length of the clip at pitch 1.0.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns how long the clip is audible at the given pitch. None if it never ends,
    /// which includes pitches so close to zero that the length can't be represented.
    pub fn duration_at_pitch(&self, pitch: f32) -> Option<Duration> {
        if pitch == 0.0 || pitch.is_nan() {
            return None;
        }
        Duration::try_from_secs_f64(self.duration.as_secs_f64() / f64::from(pitch.abs())).ok()
    }
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.duration)
    }
}

/// Resolves clip names to clips.
#[derive(Default)]
pub struct ClipBank {
    clips: HashMap<String, Clip>,
}

impl ClipBank {
    /// Creates an empty clip bank.
    pub fn new() -> ClipBank {
        ClipBank::default()
    }

    /// Builds a clip bank from the player configuration.
    pub fn from_config(config: &config::Player) -> Result<ClipBank, config::ConfigError> {
        let mut bank = ClipBank::new();
        for (name, duration) in config.clips()? {
            bank.insert(&name, duration);
        }

        info!(clips = bank.len(), "Clip bank loaded");
        Ok(bank)
    }

    /// Adds a clip, replacing any clip with the same name.
    pub fn insert(&mut self, name: &str, duration: Duration) -> Clip {
        let clip = Clip::new(name, duration);
        if self.clips.insert(name.to_string(), clip.clone()).is_some() {
            debug!(clip = name, "Clip replaced");
        }
        clip
    }

    /// Gets a clip by name.
    pub fn get(&self, name: &str) -> Option<&Clip> {
        self.clips.get(name)
    }

    /// Returns the length of the named clip.
    pub fn clip_length(&self, name: &str) -> Option<Duration> {
        self.clips.get(name).map(Clip::duration)
    }

    /// Returns all clip names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clips.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl fmt::Debug for ClipBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipBank")
            .field("clips", &self.names())
            .finish()
    }
}
