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
use std::collections::HashMap;
use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;

use super::audio::Audio;
use super::error::ConfigError;
use crate::sfx::DEFAULT_CAPACITY;

/// How often the pool is reconciled when nothing else is configured.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// The configuration for the sound player.
#[derive(Deserialize, Clone, Debug)]
pub struct Player {
    /// Number of playback channels in the pool.
    channels: Option<usize>,

    /// How often finished channels are recycled, e.g. "10ms".
    tick_interval: Option<String>,

    /// The audio backend configuration.
    #[serde(default)]
    audio: Audio,

    /// Clip names mapped to their lengths, e.g. "800ms".
    #[serde(default)]
    clips: HashMap<String, String>,
}

impl Player {
    /// Returns the pool capacity (default: 3).
    pub fn channels(&self) -> usize {
        self.channels.unwrap_or(DEFAULT_CAPACITY)
    }

    /// Returns the reconcile interval (default: 10ms). Must be non-zero.
    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        let interval = match &self.tick_interval {
            Some(interval) => parse_duration("tick_interval", interval)?,
            None => DEFAULT_TICK_INTERVAL,
        };
        if interval.is_zero() {
            return Err(ConfigError::Invalid(
                "tick_interval must be greater than zero".to_string(),
            ));
        }
        Ok(interval)
    }

    /// Returns the audio configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Returns every clip with its parsed length, sorted by name.
    pub fn clips(&self) -> Result<Vec<(String, Duration)>, ConfigError> {
        let mut clips = self
            .clips
            .iter()
            .map(|(name, length)| {
                parse_duration(&format!("clip '{}'", name), length)
                    .map(|duration| (name.clone(), duration))
            })
            .collect::<Result<Vec<(String, Duration)>, ConfigError>>()?;
        clips.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(clips)
    }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    DurationString::from_string(value.to_string())
        .map(Duration::from)
        .map_err(|e| ConfigError::Duration {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}
