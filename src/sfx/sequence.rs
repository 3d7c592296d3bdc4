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

//! Back-to-back scheduling of clips, timed by their lengths at each step's pitch.

use std::time::Duration;

use tracing::debug;

use super::clip::Clip;
use super::player::{clamp_pitch, SoundPlayer};

/// One scheduled clip in a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub clip: Clip,
    /// Offset from the moment the sequence is dispatched.
    pub delay: Duration,
    pub pitch: f32,
}

/// Clips laid end to end. Each clip starts when the previous one, played at its own
/// pitch, has finished.
#[derive(Debug, Default, Clone)]
pub struct Sequence {
    steps: Vec<Step>,
    cursor: Duration,
}

impl Sequence {
    pub fn new() -> Sequence {
        Sequence::default()
    }

    /// Appends a clip that starts as soon as the previous one ends.
    pub fn then(self, clip: &Clip, pitch: f32) -> Sequence {
        self.then_with_gap(clip, pitch, Duration::ZERO)
    }

    /// Appends a clip that starts `gap` after the previous one ends.
    pub fn then_with_gap(mut self, clip: &Clip, pitch: f32, gap: Duration) -> Sequence {
        let pitch = clamp_pitch(pitch).unwrap_or(1.0);
        self.cursor = self.cursor.saturating_add(gap);
        self.steps.push(Step {
            clip: clip.clone(),
            delay: self.cursor,
            pitch,
        });
        // A stalled clip never ends, so it doesn't push later clips back.
        self.cursor = self
            .cursor
            .saturating_add(clip.duration_at_pitch(pitch).unwrap_or(Duration::ZERO));
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns when the last clip finishes, measured from dispatch.
    pub fn total_duration(&self) -> Duration {
        self.cursor
    }

    /// Schedules every step on the player. Returns how many steps found a free channel.
    pub fn dispatch(&self, player: &mut SoundPlayer) -> usize {
        let accepted = self
            .steps
            .iter()
            .filter(|step| player.play_delayed_with_pitch(&step.clip, step.delay, step.pitch))
            .count();

        debug!(
            steps = self.steps.len(),
            accepted,
            total = ?self.total_duration(),
            "Sequence dispatched"
        );
        accepted
    }
}
