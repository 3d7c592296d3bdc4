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

//! Equal-tempered pitch ratios for transposing clips.

use std::{error::Error, fmt, str::FromStr};

/// Pitch multiplier for one semitone up, 2^(1/12).
pub const SEMITONE_UP: f32 = 1.059_463_1;

/// Pitch multiplier for one semitone down, 1 / 2^(1/12).
pub const SEMITONE_DOWN: f32 = 0.943_874_3;

/// Returns the pitch multiplier that transposes by the given number of semitones.
pub fn semitone_ratio(semitones: i32) -> f32 {
    2f32.powf(semitones as f32 / 12.0)
}

/// Transposition steps applied to the current pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchStep {
    DownTwo,
    Down,
    Reset,
    Up,
    UpTwo,
}

impl PitchStep {
    /// Returns the pitch after taking this step from `pitch`.
    pub fn apply(self, pitch: f32) -> f32 {
        match self {
            PitchStep::DownTwo => pitch * SEMITONE_DOWN * SEMITONE_DOWN,
            PitchStep::Down => pitch * SEMITONE_DOWN,
            PitchStep::Reset => 1.0,
            PitchStep::Up => pitch * SEMITONE_UP,
            PitchStep::UpTwo => pitch * SEMITONE_UP * SEMITONE_UP,
        }
    }
}

/// A scale, described by its semitone offsets from the root within one octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Chromatic,
    Major,
    NaturalMinor,
    MajorPentatonic,
    MinorPentatonic,
    Hijaz,
}

impl Scale {
    /// Every scale, in display order.
    pub const ALL: [Scale; 6] = [
        Scale::Chromatic,
        Scale::Major,
        Scale::NaturalMinor,
        Scale::MajorPentatonic,
        Scale::MinorPentatonic,
        Scale::Hijaz,
    ];

    /// Semitone offsets from the root, ascending, starting at 0.
    pub fn intervals(self) -> &'static [i32] {
        match self {
            Scale::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::MajorPentatonic => &[0, 2, 4, 7, 9],
            Scale::MinorPentatonic => &[0, 3, 5, 7, 10],
            Scale::Hijaz => &[0, 1, 4, 5, 7, 8, 10],
        }
    }

    /// Pitch multipliers for each degree of the scale, relative to the root.
    pub fn ratios(self) -> Vec<f32> {
        self.intervals()
            .iter()
            .map(|&semitones| semitone_ratio(semitones))
            .collect()
    }

    /// Pitch multiplier for a degree, wrapping into higher or lower octaves.
    pub fn degree_ratio(self, degree: i32) -> f32 {
        let intervals = self.intervals();
        let len = intervals.len() as i32;
        let octave = degree.div_euclid(len);
        let index = degree.rem_euclid(len) as usize;
        semitone_ratio(octave * 12 + intervals[index])
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scale::Chromatic => "chromatic",
            Scale::Major => "major",
            Scale::NaturalMinor => "minor",
            Scale::MajorPentatonic => "major-pentatonic",
            Scale::MinorPentatonic => "minor-pentatonic",
            Scale::Hijaz => "hijaz",
        };
        f.write_str(name)
    }
}

impl FromStr for Scale {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scale::ALL
            .into_iter()
            .find(|scale| scale.to_string() == s.to_lowercase())
            .ok_or_else(|| format!("unknown scale '{}'", s).into())
    }
}
