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

//! Pooled sound-effect playback.
//!
//! This module provides:
//! - A clip bank that resolves clip names and reports clip durations
//! - A fixed pool of playback channels recycled on every tick
//! - The player, which dispatches clips onto the pool with optional delay and pitch
//! - Sequences of clips scheduled back to back

mod clip;
mod player;
mod pool;
mod sequence;

pub use clip::{Clip, ClipBank};
pub use player::{PlaybackStats, SoundPlayer, MAX_PITCH, MIN_PITCH};
pub use pool::{ChannelPool, DEFAULT_CAPACITY};
pub use sequence::{Sequence, Step};
