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

//! The sound player dispatches clips onto the channel pool.

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use super::clip::{Clip, ClipBank};
use super::pool::ChannelPool;
use crate::audio::{AudioError, Backend};

/// Lowest pitch multiplier a channel will be given. Negative values play in reverse.
pub const MIN_PITCH: f32 = -3.0;

/// Highest pitch multiplier a channel will be given.
pub const MAX_PITCH: f32 = 3.0;

/// Counters describing what the player has done with play requests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Clips started on the primary channel.
    pub immediate: u64,
    /// Clips scheduled on pooled channels.
    pub scheduled: u64,
    /// Pooled requests dropped because no channel was free.
    pub dropped: u64,
    /// Channels returned to the free queue by reconcile.
    pub recycled: u64,
}

/// Plays clips through a fixed pool of channels.
///
/// Immediate plays always reuse the primary channel. Delayed plays take the oldest free
/// channel and are silently dropped when there is none; requests are never queued.
pub struct SoundPlayer {
    pool: ChannelPool,
    clips: ClipBank,
    stats: PlaybackStats,
}

impl SoundPlayer {
    /// Creates an inactive player on the given backend.
    pub fn new(backend: Box<dyn Backend>) -> SoundPlayer {
        SoundPlayer {
            pool: ChannelPool::new(backend),
            clips: ClipBank::new(),
            stats: PlaybackStats::default(),
        }
    }

    /// Attaches the clip bank used by the name based play calls.
    pub fn with_clips(mut self, clips: ClipBank) -> SoundPlayer {
        self.clips = clips;
        self
    }

    pub fn clips(&self) -> &ClipBank {
        &self.clips
    }

    pub fn pool(&self) -> &ChannelPool {
        &self.pool
    }

    /// Allocates the channel pool.
    pub fn activate(&mut self, capacity: usize) -> Result<(), AudioError> {
        self.pool.activate(capacity)
    }

    /// Destroys the channel pool, cutting off anything still playing.
    pub fn deactivate(&mut self) {
        self.pool.deactivate();
    }

    /// Recycles finished channels. Must be called once per tick.
    pub fn reconcile(&mut self) -> usize {
        let recycled = self.pool.reconcile();
        self.stats.recycled += recycled as u64;
        recycled
    }

    /// Returns the primary channel's pitch, or 1.0 when there is no primary channel.
    pub fn pitch(&self) -> f32 {
        self.pool.primary().map_or(1.0, |primary| primary.pitch())
    }

    /// Sets the primary channel's pitch, clamped to [`MIN_PITCH`, `MAX_PITCH`].
    pub fn set_pitch(&mut self, pitch: f32) {
        let Some(pitch) = clamp_pitch(pitch) else {
            warn!("Ignoring NaN pitch");
            return;
        };
        if let Some(primary) = self.pool.primary_mut() {
            primary.set_pitch(pitch);
        }
    }

    /// Plays a clip right away on the primary channel at its current pitch.
    /// Returns false when there is no primary channel.
    ///
    /// The primary leaves the free queue until reconcile sees it finish. If a pooled
    /// play already holds it, that play is cut off.
    pub fn play(&mut self, clip: &Clip) -> bool {
        self.pool.claim_primary();
        let Some(primary) = self.pool.primary_mut() else {
            debug!(clip = clip.name(), "No primary channel, ignoring play");
            return false;
        };

        primary.set_clip(Some(clip.clone()));
        primary.set_looping(false);
        primary.play();
        self.stats.immediate += 1;

        debug!(clip = clip.name(), pitch = primary.pitch(), "Clip played");
        true
    }

    /// Schedules a clip on a free channel without touching its pitch.
    /// Returns false when the request was dropped because no channel was free.
    pub fn play_delayed(&mut self, clip: &Clip, delay: Duration) -> bool {
        self.schedule(clip, delay, None)
    }

    /// Schedules a clip on a free channel at the given pitch, clamped like [`Self::set_pitch`].
    /// Returns false when the request was dropped because no channel was free.
    pub fn play_delayed_with_pitch(&mut self, clip: &Clip, delay: Duration, pitch: f32) -> bool {
        let pitch = clamp_pitch(pitch).unwrap_or_else(|| {
            warn!(clip = clip.name(), "Ignoring NaN pitch, playing at 1.0");
            1.0
        });
        self.schedule(clip, delay, Some(pitch))
    }

    /// Plays a clip from the attached clip bank by name.
    pub fn play_named(&mut self, name: &str) -> bool {
        match self.clips.get(name).cloned() {
            Some(clip) => self.play(&clip),
            None => {
                warn!(clip = name, "Clip not found");
                false
            }
        }
    }

    /// Schedules a clip from the attached clip bank by name.
    pub fn play_named_delayed(&mut self, name: &str, delay: Duration) -> bool {
        match self.clips.get(name).cloned() {
            Some(clip) => self.play_delayed(&clip, delay),
            None => {
                warn!(clip = name, "Clip not found");
                false
            }
        }
    }

    /// Schedules a clip from the attached clip bank by name at the given pitch.
    pub fn play_named_delayed_with_pitch(
        &mut self,
        name: &str,
        delay: Duration,
        pitch: f32,
    ) -> bool {
        match self.clips.get(name).cloned() {
            Some(clip) => self.play_delayed_with_pitch(&clip, delay, pitch),
            None => {
                warn!(clip = name, "Clip not found");
                false
            }
        }
    }

    /// Returns true when nothing is playing and every channel is back in the free queue.
    pub fn is_idle(&self) -> bool {
        self.pool.in_use_count() == 0
            && (0..self.pool.capacity())
                .filter_map(|index| self.pool.channel(index))
                .all(|channel| !channel.is_playing())
    }

    pub fn stats(&self) -> PlaybackStats {
        self.stats
    }

    fn schedule(&mut self, clip: &Clip, delay: Duration, pitch: Option<f32>) -> bool {
        let Some(index) = self.pool.acquire_free() else {
            self.stats.dropped += 1;
            debug!(
                clip = clip.name(),
                dropped = self.stats.dropped,
                "No free channel, dropping play"
            );
            return false;
        };

        let Some(channel) = self.pool.channel_mut(index) else {
            return false;
        };
        channel.set_clip(Some(clip.clone()));
        channel.set_looping(false);
        if let Some(pitch) = pitch {
            channel.set_pitch(pitch);
        }
        channel.play_delayed(delay);
        self.stats.scheduled += 1;

        debug!(
            channel = index,
            clip = clip.name(),
            delay = ?delay,
            pitch = channel.pitch(),
            "Clip scheduled"
        );
        true
    }
}

/// Clamps a pitch to the supported range. Returns None for NaN.
pub(super) fn clamp_pitch(pitch: f32) -> Option<f32> {
    if pitch.is_nan() {
        return None;
    }
    Some(pitch.clamp(MIN_PITCH, MAX_PITCH))
}

impl fmt::Debug for SoundPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundPlayer")
            .field("pool", &self.pool)
            .field("clips", &self.clips.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::audio::mock::{self, ManualClock};

    fn player() -> (Arc<ManualClock>, SoundPlayer) {
        let clock = Arc::new(ManualClock::new());
        let backend = mock::Backend::new("mock", clock.clone());
        (clock, SoundPlayer::new(Box::new(backend)))
    }

    fn clip(name: &str, millis: u64) -> Clip {
        Clip::new(name, Duration::from_millis(millis))
    }

    #[test]
    fn test_pitch_clamps() {
        let (_, mut player) = player();
        player.activate(3).unwrap();

        player.set_pitch(10.0);
        assert_eq!(player.pitch(), 3.0);
        player.set_pitch(-10.0);
        assert_eq!(player.pitch(), -3.0);
        player.set_pitch(0.5);
        assert_eq!(player.pitch(), 0.5);

        player.set_pitch(f32::NAN);
        assert_eq!(player.pitch(), 0.5);
    }

    #[test]
    fn test_pitch_without_primary() {
        let (_, mut player) = player();
        assert_eq!(player.pitch(), 1.0);
        player.set_pitch(2.0);
        assert_eq!(player.pitch(), 1.0);

        player.activate(0).unwrap();
        player.set_pitch(2.0);
        assert_eq!(player.pitch(), 1.0);
    }

    #[test]
    fn test_play_uses_primary() {
        let (_, mut player) = player();
        player.activate(3).unwrap();
        player.set_pitch(1.5);

        assert!(player.play(&clip("piano_a3", 500)));

        let primary = player.pool().primary().unwrap();
        assert!(primary.is_playing());
        assert!(!primary.is_looping());
        assert_eq!(primary.pitch(), 1.5);
        assert_eq!(primary.clip().unwrap().name(), "piano_a3");

        // The primary is out of the free queue while it plays.
        assert!(!player.pool().is_free(0));
        assert_eq!(player.pool().free_count(), 2);
        assert_eq!(player.stats().immediate, 1);
    }

    #[test]
    fn test_pooled_play_after_immediate_play() {
        let (clock, mut player) = player();
        player.activate(3).unwrap();

        assert!(player.play(&clip("a", 500)));
        assert!(player.play_delayed(&clip("b", 100), Duration::ZERO));
        assert!(player.play_delayed(&clip("c", 100), Duration::ZERO));
        assert!(!player.play_delayed(&clip("d", 100), Duration::ZERO));

        let pool = player.pool();
        assert_eq!(pool.primary().unwrap().clip().unwrap().name(), "a");
        assert_eq!(pool.channel(1).unwrap().clip().unwrap().name(), "b");
        assert_eq!(pool.channel(2).unwrap().clip().unwrap().name(), "c");

        // Nothing in the free queue is playing.
        clock.advance(Duration::from_millis(200));
        assert_eq!(player.reconcile(), 2);
        for index in 0..3 {
            let pool = player.pool();
            assert!(!(pool.is_free(index) && pool.channel(index).unwrap().is_playing()));
        }
        assert!(!player.pool().is_free(0));

        clock.advance(Duration::from_millis(300));
        assert_eq!(player.reconcile(), 1);
        assert!(player.is_idle());
    }

    #[test]
    fn test_tiny_pitch_never_ends() {
        let (clock, mut player) = player();
        player.activate(3).unwrap();

        player.set_pitch(1e-30);
        assert!(player.play(&clip("a", 800)));
        assert!(player.play_delayed_with_pitch(&clip("b", 800), Duration::ZERO, 1e-30));
        assert!(player.play_delayed_with_pitch(&clip("c", 800), Duration::ZERO, -1e-38));

        clock.advance(Duration::from_secs(3600));
        assert_eq!(player.reconcile(), 0);
        assert_eq!(player.pool().in_use_count(), 3);
    }

    #[test]
    fn test_huge_delay_does_not_overflow() {
        let (clock, mut player) = player();
        player.activate(1).unwrap();

        assert!(player.play_delayed(&clip("a", 100), Duration::MAX));
        clock.advance(Duration::from_secs(3600));
        assert_eq!(player.reconcile(), 0);
        assert!(!player.is_idle());
    }

    #[test]
    fn test_play_without_primary() {
        let (_, mut player) = player();
        assert!(!player.play(&clip("se_1up", 100)));

        player.activate(0).unwrap();
        assert!(!player.play(&clip("se_1up", 100)));
        assert_eq!(player.stats().immediate, 0);
    }

    #[test]
    fn test_play_delayed_keeps_pitch() {
        let (_, mut player) = player();
        player.activate(3).unwrap();

        assert!(player.play_delayed_with_pitch(&clip("code_g", 100), Duration::ZERO, 2.0));
        assert!(player.play_delayed_with_pitch(&clip("code_g", 100), Duration::ZERO, 0.5));
        assert!(player.play_delayed_with_pitch(&clip("code_g", 100), Duration::ZERO, 8.0));
        assert_eq!(player.pool().channel(0).unwrap().pitch(), 2.0);
        assert_eq!(player.pool().channel(1).unwrap().pitch(), 0.5);
        assert_eq!(player.pool().channel(2).unwrap().pitch(), 3.0);

        player.deactivate();
        player.activate(3).unwrap();
        player.set_pitch(0.75);
        assert!(player.play_delayed(&clip("code_ab", 100), Duration::from_millis(10)));
        let channel = player.pool().channel(0).unwrap();
        assert_eq!(channel.pitch(), 0.75);
        assert_eq!(channel.clip().unwrap().name(), "code_ab");
        assert!(!channel.is_looping());
    }

    #[test]
    fn test_excess_plays_are_dropped() {
        let (_, mut player) = player();
        player.activate(2).unwrap();

        assert!(player.play_delayed(&clip("a", 100), Duration::ZERO));
        assert!(player.play_delayed(&clip("b", 100), Duration::ZERO));
        assert!(!player.play_delayed(&clip("c", 100), Duration::ZERO));
        assert!(!player.play_delayed_with_pitch(&clip("d", 100), Duration::ZERO, 1.0));

        // No channel was handed out twice.
        assert_eq!(player.pool().channel(0).unwrap().clip().unwrap().name(), "a");
        assert_eq!(player.pool().channel(1).unwrap().clip().unwrap().name(), "b");
        assert_eq!(player.stats().scheduled, 2);
        assert_eq!(player.stats().dropped, 2);
    }

    #[test]
    fn test_recycling_scenario() {
        let (clock, mut player) = player();
        player.activate(3).unwrap();

        assert!(player.play_delayed_with_pitch(&clip("a", 100), Duration::ZERO, 1.0));
        assert_eq!(player.pool().free_count(), 2);
        assert!(player.play_delayed_with_pitch(&clip("b", 300), Duration::ZERO, 1.0));
        assert_eq!(player.pool().free_count(), 1);
        assert!(player.play_delayed_with_pitch(&clip("c", 300), Duration::ZERO, 1.0));
        assert_eq!(player.pool().free_count(), 0);
        assert!(!player.play_delayed_with_pitch(&clip("d", 300), Duration::ZERO, 1.0));

        // Clip a has finished, but nothing is free until reconcile runs.
        clock.advance(Duration::from_millis(150));
        assert!(!player.play_delayed_with_pitch(&clip("e", 100), Duration::ZERO, 1.0));
        assert_eq!(player.reconcile(), 1);
        assert_eq!(player.pool().free_count(), 1);

        assert!(player.play_delayed_with_pitch(&clip("e", 100), Duration::ZERO, 1.0));
        assert_eq!(player.pool().channel(0).unwrap().clip().unwrap().name(), "e");
        assert_eq!(player.pool().free_count(), 0);

        let stats = player.stats();
        assert_eq!(stats.scheduled, 4);
        assert_eq!(stats.dropped, 2);
        assert_eq!(stats.recycled, 1);
    }

    #[test]
    fn test_delayed_channel_is_in_use_before_it_starts() {
        let (clock, mut player) = player();
        player.activate(1).unwrap();

        assert!(player.play_delayed(&clip("a", 100), Duration::from_millis(500)));
        clock.advance(Duration::from_millis(400));
        assert_eq!(player.reconcile(), 0);
        assert!(!player.is_idle());

        clock.advance(Duration::from_millis(200));
        assert_eq!(player.reconcile(), 1);
        assert!(player.is_idle());
    }

    #[test]
    fn test_deactivate_resets() {
        let (_, mut player) = player();
        player.activate(3).unwrap();
        player.set_pitch(2.0);
        assert!(player.play_delayed(&clip("a", 1000), Duration::ZERO));

        player.deactivate();
        assert_eq!(player.pitch(), 1.0);
        assert!(!player.play_delayed(&clip("a", 1000), Duration::ZERO));
        assert!(!player.play(&clip("a", 1000)));
        assert!(player.is_idle());
    }

    #[test]
    fn test_play_named() {
        let mut bank = ClipBank::new();
        bank.insert("se_1up", Duration::from_millis(200));
        let (_, player) = player();
        let mut player = player.with_clips(bank);
        player.activate(3).unwrap();

        assert!(player.play_named("se_1up"));
        assert!(!player.play_named("missing"));
        assert!(player.play_named_delayed("se_1up", Duration::from_millis(5)));
        assert!(player.play_named_delayed_with_pitch("se_1up", Duration::ZERO, 1.2));
        assert!(!player.play_named_delayed_with_pitch("missing", Duration::ZERO, 1.2));
        assert_eq!(player.pool().free_count(), 0);
    }
}
