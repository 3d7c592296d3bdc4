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
use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::AudioError;
use crate::sfx::Clip;

/// A time source for mock channels. Times are offsets from an arbitrary origin.
pub trait Clock: fmt::Debug + Send + Sync {
    fn now(&self) -> Duration;
}

/// A clock that follows wall time.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> SystemClock {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> ManualClock {
        ManualClock::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

/// The window during which a mock channel reports itself as playing.
#[derive(Debug, Clone, Copy)]
struct Playback {
    /// When audio would stop. None plays until stopped. A pending start counts as playing.
    ends_at: Option<Duration>,
}

/// A mock channel. Doesn't render anything, but tracks when its clip would be playing.
#[derive(Debug)]
pub struct Channel {
    index: usize,
    clock: Arc<dyn Clock>,
    clip: Option<Clip>,
    pitch: f32,
    looping: bool,
    playback: Option<Playback>,
}

impl Channel {
    fn new(index: usize, clock: Arc<dyn Clock>) -> Channel {
        Channel {
            index,
            clock,
            clip: None,
            pitch: 1.0,
            looping: false,
            playback: None,
        }
    }

    /// Starts playback at the given time. None is a start too far off to represent,
    /// which leaves the channel waiting until stopped.
    fn start_at(&mut self, starts_at: Option<Duration>) {
        let clip = match &self.clip {
            Some(clip) => clip,
            None => {
                warn!(channel = self.index, "Play requested without a clip");
                self.playback = None;
                return;
            }
        };

        let audible = if self.looping {
            None
        } else {
            clip.duration_at_pitch(self.pitch)
        };

        debug!(
            channel = self.index,
            clip = clip.name(),
            pitch = self.pitch,
            starts_at = ?starts_at,
            "Mock channel scheduled"
        );
        self.playback = Some(Playback {
            ends_at: starts_at
                .zip(audible)
                .and_then(|(starts_at, audible)| starts_at.checked_add(audible)),
        });
    }
}

impl super::Channel for Channel {
    fn set_clip(&mut self, clip: Option<Clip>) {
        self.clip = clip;
    }

    fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
    }

    fn pitch(&self) -> f32 {
        self.pitch
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn is_looping(&self) -> bool {
        self.looping
    }

    fn play(&mut self) {
        self.start_at(Some(self.clock.now()));
    }

    fn play_delayed(&mut self, delay: Duration) {
        self.start_at(self.clock.now().checked_add(delay));
    }

    fn stop(&mut self) {
        self.playback = None;
    }

    fn is_playing(&self) -> bool {
        match self.playback {
            Some(Playback {
                ends_at: Some(ends_at),
            }) => self.clock.now() < ends_at,
            Some(Playback { ends_at: None }) => true,
            None => false,
        }
    }
}

/// A mock backend that hands out mock channels.
pub struct Backend {
    name: String,
    clock: Arc<dyn Clock>,
    /// Channels created over the backend's lifetime. Used to number channels.
    created: usize,
    /// Channels currently alive.
    live: usize,
    /// Simulates a device that runs out of channels.
    channel_limit: Option<usize>,
}

impl Backend {
    /// Creates a mock backend whose channels follow the given clock.
    pub fn new(name: &str, clock: Arc<dyn Clock>) -> Backend {
        Backend {
            name: name.to_string(),
            clock,
            created: 0,
            live: 0,
            channel_limit: None,
        }
    }

    /// Fails allocations once this many channels are alive.
    pub fn with_channel_limit(mut self, limit: usize) -> Backend {
        self.channel_limit = Some(limit);
        self
    }

    /// Returns the number of channels currently alive.
    pub fn live_channels(&self) -> usize {
        self.live
    }
}

impl super::Backend for Backend {
    fn create_channel(&mut self) -> Result<Box<dyn super::Channel>, AudioError> {
        if self.channel_limit.is_some_and(|limit| self.live >= limit) {
            return Err(AudioError::Allocation {
                index: self.created,
                reason: format!("{} supports at most {} channels", self.name, self.live),
            });
        }

        let channel = Channel::new(self.created, self.clock.clone());
        self.created += 1;
        self.live += 1;
        Ok(Box::new(channel))
    }

    fn destroy_channel(&mut self, mut channel: Box<dyn super::Channel>) {
        channel.stop();
        self.live = self.live.saturating_sub(1);
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Backend as _, Channel as _};

    fn clip(millis: u64) -> Clip {
        Clip::new("blip", Duration::from_millis(millis))
    }

    fn backend() -> (Arc<ManualClock>, Backend) {
        let clock = Arc::new(ManualClock::new());
        (clock.clone(), Backend::new("mock", clock))
    }

    #[test]
    fn test_plays_for_clip_duration() {
        let (clock, mut backend) = backend();
        let mut channel = backend.create_channel().unwrap();
        channel.set_clip(Some(clip(100)));
        channel.play();
        assert!(channel.is_playing());

        clock.advance(Duration::from_millis(99));
        assert!(channel.is_playing());
        clock.advance(Duration::from_millis(1));
        assert!(!channel.is_playing());
    }

    #[test]
    fn test_delay_counts_as_playing() {
        let (clock, mut backend) = backend();
        let mut channel = backend.create_channel().unwrap();
        channel.set_clip(Some(clip(100)));
        channel.play_delayed(Duration::from_millis(50));
        assert!(channel.is_playing());

        clock.advance(Duration::from_millis(149));
        assert!(channel.is_playing());
        clock.advance(Duration::from_millis(1));
        assert!(!channel.is_playing());
    }

    #[test]
    fn test_pitch_scales_duration() {
        let (clock, mut backend) = backend();
        let mut channel = backend.create_channel().unwrap();
        channel.set_clip(Some(clip(100)));
        channel.set_pitch(2.0);
        channel.play();

        clock.advance(Duration::from_millis(50));
        assert!(!channel.is_playing());

        // Reverse playback lasts as long as forward playback at the same speed.
        channel.set_pitch(-0.5);
        channel.play();
        clock.advance(Duration::from_millis(199));
        assert!(channel.is_playing());
        clock.advance(Duration::from_millis(1));
        assert!(!channel.is_playing());
    }

    #[test]
    fn test_looping_and_stalled_never_finish() {
        let (clock, mut backend) = backend();
        let mut channel = backend.create_channel().unwrap();
        channel.set_clip(Some(clip(10)));
        channel.set_looping(true);
        channel.play();
        clock.advance(Duration::from_secs(10));
        assert!(channel.is_playing());

        channel.set_looping(false);
        channel.set_pitch(0.0);
        channel.play();
        clock.advance(Duration::from_secs(10));
        assert!(channel.is_playing());

        channel.stop();
        assert!(!channel.is_playing());
    }

    #[test]
    fn test_huge_delay_waits_until_stopped() {
        let (clock, mut backend) = backend();
        let mut channel = backend.create_channel().unwrap();
        channel.set_clip(Some(clip(100)));

        clock.advance(Duration::from_secs(1));
        channel.play_delayed(Duration::MAX);
        assert!(channel.is_playing());

        channel.play_delayed(Duration::MAX - Duration::from_secs(1));
        clock.advance(Duration::from_secs(3600));
        assert!(channel.is_playing());

        channel.stop();
        assert!(!channel.is_playing());
    }

    #[test]
    fn test_play_without_clip() {
        let (_, mut backend) = backend();
        let mut channel = backend.create_channel().unwrap();
        channel.play();
        assert!(!channel.is_playing());
    }

    #[test]
    fn test_channel_limit() {
        let clock = Arc::new(ManualClock::new());
        let mut backend = Backend::new("mock", clock).with_channel_limit(1);

        let channel = backend.create_channel().unwrap();
        assert!(matches!(
            backend.create_channel(),
            Err(AudioError::Allocation { index: 1, .. })
        ));

        backend.destroy_channel(channel);
        assert_eq!(backend.live_channels(), 0);
        assert!(backend.create_channel().is_ok());
    }
}
