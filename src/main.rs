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
use std::error::Error;
use std::path::Path;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use duration_string::DurationString;
use tracing_subscriber::EnvFilter;

use sfxpool::pitch::{semitone_ratio, Scale};
use sfxpool::sfx::{Clip, ClipBank, Sequence, SoundPlayer, MAX_PITCH, MIN_PITCH};
use sfxpool::ticker::{TickReport, Ticker};
use sfxpool::{audio, config};

/// Extra time given to playback on top of the expected length before giving up.
const SETTLE_TIME: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A pooled sound effect player."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the clips defined in the given player config.
    Clips {
        /// The path to the player config.
        config_path: String,
    },
    /// Plays a single clip and waits for it to finish.
    Play {
        /// The path to the player config.
        config_path: String,
        /// The name of the clip to play.
        clip_name: String,
        /// Schedules the clip on a pooled channel after this delay, e.g. 250ms.
        #[arg[short, long]]
        delay: Option<String>,
        /// The pitch multiplier. Clamped to [-3, 3].
        #[arg[short, long, allow_hyphen_values = true]]
        pitch: Option<f32>,
    },
    /// Plays clips back to back, each transposed further than the last.
    Sequence {
        /// The path to the player config.
        config_path: String,
        /// The names of the clips to play, in order.
        #[arg(required = true)]
        clip_names: Vec<String>,
        /// Semitones added to each successive clip.
        #[arg[short, long, default_value_t = 0, allow_hyphen_values = true]]
        semitones: i32,
    },
    /// Prints the pitch multipliers for one octave of a scale.
    Scale {
        /// The scale: chromatic, major, minor, major-pentatonic, minor-pentatonic or hijaz.
        scale: String,
        /// The pitch multiplier of the root note.
        #[arg[short, long, default_value_t = 1.0]]
        root: f32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Clips { config_path } => {
            let player_config = config::load_player(Path::new(&config_path))?;
            let clips = ClipBank::from_config(&player_config)?;

            if clips.is_empty() {
                println!("No clips found in {}.", config_path);
                return Ok(());
            }

            println!("Clips (count: {}):", clips.len());
            for name in clips.names() {
                if let Some(clip) = clips.get(name) {
                    println!("- {}", clip);
                }
            }
        }
        Commands::Play {
            config_path,
            clip_name,
            delay,
            pitch,
        } => {
            let (mut player, ticker) = init_player(&config_path)?;
            let clip = lookup_clip(&player, &clip_name)?;

            let (accepted, delay) = match delay {
                Some(delay) => {
                    let delay: Duration = DurationString::from_string(delay)?.into();
                    let accepted = match pitch {
                        Some(pitch) => {
                            player.play_named_delayed_with_pitch(&clip_name, delay, pitch)
                        }
                        None => player.play_named_delayed(&clip_name, delay),
                    };
                    (accepted, delay)
                }
                None => {
                    if let Some(pitch) = pitch {
                        player.set_pitch(pitch);
                    }
                    (player.play_named(&clip_name), Duration::ZERO)
                }
            };
            if !accepted {
                return Err(format!("no channel available for clip '{}'", clip_name).into());
            }

            let effective_pitch = match pitch {
                Some(pitch) if !pitch.is_nan() => pitch.clamp(MIN_PITCH, MAX_PITCH),
                _ => 1.0,
            };
            let expected = clip
                .duration_at_pitch(effective_pitch)
                .unwrap_or(Duration::ZERO);
            let report = ticker
                .run_until_idle(
                    &mut player,
                    delay.saturating_add(expected).saturating_add(SETTLE_TIME),
                )
                .await;
            print_report(&player, report);
        }
        Commands::Sequence {
            config_path,
            clip_names,
            semitones,
        } => {
            let (mut player, ticker) = init_player(&config_path)?;

            let mut sequence = Sequence::new();
            for (step, name) in clip_names.iter().enumerate() {
                let clip = lookup_clip(&player, name)?;
                let transpose = semitones.saturating_mul(step as i32);
                sequence = sequence.then(&clip, semitone_ratio(transpose));
            }

            for step in sequence.steps() {
                println!(
                    "- {} at {:?} (pitch {:.4})",
                    step.clip.name(),
                    step.delay,
                    step.pitch
                );
            }

            let accepted = sequence.dispatch(&mut player);
            println!("Scheduled {} of {} clips.", accepted, sequence.steps().len());

            let report = ticker
                .run_until_idle(
                    &mut player,
                    sequence.total_duration().saturating_add(SETTLE_TIME),
                )
                .await;
            print_report(&player, report);
        }
        Commands::Scale { scale, root } => {
            let scale: Scale = scale.parse()?;

            println!("Scale {} (root {}):", scale, root);
            for (degree, (semitones, ratio)) in scale
                .intervals()
                .iter()
                .zip(scale.ratios())
                .enumerate()
            {
                println!("- {}: +{} semitones, pitch {:.4}", degree, semitones, root * ratio);
            }
        }
    }

    Ok(())
}

/// Loads the config at the given path and returns an activated player and its ticker.
fn init_player(config_path: &str) -> Result<(SoundPlayer, Ticker), Box<dyn Error>> {
    let player_config = config::load_player(Path::new(config_path))?;
    let clips = ClipBank::from_config(&player_config)?;
    let tick_interval = player_config.tick_interval()?;

    let backend = audio::get_backend(player_config.audio())?;
    let mut player = SoundPlayer::new(backend).with_clips(clips);
    player.activate(player_config.channels())?;

    Ok((player, Ticker::new(tick_interval)))
}

fn lookup_clip(player: &SoundPlayer, name: &str) -> Result<Clip, Box<dyn Error>> {
    player
        .clips()
        .get(name)
        .cloned()
        .ok_or_else(|| format!("unknown clip '{}'", name).into())
}

fn print_report(player: &SoundPlayer, report: TickReport) {
    let stats = player.stats();
    if report.idle {
        println!("Playback finished after {} ticks.", report.ticks);
    } else {
        println!("Gave up waiting after {} ticks.", report.ticks);
    }
    println!(
        "Played {}, scheduled {}, dropped {}, recycled {}.",
        stats.immediate, stats.scheduled, stats.dropped, stats.recycled
    );
}
