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
use std::path::Path;

use tracing::info;

mod audio;
mod error;
mod player;

pub use self::audio::{Audio, DEFAULT_DEVICE};
pub use self::error::ConfigError;
pub use self::player::{Player, DEFAULT_TICK_INTERVAL};

/// Prefix for environment variables that override file settings, e.g. SFXPOOL_CHANNELS.
const ENV_PREFIX: &str = "SFXPOOL";

/// Loads the player configuration from a YAML file, with environment overrides applied.
pub fn load_player(path: &Path) -> Result<Player, ConfigError> {
    let player: Player = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?
        .try_deserialize()?;

    info!(
        path = %path.display(),
        channels = player.channels(),
        device = player.audio().device(),
        "Loaded player configuration"
    );
    Ok(player)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_load_player_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sfx.yaml");
        fs::write(
            &path,
            r#"
channels: 4
audio:
  device: mock-sfx
clips:
  code_g: 800ms
"#,
        )
        .unwrap();

        let player = load_player(&path).unwrap();
        assert_eq!(player.channels(), 4);
        assert_eq!(player.audio().device(), "mock-sfx");
        assert_eq!(
            player.clips().unwrap(),
            vec![("code_g".to_string(), Duration::from_millis(800))]
        );
    }

    #[test]
    fn test_load_player_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_player(&dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
