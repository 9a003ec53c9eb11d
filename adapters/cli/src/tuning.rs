//! Optional TOML tuning file adjusting the session and its cadences.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;

use invaders_system_pacing::Config as PacingConfig;
use invaders_world::Config as SessionConfig;

/// Root of the tuning file. Every field is optional; omitted values fall
/// back to the engine defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Tuning {
    #[serde(default)]
    pub(crate) session: SessionTuning,
    #[serde(default)]
    pub(crate) cadence: CadenceTuning,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SessionTuning {
    pub(crate) scale: Option<u32>,
    pub(crate) rng_seed: Option<u64>,
}

impl SessionTuning {
    /// Resolves the session configuration, preferring explicit overrides
    /// over file values over engine defaults.
    pub(crate) fn session_config(&self, scale: Option<u32>, seed: Option<u64>) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig::new(
            scale.or(self.scale).unwrap_or(defaults.scale()),
            seed.or(self.rng_seed).unwrap_or(defaults.rng_seed()),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CadenceTuning {
    pub(crate) particles_ms: Option<u64>,
    pub(crate) formation_ms: Option<u64>,
    pub(crate) enemy_fire_ms: Option<u64>,
    pub(crate) bonus_ship_ms: Option<u64>,
    pub(crate) fire_cooldown_ms: Option<u64>,
}

impl CadenceTuning {
    /// Resolves the pacing configuration against the built-in cadences.
    pub(crate) fn pacing_config(&self) -> PacingConfig {
        let defaults = PacingConfig::default();
        PacingConfig::new(
            millis_or(self.particles_ms, defaults.particle_interval()),
            millis_or(self.formation_ms, defaults.formation_interval()),
            millis_or(self.enemy_fire_ms, defaults.enemy_fire_interval()),
            millis_or(self.bonus_ship_ms, defaults.bonus_interval()),
            millis_or(self.fire_cooldown_ms, defaults.fire_cooldown()),
        )
    }
}

fn millis_or(milliseconds: Option<u64>, fallback: Duration) -> Duration {
    milliseconds.map_or(fallback, Duration::from_millis)
}

/// Reads and parses a tuning file.
pub(crate) fn load(path: &Path) -> Result<Tuning> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read tuning file {}", path.display()))?;
    toml::from_str(&contents).context("failed to parse tuning toml contents")
}

#[cfg(test)]
mod tests {
    use super::Tuning;
    use std::time::Duration;

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let tuning: Tuning = toml::from_str(
            r#"
            [cadence]
            formation_ms = 250
            "#,
        )
        .expect("partial tuning parses");

        let pacing = tuning.cadence.pacing_config();
        assert_eq!(pacing.formation_interval(), Duration::from_millis(250));
        assert_eq!(pacing.particle_interval(), Duration::from_millis(10));

        let session = tuning.session.session_config(None, None);
        assert_eq!(session.scale(), 80);
    }

    #[test]
    fn explicit_overrides_beat_file_values() {
        let tuning: Tuning = toml::from_str(
            r#"
            [session]
            scale = 64
            rng_seed = 7
            "#,
        )
        .expect("session tuning parses");

        let session = tuning.session.session_config(Some(100), None);
        assert_eq!(session.scale(), 100);
        assert_eq!(session.rng_seed(), 7);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<Tuning, _> = toml::from_str(
            r#"
            [cadence]
            formation_milliseconds = 250
            "#,
        );
        assert!(result.is_err());
    }
}
