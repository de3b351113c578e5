//! Engine configuration
//!
//! Session defaults are configurable through `ATTUNE_*` environment
//! variables; everything has a sensible default so `EngineConfig::default()`
//! is a complete configuration.

use crate::locale::Locale;
use crate::state::{PITCH_RANGE, RATE_RANGE, SpeechSettings, VOLUME_RANGE};
use crate::{Error, Result};

/// Default transcript log capacity
pub const DEFAULT_TRANSCRIPT_CAPACITY: usize = 400;

/// Default guided-flow bounds
pub const DEFAULT_STEP_MIN: u8 = 1;
/// Default last step of the guided flow
pub const DEFAULT_STEP_MAX: u8 = 6;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Initial locale for capture and synthesis
    pub locale: Locale,

    /// Transcript log capacity (FIFO eviction beyond this)
    pub transcript_capacity: usize,

    /// First step of the guided flow
    pub step_min: u8,

    /// Last step of the guided flow
    pub step_max: u8,

    /// Initial speaking rate
    pub speech_rate: f32,

    /// Initial voice pitch
    pub speech_pitch: f32,

    /// Initial output volume
    pub speech_volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            transcript_capacity: DEFAULT_TRANSCRIPT_CAPACITY,
            step_min: DEFAULT_STEP_MIN,
            step_max: DEFAULT_STEP_MAX,
            speech_rate: 1.0,
            speech_pitch: 1.0,
            speech_volume: 1.0,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `ATTUNE_LOCALE`, `ATTUNE_TRANSCRIPT_CAPACITY`,
    /// `ATTUNE_STEP_MIN`, `ATTUNE_STEP_MAX`, `ATTUNE_SPEECH_RATE`,
    /// `ATTUNE_SPEECH_PITCH`, and `ATTUNE_SPEECH_VOLUME`; unset variables
    /// keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but unparseable, or the resulting
    /// configuration is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from a variable lookup; tests inject maps here
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            locale: match lookup("ATTUNE_LOCALE") {
                Some(locale) => locale.parse()?,
                None => defaults.locale,
            },
            transcript_capacity: parse_var(
                "ATTUNE_TRANSCRIPT_CAPACITY",
                lookup("ATTUNE_TRANSCRIPT_CAPACITY"),
                defaults.transcript_capacity,
            )?,
            step_min: parse_var("ATTUNE_STEP_MIN", lookup("ATTUNE_STEP_MIN"), defaults.step_min)?,
            step_max: parse_var("ATTUNE_STEP_MAX", lookup("ATTUNE_STEP_MAX"), defaults.step_max)?,
            speech_rate: parse_var(
                "ATTUNE_SPEECH_RATE",
                lookup("ATTUNE_SPEECH_RATE"),
                defaults.speech_rate,
            )?,
            speech_pitch: parse_var(
                "ATTUNE_SPEECH_PITCH",
                lookup("ATTUNE_SPEECH_PITCH"),
                defaults.speech_pitch,
            )?,
            speech_volume: parse_var(
                "ATTUNE_SPEECH_VOLUME",
                lookup("ATTUNE_SPEECH_VOLUME"),
                defaults.speech_volume,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate invariants that the rest of the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns error if the transcript capacity is zero or the step bounds
    /// are inverted.
    pub fn validate(&self) -> Result<()> {
        if self.transcript_capacity == 0 {
            return Err(Error::Config(
                "transcript capacity must be at least 1".to_string(),
            ));
        }
        if self.step_min < 1 || self.step_min > self.step_max {
            return Err(Error::Config(format!(
                "invalid step bounds: [{}, {}]",
                self.step_min, self.step_max
            )));
        }
        Ok(())
    }

    /// Initial speech settings, clamped to the valid ranges
    #[must_use]
    pub fn speech_defaults(&self) -> SpeechSettings {
        SpeechSettings {
            rate: self.speech_rate.clamp(RATE_RANGE.0, RATE_RANGE.1),
            pitch: self.speech_pitch.clamp(PITCH_RANGE.0, PITCH_RANGE.1),
            volume: self.speech_volume.clamp(VOLUME_RANGE.0, VOLUME_RANGE.1),
            voice_id: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(value) => value
            .parse()
            .map_err(|_| Error::Config(format!("invalid {name}: {value}"))),
        None => Ok(default),
    }
}
