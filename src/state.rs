//! Interaction state machine
//!
//! Owns the shared per-session state: input modality, sensory-mode preset,
//! guided-flow step, transcript log, speech-output settings, locale, and the
//! UI-facing error field. All mutation goes through the operations on
//! [`Interaction`]; other components read or request transitions, never write
//! fields directly.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::locale::Locale;

/// Primary input channel the user is currently using
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Microphone-driven input
    Voice,
    /// Touch or assistive-switch input
    #[default]
    Touch,
    /// Keyboard or text input
    Keyboard,
}

impl std::str::FromStr for Modality {
    type Err = crate::Error;

    /// Resolves the UI aliases at the parse boundary: `"text"` maps to
    /// keyboard and `"assistive"` to touch. Only the three canonical values
    /// are ever stored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "voice" => Ok(Self::Voice),
            "touch" | "assistive" => Ok(Self::Touch),
            "keyboard" | "text" => Ok(Self::Keyboard),
            other => Err(crate::Error::Parse(format!("unknown modality: {other}"))),
        }
    }
}

/// Named accessibility preset bundling motion, complexity, sound, and contrast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensoryMode {
    /// Full motion and detail
    #[default]
    Default,
    /// No motion, no sound, simplified layout
    LowSensory,
    /// Reduced motion and sound, simplified layout
    Focus,
    /// Full motion and detail with high-contrast colors
    HighContrast,
}

impl SensoryMode {
    /// Human-readable preset label, used for spoken feedback
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::LowSensory => "Low sensory",
            Self::Focus => "Focus",
            Self::HighContrast => "High contrast",
        }
    }

    /// Derive the environment tokens for this preset.
    ///
    /// Tokens are always this pure function of the mode; they are cached on
    /// `set_mode` and never independently mutated.
    #[must_use]
    pub const fn tokens(self) -> EnvironmentTokens {
        match self {
            Self::Default => EnvironmentTokens {
                motion_scale: 1.0,
                complexity_level: 2,
                sound_scale: 1.0,
                contrast: ContrastMode::Normal,
            },
            Self::LowSensory => EnvironmentTokens {
                motion_scale: 0.0,
                complexity_level: 1,
                sound_scale: 0.0,
                contrast: ContrastMode::Normal,
            },
            Self::Focus => EnvironmentTokens {
                motion_scale: 0.3,
                complexity_level: 1,
                sound_scale: 0.3,
                contrast: ContrastMode::Normal,
            },
            Self::HighContrast => EnvironmentTokens {
                motion_scale: 1.0,
                complexity_level: 2,
                sound_scale: 1.0,
                contrast: ContrastMode::High,
            },
        }
    }
}

/// Contrast rendering mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContrastMode {
    /// Standard palette
    #[default]
    Normal,
    /// High-contrast palette
    High,
}

/// Settings vector derived from the sensory mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentTokens {
    /// Animation intensity, 0 (none) to 1 (full)
    pub motion_scale: f32,
    /// Layout detail: 1 (simple) or 2 (detailed)
    pub complexity_level: u8,
    /// Ambient sound intensity, 0 to 1
    pub sound_scale: f32,
    /// Contrast palette
    pub contrast: ContrastMode,
}

/// Speech synthesis rate bounds
pub const RATE_RANGE: (f32, f32) = (0.1, 10.0);
/// Speech synthesis pitch bounds
pub const PITCH_RANGE: (f32, f32) = (0.0, 2.0);
/// Speech synthesis volume bounds
pub const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);

/// Current speech synthesis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// Speaking rate, clamped to [0.1, 10]
    pub rate: f32,
    /// Voice pitch, clamped to [0, 2]
    pub pitch: f32,
    /// Output volume, clamped to [0, 1]
    pub volume: f32,
    /// Resolved synthesis voice identifier, if any
    pub voice_id: Option<String>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice_id: None,
        }
    }
}

/// Partial update to [`SpeechSettings`]; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeechPatch {
    /// New speaking rate
    pub rate: Option<f32>,
    /// New voice pitch
    pub pitch: Option<f32>,
    /// New output volume
    pub volume: Option<f32>,
    /// New voice identifier
    pub voice_id: Option<String>,
}

/// Read-only snapshot of the interaction state for the UI
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    /// Active input modality
    pub modality: Modality,
    /// Active sensory preset
    pub mode: SensoryMode,
    /// Environment tokens derived from the preset
    pub tokens: EnvironmentTokens,
    /// Current guided-flow step
    pub step: u8,
    /// Active locale
    pub locale: Locale,
    /// Speech synthesis settings
    pub speech: SpeechSettings,
    /// Transcript log, oldest first
    pub transcript: Vec<String>,
    /// Last surfaced error, if any
    pub error: Option<String>,
}

/// Mutable state behind the shared handle
#[derive(Debug)]
struct State {
    modality: Modality,
    mode: SensoryMode,
    tokens: EnvironmentTokens,
    step: u8,
    locale: Locale,
    speech: SpeechSettings,
    transcript: VecDeque<String>,
    error: Option<String>,
    /// Last non-zero volume, restored when voice feedback is re-enabled
    restore_volume: f32,
    transcript_capacity: usize,
    step_min: u8,
    step_max: u8,
}

/// Shared handle to the per-session interaction state.
///
/// Cloning is cheap; all clones observe the same state. Every operation is
/// synchronous and safe to call from any event handler: writes are serialized
/// behind an interior lock, so `set_mode` and its token recomputation are
/// observed atomically.
#[derive(Debug, Clone)]
pub struct Interaction {
    inner: Arc<Mutex<State>>,
}

impl Interaction {
    /// Create session state with the configured defaults
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let mode = SensoryMode::default();
        Self {
            inner: Arc::new(Mutex::new(State {
                modality: Modality::default(),
                mode,
                tokens: mode.tokens(),
                step: config.step_min,
                locale: config.locale,
                speech: config.speech_defaults(),
                transcript: VecDeque::with_capacity(config.transcript_capacity.min(64)),
                error: None,
                restore_volume: 1.0,
                transcript_capacity: config.transcript_capacity,
                step_min: config.step_min,
                step_max: config.step_max,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the active input modality.
    ///
    /// Callers hand in one of the three canonical values; alias resolution
    /// ("text", "assistive") happens at the parse boundary, never here.
    pub fn set_modality(&self, modality: Modality) {
        let mut state = self.lock();
        if state.modality != modality {
            tracing::debug!(?modality, "modality changed");
            state.modality = modality;
        }
    }

    /// Current input modality
    #[must_use]
    pub fn modality(&self) -> Modality {
        self.lock().modality
    }

    /// Set the sensory preset and recompute its environment tokens.
    ///
    /// Both fields are updated under one lock acquisition, so no reader can
    /// observe the new mode with stale tokens.
    pub fn set_mode(&self, mode: SensoryMode) {
        let mut state = self.lock();
        state.mode = mode;
        state.tokens = mode.tokens();
        tracing::debug!(?mode, tokens = ?state.tokens, "sensory mode changed");
    }

    /// Current sensory preset
    #[must_use]
    pub fn mode(&self) -> SensoryMode {
        self.lock().mode
    }

    /// Environment tokens for the current preset
    #[must_use]
    pub fn tokens(&self) -> EnvironmentTokens {
        self.lock().tokens
    }

    /// Advance the guided flow one step, clamped at the upper bound.
    ///
    /// Returns the step after the transition.
    pub fn next_step(&self) -> u8 {
        let mut state = self.lock();
        state.step = state.step.saturating_add(1).min(state.step_max);
        state.step
    }

    /// Retreat the guided flow one step, clamped at the lower bound.
    ///
    /// Returns the step after the transition.
    pub fn prev_step(&self) -> u8 {
        let mut state = self.lock();
        state.step = state.step.saturating_sub(1).max(state.step_min);
        state.step
    }

    /// Jump to a specific step, clamped to the configured bounds
    pub fn set_step(&self, step: u8) -> u8 {
        let mut state = self.lock();
        state.step = step.clamp(state.step_min, state.step_max);
        state.step
    }

    /// Current guided-flow step
    #[must_use]
    pub fn step(&self) -> u8 {
        self.lock().step
    }

    /// Append a final utterance to the transcript log.
    ///
    /// Empty text is ignored. The log is capacity-bounded FIFO: once full,
    /// the oldest entries are evicted, never the newest.
    pub fn append_transcript(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut state = self.lock();
        while state.transcript.len() >= state.transcript_capacity {
            state.transcript.pop_front();
        }
        state.transcript.push_back(text.to_string());
    }

    /// Clear the transcript log
    pub fn clear_transcript(&self) {
        self.lock().transcript.clear();
    }

    /// Transcript entries, oldest first
    #[must_use]
    pub fn transcript(&self) -> Vec<String> {
        self.lock().transcript.iter().cloned().collect()
    }

    /// Number of transcript entries
    #[must_use]
    pub fn transcript_len(&self) -> usize {
        self.lock().transcript.len()
    }

    /// Merge a partial update into the speech settings.
    ///
    /// Every numeric field is clamped to its range regardless of what the
    /// caller supplied; out-of-range values are silently clamped, not
    /// rejected. Returns the settings after the merge.
    pub fn set_speech(&self, patch: &SpeechPatch) -> SpeechSettings {
        let mut state = self.lock();
        if let Some(rate) = patch.rate {
            state.speech.rate = rate.clamp(RATE_RANGE.0, RATE_RANGE.1);
        }
        if let Some(pitch) = patch.pitch {
            state.speech.pitch = pitch.clamp(PITCH_RANGE.0, PITCH_RANGE.1);
        }
        if let Some(volume) = patch.volume {
            state.speech.volume = volume.clamp(VOLUME_RANGE.0, VOLUME_RANGE.1);
        }
        if let Some(voice_id) = &patch.voice_id {
            state.speech.voice_id = Some(voice_id.clone());
        }
        tracing::debug!(speech = ?state.speech, "speech settings updated");
        state.speech.clone()
    }

    /// Store the resolved synthesis voice identifier
    pub fn set_voice(&self, voice_id: String) {
        let mut state = self.lock();
        tracing::debug!(voice_id = %voice_id, "synthesis voice selected");
        state.speech.voice_id = Some(voice_id);
    }

    /// Current speech settings
    #[must_use]
    pub fn speech(&self) -> SpeechSettings {
        self.lock().speech.clone()
    }

    /// Enable or disable spoken feedback.
    ///
    /// Disabling remembers the current volume and mutes; enabling restores
    /// the remembered volume (or full volume if none was remembered).
    pub fn set_voice_feedback(&self, enabled: bool) {
        let mut state = self.lock();
        if enabled {
            state.speech.volume = if state.restore_volume > 0.0 {
                state.restore_volume
            } else {
                1.0
            };
        } else {
            if state.speech.volume > 0.0 {
                state.restore_volume = state.speech.volume;
            }
            state.speech.volume = 0.0;
        }
    }

    /// Whether spoken feedback is currently audible
    #[must_use]
    pub fn voice_feedback(&self) -> bool {
        self.lock().speech.volume > 0.0
    }

    /// Set the active locale; capture picks it up on the next start
    pub fn set_locale(&self, locale: Locale) {
        let mut state = self.lock();
        if state.locale != locale {
            tracing::debug!(%locale, "locale changed");
            state.locale = locale;
        }
    }

    /// Current locale
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.lock().locale
    }

    /// Surface an error for the UI to render
    pub fn set_error(&self, code: impl Into<String>) {
        self.lock().error = Some(code.into());
    }

    /// Clear the surfaced error
    pub fn clear_error(&self) {
        self.lock().error = None;
    }

    /// Last surfaced error, if any
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Consistent point-in-time snapshot for the UI
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        let state = self.lock();
        StateSnapshot {
            modality: state.modality,
            mode: state.mode,
            tokens: state.tokens,
            step: state.step,
            locale: state.locale,
            speech: state.speech.clone(),
            transcript: state.transcript.iter().cloned().collect(),
            error: state.error.clone(),
        }
    }
}
