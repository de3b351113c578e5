//! Speech output controller
//!
//! Queues text-to-speech against the session's speech settings with
//! cancel-then-speak semantics: at most one utterance is ever pending, and
//! the newest call always wins, so stale announcements never read out after
//! the UI has moved on. Also resolves the best available synthetic voice per
//! locale, with a one-shot deferred retry for platforms whose voice list
//! populates asynchronously.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::locale::Locale;
use crate::state::Interaction;
use crate::{Error, Result};

/// A synthetic voice offered by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Stable voice identifier
    pub id: String,
    /// BCP 47 language tag (e.g. `fr-CA`)
    pub lang: String,
}

impl Voice {
    /// Convenience constructor
    #[must_use]
    pub fn new(id: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lang: lang.into(),
        }
    }
}

/// A single synthesis request
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    /// Text to speak
    pub text: String,
    /// Speaking rate
    pub rate: f32,
    /// Voice pitch
    pub pitch: f32,
    /// Output volume
    pub volume: f32,
    /// Resolved voice, or `None` for the platform default
    pub voice_id: Option<String>,
}

/// Platform speech-synthesis capability
pub trait SynthesisProvider: Send {
    /// Currently available voices; may be empty until the platform has
    /// populated its list
    fn voices(&self) -> Vec<Voice>;

    /// Queue one utterance.
    ///
    /// # Errors
    ///
    /// Returns error if the platform rejects the request.
    fn speak(&mut self, request: &SpeechRequest) -> Result<()>;

    /// Cancel all pending and active output
    fn cancel_all(&mut self);

    /// Register a one-shot listener fired when the voice list becomes
    /// available. The provider drops the listener after firing it once.
    fn on_voices_available(&mut self, listener: Box<dyn FnOnce() + Send>);
}

/// Pick the best voice for a locale from the platform's list.
///
/// Scans the locale's region-tag preferences in order and returns the first
/// voice whose tag starts with the preference (case-insensitive); falls back
/// to the first available voice of any locale; returns `None` only when no
/// voices exist at all.
#[must_use]
pub fn resolve_voice(voices: &[Voice], locale: Locale) -> Option<&Voice> {
    for pref in locale.voice_preferences() {
        if let Some(voice) = voices
            .iter()
            .find(|v| v.lang.to_lowercase().starts_with(pref))
        {
            return Some(voice);
        }
    }
    voices.first()
}

/// Controller over a platform synthesis provider.
///
/// Cloning is cheap; all clones share the same provider and session state.
#[derive(Clone)]
pub struct SpeechOutput {
    provider: Arc<Mutex<Box<dyn SynthesisProvider>>>,
    state: Interaction,
}

impl SpeechOutput {
    /// Wrap a synthesis provider for the given session
    #[must_use]
    pub fn new(provider: Box<dyn SynthesisProvider>, state: Interaction) -> Self {
        Self {
            provider: Arc::new(Mutex::new(provider)),
            state,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn SynthesisProvider>> {
        self.provider.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel anything in progress, then queue `text` with the current
    /// speech settings and the resolved voice (platform default if none).
    ///
    /// Synthesis failures are logged, never propagated: losing one
    /// announcement must not disturb the rest of the session.
    pub fn speak(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let speech = self.state.speech();
        let request = SpeechRequest {
            text: text.to_string(),
            rate: speech.rate,
            pitch: speech.pitch,
            volume: speech.volume,
            voice_id: speech.voice_id,
        };

        let mut provider = self.lock();
        // cancel-then-speak: never more than one pending utterance
        provider.cancel_all();
        if let Err(e) = provider.speak(&request) {
            tracing::warn!(error = %e, "speech synthesis failed");
        } else {
            tracing::trace!(text = %request.text, rate = request.rate, "utterance queued");
        }
    }

    /// Cancel all pending and active output; idempotent
    pub fn stop(&self) {
        self.lock().cancel_all();
    }

    /// Request voice resolution for a locale.
    ///
    /// This is a request, not a guarantee: on a miss the prior voice
    /// selection is left unchanged. If the platform voice list is still
    /// empty, a one-shot retry is registered on the provider's
    /// voices-available notification; it fires at most once.
    pub fn set_locale(&self, locale: Locale) {
        let mut provider = self.lock();
        let voices = provider.voices();
        if voices.is_empty() {
            tracing::debug!(%locale, "voice list empty, deferring resolution");
            let retry_provider = Arc::clone(&self.provider);
            let state = self.state.clone();
            provider.on_voices_available(Box::new(move || {
                let provider = retry_provider
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                apply_resolution(&provider.voices(), locale, &state);
            }));
            return;
        }
        drop(provider);
        apply_resolution(&voices, locale, &self.state);
    }
}

fn apply_resolution(voices: &[Voice], locale: Locale, state: &Interaction) {
    match resolve_voice(voices, locale) {
        Some(voice) => {
            tracing::debug!(%locale, voice = %voice.id, lang = %voice.lang, "voice resolved");
            state.set_voice(voice.id.clone());
        }
        None => {
            // non-fatal: output falls back to the platform default voice
            tracing::debug!(error = %Error::VoiceResolution(locale.to_string()), "resolution miss");
        }
    }
}
