//! Session wiring
//!
//! Connects the capture adapter, the command router, the interaction state
//! machine, and the speech output controller into one per-session engine:
//! interim text goes to the host's display callback only, final text is
//! logged to the transcript and routed through the bindings, and capture
//! errors surface on the state's error field.

use std::sync::{Arc, Mutex, PoisonError};

use crate::capture::{CaptureEvent, CaptureProvider, SpeechCapture};
use crate::command::{CommandBinding, CommandRouter};
use crate::config::EngineConfig;
use crate::locale::Locale;
use crate::speech::{SpeechOutput, SynthesisProvider};
use crate::state::{Interaction, SensoryMode};
use crate::Result;

type InterimHandler = Box<dyn FnMut(&str) + Send>;

/// One voice interaction session
pub struct Engine {
    state: Interaction,
    capture: SpeechCapture,
    speech: SpeechOutput,
    router: Arc<Mutex<CommandRouter>>,
    interim: Arc<Mutex<Option<InterimHandler>>>,
}

impl Engine {
    /// Build a session over the two platform capabilities
    #[must_use]
    pub fn new(
        config: &EngineConfig,
        capture_provider: Box<dyn CaptureProvider>,
        synthesis_provider: Box<dyn SynthesisProvider>,
    ) -> Self {
        let state = Interaction::new(config);
        let speech = SpeechOutput::new(synthesis_provider, state.clone());
        let capture = SpeechCapture::new(capture_provider);
        let router = Arc::new(Mutex::new(CommandRouter::new()));
        let interim: Arc<Mutex<Option<InterimHandler>>> = Arc::new(Mutex::new(None));

        {
            let state = state.clone();
            let router = Arc::clone(&router);
            let interim = Arc::clone(&interim);
            capture.on_event(move |event| match event {
                CaptureEvent::Interim(text) => {
                    // display only; interim text never enters the state machine
                    let mut handler = interim.lock().unwrap_or_else(PoisonError::into_inner);
                    if let Some(handler) = handler.as_mut() {
                        handler(&text);
                    }
                }
                CaptureEvent::Final(text) => {
                    dispatch(&state, &router, &text);
                }
                CaptureEvent::Error(code) => {
                    state.set_error(code);
                }
            });
        }

        tracing::info!(locale = %state.locale(), "interaction session created");
        Self {
            state,
            capture,
            speech,
            router,
            interim,
        }
    }

    /// Shared handle to the session state
    #[must_use]
    pub fn state(&self) -> Interaction {
        self.state.clone()
    }

    /// Speech output controller for this session
    #[must_use]
    pub fn speech(&self) -> SpeechOutput {
        self.speech.clone()
    }

    /// Register command bindings; evaluation order is registration order
    pub fn register_bindings(&self, bindings: impl IntoIterator<Item = CommandBinding>) {
        self.router
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .register_all(bindings);
    }

    /// Register the host callback for interim (still-revisable) text
    pub fn on_interim(&self, handler: impl FnMut(&str) + Send + 'static) {
        *self.interim.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(handler));
    }

    /// Route a final utterance: append it to the transcript, then run every
    /// matching binding. Returns the number of bindings that matched.
    ///
    /// This is the same path capture final events take, so typed input and
    /// spoken input behave identically.
    pub fn route(&self, utterance: &str) -> usize {
        dispatch(&self.state, &self.router, utterance)
    }

    /// Start listening in the session's current locale.
    ///
    /// # Errors
    ///
    /// Returns error if the platform offers no capture capability or the
    /// session cannot be opened; the error is also surfaced on the state for
    /// the UI.
    pub fn start_listening(&mut self) -> Result<()> {
        let locale = self.state.locale();
        match self.capture.start(locale) {
            Ok(()) => {
                self.state.clear_error();
                Ok(())
            }
            Err(e) => {
                self.state.set_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Stop listening; idempotent
    pub fn stop_listening(&mut self) {
        self.capture.stop();
    }

    /// Whether a capture session is active
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.capture.is_listening()
    }

    /// Whether the platform offers speech capture
    #[must_use]
    pub fn capture_supported(&self) -> bool {
        self.capture.is_supported()
    }

    /// Switch the session locale: speech output re-resolves its voice now;
    /// capture picks the new locale up on the next start.
    pub fn set_locale(&self, locale: Locale) {
        self.state.set_locale(locale);
        self.speech.set_locale(locale);
    }

    /// Speak `text`, replacing any pending announcement
    pub fn speak(&self, text: &str) {
        self.speech.speak(text);
    }

    /// Cancel all spoken output
    pub fn stop_speaking(&self) {
        self.speech.stop();
    }

    /// Announce `text` if voice feedback is enabled (volume above zero)
    pub fn announce(&self, text: &str) {
        if self.state.voice_feedback() {
            self.speech.speak(text);
        }
    }

    /// Advance the guided flow and announce the new step
    pub fn advance_step(&self) -> u8 {
        let step = self.state.next_step();
        self.announce(&format!("Step {step}"));
        step
    }

    /// Retreat the guided flow and announce the new step
    pub fn retreat_step(&self) -> u8 {
        let step = self.state.prev_step();
        self.announce(&format!("Step {step}"));
        step
    }

    /// Apply a sensory preset and announce it
    pub fn apply_mode(&self, mode: SensoryMode) {
        self.state.set_mode(mode);
        self.announce(&format!("{} enabled", mode.label()));
    }
}

/// Final-utterance path shared by capture events and `Engine::route`
fn dispatch(state: &Interaction, router: &Arc<Mutex<CommandRouter>>, utterance: &str) -> usize {
    state.append_transcript(utterance);
    router
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .route(utterance)
}
