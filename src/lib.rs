//! Attune - Multimodal voice interaction engine for accessible intake flows
//!
//! This library turns a live, incrementally-arriving speech transcript into
//! a deterministic set of state effects while managing sensory-accessibility
//! presets, a bounded transcript log, a step-wise guided flow, and
//! locale-aware speech output.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Platform capabilities                   │
//! │   Speech capture        │       Speech synthesis    │
//! └───────────┬─────────────────────────────▲───────────┘
//!             │ interim / final / error     │ speak / cancel
//! ┌───────────▼─────────────────────────────┴───────────┐
//! │                   Attune engine                      │
//! │  Capture  →  Normalizer  →  Router  →  State  →  TTS │
//! └───────────┬─────────────────────────────────────────┘
//!             │ snapshots, transitions, bindings
//! ┌───────────▼─────────────────────────────────────────┐
//! │            Host application / UI                     │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Interim text is display-only; final text is normalized, logged to the
//! transcript, and routed through the host-supplied command bindings. All
//! shared state mutation goes through [`state::Interaction`].

pub mod bindings;
pub mod capture;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod locale;
pub mod normalize;
pub mod speech;
pub mod state;

pub use bindings::{UiEffect, reference_bindings};
pub use capture::{CaptureEvent, CaptureProvider, CaptureSink, ProviderEvent, SpeechCapture};
pub use command::{CommandBinding, CommandRouter};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use locale::Locale;
pub use normalize::normalize;
pub use speech::{
    SpeechOutput, SpeechRequest, SynthesisProvider, Voice, resolve_voice,
};
pub use state::{
    ContrastMode, EnvironmentTokens, Interaction, Modality, SensoryMode, SpeechPatch,
    SpeechSettings, StateSnapshot,
};
