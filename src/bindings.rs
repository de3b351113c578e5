//! Reference command binding set
//!
//! The trilingual binding set shipped with the intake deployment: language
//! switching, contrast toggles, text size, scrolling, step navigation, and
//! the start phrase. The set itself is host configuration, not core logic;
//! hosts are free to register their own bindings instead.
//!
//! Patterns are authored pre-folded (lowercase, diacritic-free) because the
//! router matches against normalized utterances: `contraste eleve`, never
//! `contraste élevé`.

use std::sync::mpsc::Sender;

use regex::Regex;

use crate::command::CommandBinding;
use crate::locale::Locale;
use crate::speech::SpeechOutput;
use crate::state::{Interaction, SensoryMode};

/// UI-side effect a binding requests from the host.
///
/// Scrolling and font scale belong to the presentation layer; the bindings
/// emit them over a channel for the host to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEffect {
    /// Scroll the view up
    ScrollUp,
    /// Scroll the view down
    ScrollDown,
    /// Set the font scale factor (1.0 base, 1.25 large)
    FontScale(f32),
}

/// Font scale applied by the "bigger text" command
pub const FONT_SCALE_LARGE: f32 = 1.25;
/// Font scale applied by the "smaller text" command
pub const FONT_SCALE_BASE: f32 = 1.0;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("valid regex")
}

/// Build the reference binding set for a session.
///
/// Bindings are returned in evaluation order. `effects` receives UI-side
/// requests; a dropped receiver disables those bindings without failing the
/// others.
#[must_use]
pub fn reference_bindings(
    state: &Interaction,
    speech: &SpeechOutput,
    effects: &Sender<UiEffect>,
) -> Vec<CommandBinding> {
    let mut bindings = Vec::new();

    // language switching
    for (name, re, locale) in [
        ("lang-en", r"\benglish\b", Locale::En),
        ("lang-fr", r"\b(french|francais)\b", Locale::Fr),
        ("lang-es", r"\b(spanish|espanol)\b", Locale::Es),
    ] {
        let state = state.clone();
        let speech = speech.clone();
        bindings.push(CommandBinding::new(name, pattern(re), move || {
            state.set_locale(locale);
            speech.set_locale(locale);
            Ok(())
        }));
    }

    // contrast
    {
        let state = state.clone();
        bindings.push(CommandBinding::new(
            "contrast-on",
            pattern("high contrast on|contraste eleve active|alto contraste activar"),
            move || {
                state.set_mode(SensoryMode::HighContrast);
                Ok(())
            },
        ));
    }
    {
        let state = state.clone();
        bindings.push(CommandBinding::new(
            "contrast-off",
            pattern("high contrast off|contraste eleve desactive|alto contraste desactivar"),
            move || {
                state.set_mode(SensoryMode::Default);
                Ok(())
            },
        ));
    }

    // text size
    for (name, re, scale) in [
        (
            "text-bigger",
            "bigger text|texte plus grand|texto mas grande",
            FONT_SCALE_LARGE,
        ),
        (
            "text-smaller",
            "smaller text|texte plus petit|texto mas pequeno",
            FONT_SCALE_BASE,
        ),
    ] {
        let effects = effects.clone();
        bindings.push(CommandBinding::new(name, pattern(re), move || {
            let _ = effects.send(UiEffect::FontScale(scale));
            Ok(())
        }));
    }

    // scrolling
    for (name, re, effect) in [
        ("scroll-down", r"scroll down|\bdescendre\b|\bbajar\b", UiEffect::ScrollDown),
        ("scroll-up", r"scroll up|\bmonter\b|\bsubir\b", UiEffect::ScrollUp),
    ] {
        let effects = effects.clone();
        bindings.push(CommandBinding::new(name, pattern(re), move || {
            let _ = effects.send(effect);
            Ok(())
        }));
    }

    // step navigation
    {
        let state = state.clone();
        let speech = speech.clone();
        bindings.push(CommandBinding::new(
            "step-next",
            pattern("next step|etape suivante|siguiente paso"),
            move || {
                let step = state.next_step();
                announce(&state, &speech, &format!("Step {step}"));
                Ok(())
            },
        ));
    }
    {
        let state = state.clone();
        let speech = speech.clone();
        bindings.push(CommandBinding::new(
            "step-back",
            pattern("previous step|go back|etape precedente|paso anterior"),
            move || {
                let step = state.prev_step();
                announce(&state, &speech, &format!("Step {step}"));
                Ok(())
            },
        ));
    }

    // start phrase: jump to the first step of the guided flow
    {
        let state = state.clone();
        let speech = speech.clone();
        bindings.push(CommandBinding::new(
            "start",
            pattern(r"\bstart\b|\bcommencer\b|\biniciar\b"),
            move || {
                let step = state.set_step(1);
                announce(&state, &speech, &format!("Step {step}"));
                Ok(())
            },
        ));
    }

    bindings
}

fn announce(state: &Interaction, speech: &SpeechOutput, text: &str) {
    if state.voice_feedback() {
        speech.speak(text);
    }
}
