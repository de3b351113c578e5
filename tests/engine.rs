//! End-to-end engine tests against mock platform providers

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use attune::capture::ProviderEvent;
use attune::speech::Voice;
use attune::state::SpeechPatch;
use attune::{
    Engine, EngineConfig, Error, Locale, SensoryMode, UiEffect, reference_bindings,
};

mod common;
use common::{MockCapture, MockSynth};

fn engine_with(capture: &MockCapture, synth: &MockSynth) -> Engine {
    Engine::new(
        &EngineConfig::default(),
        Box::new(capture.clone()),
        Box::new(synth.clone()),
    )
}

fn wired_engine() -> (Engine, MockCapture, MockSynth, mpsc::Receiver<UiEffect>) {
    let capture = MockCapture::supported();
    let synth = MockSynth::default();
    let engine = engine_with(&capture, &synth);
    let (tx, rx) = mpsc::channel();
    engine.register_bindings(reference_bindings(&engine.state(), &engine.speech(), &tx));
    (engine, capture, synth, rx)
}

#[test]
fn unsupported_capture_surfaces_error_state() {
    let capture = MockCapture::default();
    let synth = MockSynth::default();
    let mut engine = engine_with(&capture, &synth);

    assert!(matches!(
        engine.start_listening(),
        Err(Error::CaptureUnsupported)
    ));
    assert!(!engine.is_listening());
    assert!(engine.state().error().is_some());
}

#[test]
fn start_uses_current_locale_capture_tag() {
    let (mut engine, capture, _synth, _rx) = wired_engine();

    engine.start_listening().unwrap();
    engine.stop_listening();
    engine.set_locale(Locale::Fr);
    engine.start_listening().unwrap();

    assert_eq!(capture.started_tags(), vec!["en-GB", "fr-FR"]);
}

#[test]
fn final_utterance_is_logged_and_routed() {
    let (mut engine, capture, _synth, _rx) = wired_engine();
    engine.start_listening().unwrap();

    let sink = capture.sink();
    sink.push(ProviderEvent::Segment("High Contrast".to_string()));
    sink.push(ProviderEvent::Segment("ON".to_string()));
    sink.push(ProviderEvent::UtteranceEnd);

    let state = engine.state();
    assert_eq!(state.transcript(), vec!["high contrast on".to_string()]);
    assert_eq!(state.mode(), SensoryMode::HighContrast);
}

#[test]
fn spoken_language_switch_changes_locale() {
    let (mut engine, capture, _synth, _rx) = wired_engine();
    engine.start_listening().unwrap();

    let sink = capture.sink();
    sink.push(ProviderEvent::Segment("passer au français".to_string()));
    sink.push(ProviderEvent::UtteranceEnd);

    assert_eq!(engine.state().locale(), Locale::Fr);
    // locale change does not implicitly restart the active session
    assert_eq!(capture.started_tags().len(), 1);
}

#[test]
fn interim_text_reaches_display_only() {
    let (mut engine, capture, _synth, _rx) = wired_engine();
    let display = Arc::new(Mutex::new(Vec::new()));
    {
        let display = Arc::clone(&display);
        engine.on_interim(move |text| display.lock().unwrap().push(text.to_string()));
    }
    engine.start_listening().unwrap();

    let sink = capture.sink();
    sink.push(ProviderEvent::Partial("high con".to_string()));
    sink.push(ProviderEvent::Partial("high contrast".to_string()));

    assert_eq!(
        *display.lock().unwrap(),
        vec!["high con".to_string(), "high contrast".to_string()]
    );
    // interim never enters the transcript or the state machine
    assert!(engine.state().transcript().is_empty());
    assert_eq!(engine.state().mode(), SensoryMode::Default);
}

#[test]
fn late_final_event_after_stop_is_inert() {
    let (mut engine, capture, _synth, _rx) = wired_engine();
    engine.start_listening().unwrap();
    let stale = capture.sink();
    engine.stop_listening();

    stale.push(ProviderEvent::Segment("next step".to_string()));
    stale.push(ProviderEvent::UtteranceEnd);

    let state = engine.state();
    assert!(state.transcript().is_empty());
    assert_eq!(state.step(), 1);
}

#[test]
fn capture_runtime_error_surfaces_and_stops_session() {
    let (mut engine, capture, _synth, _rx) = wired_engine();
    engine.start_listening().unwrap();

    capture.sink().push(ProviderEvent::Error("mic-error".to_string()));

    assert!(!engine.is_listening());
    assert_eq!(engine.state().error().as_deref(), Some("mic-error"));

    // the rest of the state machine stays usable
    engine.route("next step");
    assert_eq!(engine.state().step(), 2);
}

#[test]
fn newest_speak_wins() {
    let capture = MockCapture::supported();
    let synth = MockSynth::default();
    let engine = engine_with(&capture, &synth);

    engine.speak("a");
    engine.speak("b");

    let queue = synth.queue();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].text, "b");
}

#[test]
fn speak_applies_clamped_settings_and_voice() {
    let capture = MockCapture::supported();
    let synth = MockSynth::with_voices(vec![Voice::new("v-en-gb", "en-GB")]);
    let engine = engine_with(&capture, &synth);

    engine.state().set_speech(&SpeechPatch {
        rate: Some(99.0),
        ..SpeechPatch::default()
    });
    engine.set_locale(Locale::En);
    engine.speak("hello");

    let queue = synth.queue();
    assert!((queue[0].rate - 10.0).abs() < f32::EPSILON);
    assert_eq!(queue[0].voice_id.as_deref(), Some("v-en-gb"));
}

#[test]
fn stop_speaking_is_idempotent() {
    let capture = MockCapture::supported();
    let synth = MockSynth::default();
    let engine = engine_with(&capture, &synth);

    engine.speak("hello");
    engine.stop_speaking();
    engine.stop_speaking();

    assert!(synth.queue().is_empty());
    assert_eq!(synth.cancels(), 3); // one per speak, one per stop
}

#[test]
fn deferred_voice_resolution_fires_once() {
    let capture = MockCapture::supported();
    let synth = MockSynth::default();
    let engine = engine_with(&capture, &synth);

    engine.set_locale(Locale::Fr);
    assert!(engine.state().speech().voice_id.is_none());
    assert_eq!(synth.listener_registrations(), 1);

    synth.populate_voices(vec![
        Voice::new("v-en", "en-US"),
        Voice::new("v-frfr", "fr-FR"),
    ]);
    assert_eq!(
        engine.state().speech().voice_id.as_deref(),
        Some("v-frfr")
    );

    // a second population must not re-fire the one-shot listener
    synth.populate_voices(vec![Voice::new("v-frca", "fr-CA")]);
    assert_eq!(
        engine.state().speech().voice_id.as_deref(),
        Some("v-frfr")
    );
}

#[test]
fn resolution_miss_keeps_prior_voice() {
    let capture = MockCapture::supported();
    let synth = MockSynth::default();
    let engine = engine_with(&capture, &synth);

    engine.state().set_voice("v-prior".to_string());
    engine.set_locale(Locale::Es);
    // list still empty: deferred, nothing changed yet
    assert_eq!(engine.state().speech().voice_id.as_deref(), Some("v-prior"));

    synth.populate_voices(Vec::new());
    assert_eq!(engine.state().speech().voice_id.as_deref(), Some("v-prior"));
}

#[test]
fn announcements_respect_voice_feedback_toggle() {
    let capture = MockCapture::supported();
    let synth = MockSynth::default();
    let engine = engine_with(&capture, &synth);

    engine.state().set_voice_feedback(false);
    engine.advance_step();
    assert!(synth.spoken().is_empty());

    engine.state().set_voice_feedback(true);
    engine.advance_step();
    let spoken = synth.spoken();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].text, "Step 3");
}

#[test]
fn mode_announcement_uses_preset_label() {
    let capture = MockCapture::supported();
    let synth = MockSynth::default();
    let engine = engine_with(&capture, &synth);

    engine.apply_mode(SensoryMode::LowSensory);
    assert_eq!(synth.spoken()[0].text, "Low sensory enabled");
    assert_eq!(engine.state().mode(), SensoryMode::LowSensory);
}

#[test]
fn typed_route_matches_ui_effect_bindings() {
    let (engine, _capture, _synth, rx) = wired_engine();

    assert_eq!(engine.route("bigger text please"), 1);
    assert!(matches!(rx.try_recv().unwrap(), UiEffect::FontScale(_)));
}

#[test]
fn transcript_capacity_holds_under_spoken_load() {
    let (mut engine, capture, _synth, _rx) = wired_engine();
    engine.start_listening().unwrap();
    let sink = capture.sink();

    for i in 1..=401 {
        sink.push(ProviderEvent::Segment(format!("utterance {i}")));
        sink.push(ProviderEvent::UtteranceEnd);
    }

    let log = engine.state().transcript();
    assert_eq!(log.len(), 400);
    assert_eq!(log[0], "utterance 2");
    assert_eq!(log[399], "utterance 401");
}

#[test]
fn stop_listening_is_idempotent_and_releases_provider() {
    let (mut engine, capture, _synth, _rx) = wired_engine();
    engine.stop_listening();
    engine.start_listening().unwrap();
    engine.stop_listening();
    engine.stop_listening();

    assert!(!engine.is_listening());
    assert!(capture.stops() >= 2);
}
