//! Shared mock providers for engine integration tests

use std::sync::{Arc, Mutex};

use attune::capture::{CaptureProvider, CaptureSink};
use attune::speech::{SpeechRequest, SynthesisProvider, Voice};
use attune::Result;

/// Scriptable capture provider; tests push events through the stored sink
#[derive(Clone, Default)]
pub struct MockCapture {
    pub inner: Arc<Mutex<MockCaptureInner>>,
}

#[derive(Default)]
pub struct MockCaptureInner {
    pub supported: bool,
    pub sink: Option<CaptureSink>,
    pub started_tags: Vec<String>,
    pub stops: usize,
}

impl MockCapture {
    pub fn supported() -> Self {
        let mock = Self::default();
        mock.inner.lock().unwrap().supported = true;
        mock
    }

    /// Sink handed over by the most recent `start`
    pub fn sink(&self) -> CaptureSink {
        self.inner
            .lock()
            .unwrap()
            .sink
            .clone()
            .expect("capture was never started")
    }

    pub fn started_tags(&self) -> Vec<String> {
        self.inner.lock().unwrap().started_tags.clone()
    }

    pub fn stops(&self) -> usize {
        self.inner.lock().unwrap().stops
    }
}

impl CaptureProvider for MockCapture {
    fn is_supported(&self) -> bool {
        self.inner.lock().unwrap().supported
    }

    fn start(&mut self, lang_tag: &str, sink: CaptureSink) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.started_tags.push(lang_tag.to_string());
        inner.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.inner.lock().unwrap().stops += 1;
        Ok(())
    }
}

/// Recording synthesis provider with a late-populating voice list
#[derive(Clone, Default)]
pub struct MockSynth {
    pub inner: Arc<Mutex<MockSynthInner>>,
}

#[derive(Default)]
pub struct MockSynthInner {
    pub voices: Vec<Voice>,
    pub queue: Vec<SpeechRequest>,
    pub spoken: Vec<SpeechRequest>,
    pub cancels: usize,
    pub listener: Option<Box<dyn FnOnce() + Send>>,
    pub listener_registrations: usize,
}

impl MockSynth {
    pub fn with_voices(voices: Vec<Voice>) -> Self {
        let mock = Self::default();
        mock.inner.lock().unwrap().voices = voices;
        mock
    }

    /// Utterances currently queued (after cancellation)
    pub fn queue(&self) -> Vec<SpeechRequest> {
        self.inner.lock().unwrap().queue.clone()
    }

    /// Every utterance ever handed to the provider
    pub fn spoken(&self) -> Vec<SpeechRequest> {
        self.inner.lock().unwrap().spoken.clone()
    }

    pub fn cancels(&self) -> usize {
        self.inner.lock().unwrap().cancels
    }

    pub fn listener_registrations(&self) -> usize {
        self.inner.lock().unwrap().listener_registrations
    }

    /// Populate the voice list and fire the one-shot listener, if any.
    ///
    /// The listener is taken out before firing so it can never run twice,
    /// and the lock is released so the listener may call back into the
    /// provider.
    pub fn populate_voices(&self, voices: Vec<Voice>) {
        let listener = {
            let mut inner = self.inner.lock().unwrap();
            inner.voices = voices;
            inner.listener.take()
        };
        if let Some(listener) = listener {
            listener();
        }
    }
}

impl SynthesisProvider for MockSynth {
    fn voices(&self) -> Vec<Voice> {
        self.inner.lock().unwrap().voices.clone()
    }

    fn speak(&mut self, request: &SpeechRequest) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.queue.push(request.clone());
        inner.spoken.push(request.clone());
        Ok(())
    }

    fn cancel_all(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        inner.queue.clear();
        inner.cancels += 1;
    }

    fn on_voices_available(&mut self, listener: Box<dyn FnOnce() + Send>) {
        let mut inner = self.inner.lock().unwrap();
        inner.listener = Some(listener);
        inner.listener_registrations += 1;
    }
}
