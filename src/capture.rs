//! Speech capture adapter
//!
//! Wraps a continuous streaming speech-to-text provider behind a cancellable
//! event stream. The provider pushes raw events into a [`CaptureSink`]; the
//! adapter reconciles interim and final fragments and hands clean
//! [`CaptureEvent`]s to the registered handler. A generation counter makes
//! cancellation race-free: events from a sink issued before the latest
//! `start`/`stop` are inert.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::locale::Locale;
use crate::{Error, Result};

/// Raw event pushed by a capture provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Revisable hypothesis for the current utterance
    Partial(String),
    /// A segment the provider will not revise further
    Segment(String),
    /// The current utterance is complete; accumulated segments are flushed
    UtteranceEnd,
    /// Opaque provider error code (e.g. `"mic-error"`)
    Error(String),
}

/// Event surfaced by the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Latest interim text; replaces, never extends, the previous interim
    Interim(String),
    /// One completed utterance: segments joined, lowercased, trimmed
    Final(String),
    /// Capture failed; the session continues in the stopped state
    Error(String),
}

/// Platform speech-capture capability
pub trait CaptureProvider: Send {
    /// Whether the platform offers speech capture at all
    fn is_supported(&self) -> bool;

    /// Begin continuous listening with interim results for the given BCP 47
    /// tag, pushing raw events into `sink`.
    ///
    /// # Errors
    ///
    /// Returns error if the capture session cannot be opened.
    fn start(&mut self, lang_tag: &str, sink: CaptureSink) -> Result<()>;

    /// Stop the capture session.
    ///
    /// # Errors
    ///
    /// Returns error if the platform refuses; the adapter swallows this.
    fn stop(&mut self) -> Result<()>;
}

type EventHandler = Box<dyn FnMut(CaptureEvent) + Send>;

struct Inner {
    listening: bool,
    interim: String,
    segments: Vec<String>,
}

/// Handle a provider uses to push raw events into the adapter.
///
/// Each sink is stamped with the generation of the `start` call that issued
/// it; once the adapter has been stopped or restarted, pushes through older
/// sinks are silently discarded.
#[derive(Clone)]
pub struct CaptureSink {
    generation: u64,
    current: Arc<AtomicU64>,
    inner: Arc<Mutex<Inner>>,
    handler: Arc<Mutex<Option<EventHandler>>>,
}

impl CaptureSink {
    /// Push a raw provider event into the adapter
    pub fn push(&self, event: ProviderEvent) {
        if self.current.load(Ordering::SeqCst) != self.generation {
            tracing::trace!(generation = self.generation, "stale capture event dropped");
            return;
        }
        let surfaced = {
            let mut inner = lock(&self.inner);
            if !inner.listening {
                return;
            }
            match event {
                ProviderEvent::Partial(text) => {
                    // latest interim wins; previous interim text is discarded
                    inner.interim = text.clone();
                    Some(CaptureEvent::Interim(text))
                }
                ProviderEvent::Segment(text) => {
                    inner.segments.push(text);
                    None
                }
                ProviderEvent::UtteranceEnd => {
                    let joined = inner
                        .segments
                        .join(" ")
                        .to_lowercase()
                        .trim()
                        .to_string();
                    inner.segments.clear();
                    inner.interim.clear();
                    if joined.is_empty() {
                        None
                    } else {
                        Some(CaptureEvent::Final(joined))
                    }
                }
                ProviderEvent::Error(code) => {
                    tracing::warn!(code = %code, "capture provider error");
                    inner.listening = false;
                    Some(CaptureEvent::Error(code))
                }
            }
        };
        if let Some(event) = surfaced {
            self.emit(event);
        }
    }

    /// Run the handler with the adapter's state lock released; a stop that
    /// raced in since the event was accepted makes the event stale.
    fn emit(&self, event: CaptureEvent) {
        if self.current.load(Ordering::SeqCst) != self.generation {
            return;
        }
        let taken = lock(&self.handler).take();
        if let Some(mut handler) = taken {
            handler(event);
            let mut slot = lock(&self.handler);
            if slot.is_none() {
                *slot = Some(handler);
            }
        }
    }
}

/// Adapter over a platform speech-capture provider
pub struct SpeechCapture {
    provider: Box<dyn CaptureProvider>,
    current: Arc<AtomicU64>,
    inner: Arc<Mutex<Inner>>,
    handler: Arc<Mutex<Option<EventHandler>>>,
}

impl SpeechCapture {
    /// Wrap a capture provider
    #[must_use]
    pub fn new(provider: Box<dyn CaptureProvider>) -> Self {
        Self {
            provider,
            current: Arc::new(AtomicU64::new(0)),
            inner: Arc::new(Mutex::new(Inner {
                listening: false,
                interim: String::new(),
                segments: Vec::new(),
            })),
            handler: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether the platform offers speech capture
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.provider.is_supported()
    }

    /// Register the event handler.
    ///
    /// The handler runs with the adapter's state lock released, so it may
    /// call back into the adapter (including pushing through its sink).
    pub fn on_event(&self, handler: impl FnMut(CaptureEvent) + Send + 'static) {
        *lock(&self.handler) = Some(Box::new(handler));
    }

    /// Start continuous listening in the given locale.
    ///
    /// A no-op if already listening. Locale changes while listening take
    /// effect on the next `start`; they never implicitly restart an active
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaptureUnsupported`] if the platform offers no
    /// capture capability, or [`Error::Capture`] if the session cannot be
    /// opened.
    pub fn start(&mut self, locale: Locale) -> Result<()> {
        if !self.provider.is_supported() {
            return Err(Error::CaptureUnsupported);
        }
        {
            let mut inner = lock(&self.inner);
            if inner.listening {
                return Ok(());
            }
            inner.listening = true;
            inner.interim.clear();
            inner.segments.clear();
        }

        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        let sink = CaptureSink {
            generation,
            current: Arc::clone(&self.current),
            inner: Arc::clone(&self.inner),
            handler: Arc::clone(&self.handler),
        };

        if let Err(e) = self.provider.start(locale.capture_tag(), sink) {
            lock(&self.inner).listening = false;
            return Err(e);
        }

        tracing::debug!(locale = %locale, tag = locale.capture_tag(), "speech capture started");
        Ok(())
    }

    /// Stop listening.
    ///
    /// Idempotent: calling while already stopped, or before `start`, produces
    /// no error. All in-flight events from the stopped session become inert.
    /// Provider stop failures are swallowed; a leaked handle is a resource
    /// concern, not a fatal error.
    pub fn stop(&mut self) {
        self.current.fetch_add(1, Ordering::SeqCst);
        {
            let mut inner = lock(&self.inner);
            inner.listening = false;
            inner.interim.clear();
            inner.segments.clear();
        }
        if let Err(e) = self.provider.stop() {
            tracing::debug!(error = %e, "capture provider stop failed");
        } else {
            tracing::debug!("speech capture stopped");
        }
    }

    /// Whether a capture session is active
    #[must_use]
    pub fn is_listening(&self) -> bool {
        lock(&self.inner).listening
    }

    /// Latest interim hypothesis, empty when none is pending
    #[must_use]
    pub fn interim(&self) -> String {
        lock(&self.inner).interim.clone()
    }
}

impl Drop for SpeechCapture {
    fn drop(&mut self) {
        // teardown must release the capture handle even if stop fails
        self.stop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
