//! Command bindings and routing
//!
//! A binding pairs a pre-compiled pattern with a side-effecting action.
//! Routing normalizes the utterance once, then runs every matching binding in
//! registration order; matching is non-exclusive, so one utterance can
//! trigger several bindings. A failing action is isolated and logged, and
//! never prevents the bindings after it from running.

use regex::Regex;

use crate::Result;
use crate::normalize::normalize;

/// Side-effecting procedure run when a binding's pattern matches
pub type Action = Box<dyn FnMut() -> Result<()> + Send>;

/// A pattern-to-action pair evaluated against normalized utterances.
///
/// Bindings are immutable once registered for a session; the router never
/// mutates or reorders them.
pub struct CommandBinding {
    name: String,
    pattern: Regex,
    action: Action,
}

impl CommandBinding {
    /// Create a binding.
    ///
    /// The pattern is tested against *normalized* text (lowercase,
    /// diacritic-free, punctuation-free), so author it pre-folded:
    /// `"contraste eleve"`, not `"contraste élevé"`.
    pub fn new(
        name: impl Into<String>,
        pattern: Regex,
        action: impl FnMut() -> Result<()> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            pattern,
            action: Box::new(action),
        }
    }

    /// Binding name, used in logs and failure reports
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The compiled matcher
    #[must_use]
    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl std::fmt::Debug for CommandBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBinding")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Ordered collection of command bindings
#[derive(Debug, Default)]
pub struct CommandRouter {
    bindings: Vec<CommandBinding>,
}

impl CommandRouter {
    /// Create an empty router
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Append a binding; evaluation order is registration order
    pub fn register(&mut self, binding: CommandBinding) {
        tracing::debug!(binding = %binding.name, pattern = %binding.pattern, "binding registered");
        self.bindings.push(binding);
    }

    /// Append several bindings, preserving their order
    pub fn register_all(&mut self, bindings: impl IntoIterator<Item = CommandBinding>) {
        for binding in bindings {
            self.register(binding);
        }
    }

    /// Number of registered bindings
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no bindings are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Route an utterance through the bindings.
    ///
    /// Normalizes once, then invokes every binding whose pattern matches, in
    /// registration order. Action failures are logged and do not stop later
    /// bindings. Returns the number of bindings that matched.
    pub fn route(&mut self, raw: &str) -> usize {
        let text = normalize(raw);
        if text.is_empty() {
            return 0;
        }

        let mut matched = 0;
        for binding in &mut self.bindings {
            if !binding.pattern.is_match(&text) {
                continue;
            }
            matched += 1;
            tracing::debug!(binding = %binding.name, utterance = %text, "command matched");
            if let Err(e) = (binding.action)() {
                tracing::warn!(binding = %binding.name, error = %e, "command action failed");
            }
        }

        if matched == 0 {
            tracing::trace!(utterance = %text, "no binding matched");
        }
        matched
    }
}
