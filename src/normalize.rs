//! Utterance normalization
//!
//! Folds free-form speech transcripts into the canonical command space the
//! router matches against: lowercase, no diacritics, no punctuation, single
//! spaces. The same transform is applied to exactly one side (the utterance);
//! binding patterns are authored pre-folded.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Apostrophe and quote variants removed outright rather than spaced,
/// so "doesn't" folds to "doesnt" and not "doesn t"
const QUOTES: [char; 6] = ['\'', '"', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

/// Normalize an utterance for command matching.
///
/// Steps, in order: NFKD decomposition, strip combining marks and quote
/// variants, map every non-alphanumeric non-whitespace character to a space,
/// lowercase, collapse whitespace runs, trim.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)` for all `x`.
#[must_use]
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|&c| !is_combining_mark(c) && !QUOTES.contains(&c))
        .flat_map(|c| {
            let c = if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            };
            c.to_lowercase()
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
