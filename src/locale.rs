//! Supported locales and their capture/synthesis tags

use serde::{Deserialize, Serialize};

use crate::Error;

/// A locale the engine can listen and speak in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English
    #[default]
    En,
    /// French
    Fr,
    /// Spanish
    Es,
}

impl Locale {
    /// All supported locales
    pub const ALL: [Self; 3] = [Self::En, Self::Fr, Self::Es];

    /// Short language code (`en`, `fr`, `es`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::Es => "es",
        }
    }

    /// BCP 47 tag handed to the capture engine
    #[must_use]
    pub const fn capture_tag(self) -> &'static str {
        match self {
            Self::En => "en-GB",
            Self::Fr => "fr-FR",
            Self::Es => "es-ES",
        }
    }

    /// Ordered synthesis voice preferences, most specific region first.
    ///
    /// Tags are lowercase; matching is a case-insensitive prefix test against
    /// the platform voice's language tag. The bare language code comes last
    /// as a catch-all.
    #[must_use]
    pub const fn voice_preferences(self) -> &'static [&'static str] {
        match self {
            Self::En => &["en-gb", "en-us", "en-au", "en"],
            Self::Fr => &["fr-fr", "fr-ca", "fr"],
            Self::Es => &["es-es", "es-mx", "es-ar", "es"],
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "fr" | "french" => Ok(Self::Fr),
            "es" | "spanish" => Ok(Self::Es),
            other => Err(Error::Parse(format!("unknown locale: {other}"))),
        }
    }
}
