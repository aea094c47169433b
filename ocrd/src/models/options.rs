use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality/speed tradeoff requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Fast,
    Accurate,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Accurate => write!(f, "accurate"),
        }
    }
}

/// A normalized locale-language tag such as `en`, `en-US` or `zh-Hans`.
///
/// Parsing accepts `_` as a separator and fixes subtag casing: language
/// lowercase, script title case, region uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary language subtag (`zh` for `zh-Hans`).
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl FromStr for LanguageTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Invalid Language: empty tag".to_string());
        }

        let mut subtags = Vec::new();
        for (i, part) in trimmed.split(['-', '_']).enumerate() {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(format!("Invalid Language: {s}"));
            }
            let normalized = if i == 0 {
                part.to_ascii_lowercase()
            } else if part.len() == 4 && part.chars().all(|c| c.is_ascii_alphabetic()) {
                let mut chars = part.chars();
                let first = chars.next().map(|c| c.to_ascii_uppercase());
                first
                    .into_iter()
                    .chain(chars.map(|c| c.to_ascii_lowercase()))
                    .collect()
            } else if (part.len() == 2 && part.chars().all(|c| c.is_ascii_alphabetic()))
                || (part.len() == 3 && part.chars().all(|c| c.is_ascii_digit()))
            {
                part.to_ascii_uppercase()
            } else {
                part.to_ascii_lowercase()
            };
            subtags.push(normalized);
        }

        Ok(Self(subtags.join("-")))
    }
}

impl TryFrom<String> for LanguageTag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguageTag> for String {
    fn from(tag: LanguageTag) -> Self {
        tag.0
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an engine revision. Whether it names a revision the engine
/// actually supports is checked against the engine at request time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request recognition options, taken from the query string.
///
/// Every field is optional and overrides the engine default when present.
/// Lists use repeated keys (`languages=en&languages=de`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecognitionOptions {
    /// Recognition level.
    pub mode: Option<Mode>,
    /// Custom vocabulary.
    #[serde(default, alias = "words[]")]
    pub words: Vec<String>,
    /// Apply language correction.
    pub autocorrect: Option<bool>,
    /// Recognition languages in priority order.
    #[serde(default, alias = "languages[]")]
    #[param(value_type = Vec<String>)]
    pub languages: Vec<LanguageTag>,
    /// Let the engine pick languages itself.
    #[serde(alias = "detectLanguage")]
    pub detect_language: Option<bool>,
    /// Engine revision, one of `GET /revisions`.
    #[param(value_type = Option<String>)]
    pub revision: Option<Revision>,
}
