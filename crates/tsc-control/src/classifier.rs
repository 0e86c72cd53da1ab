//! Road segment → approach direction.

use serde::{Deserialize, Serialize};

use tsc_core::Direction;

use crate::{ControlError, ControlResult};

/// Token sets for [`DirectionClassifier`].  Matching is substring-based and
/// case-insensitive; NS tokens are tried first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    pub ns_tokens: Vec<String>,
    pub ew_tokens: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            ns_tokens: vec!["e0".into(), "e1".into()],
            ew_tokens: vec!["e2".into(), "e3".into(), "e4".into()],
        }
    }
}

/// Maps a vehicle's current road segment to the approach it is on.
///
/// Pure and total: every input yields exactly one [`Direction`].
#[derive(Clone, Debug)]
pub struct DirectionClassifier {
    ns_tokens: Vec<String>,
    ew_tokens: Vec<String>,
}

impl DirectionClassifier {
    /// Build from configuration.  Tokens are lower-cased; an empty token, an
    /// empty set, or a token present in both sets is rejected.
    pub fn new(config: &ClassifierConfig) -> ControlResult<Self> {
        let ns_tokens = normalise("ns_tokens", &config.ns_tokens)?;
        let ew_tokens = normalise("ew_tokens", &config.ew_tokens)?;
        if let Some(shared) = ns_tokens.iter().find(|t| ew_tokens.contains(t)) {
            return Err(ControlError::Config(format!(
                "classifier token {shared:?} is listed as both NS and EW"
            )));
        }
        Ok(Self { ns_tokens, ew_tokens })
    }

    pub fn classify(&self, segment: &str) -> Direction {
        let segment = segment.to_lowercase();
        if self.ns_tokens.iter().any(|t| segment.contains(t.as_str())) {
            Direction::Ns
        } else if self.ew_tokens.iter().any(|t| segment.contains(t.as_str())) {
            Direction::Ew
        } else {
            Direction::Unknown
        }
    }
}

impl Default for DirectionClassifier {
    fn default() -> Self {
        let config = ClassifierConfig::default();
        Self { ns_tokens: config.ns_tokens, ew_tokens: config.ew_tokens }
    }
}

fn normalise(what: &str, tokens: &[String]) -> ControlResult<Vec<String>> {
    if tokens.is_empty() {
        return Err(ControlError::Config(format!("classifier {what} must not be empty")));
    }
    tokens
        .iter()
        .map(|t| {
            let t = t.trim().to_lowercase();
            if t.is_empty() {
                Err(ControlError::Config(format!("classifier {what} contains an empty token")))
            } else {
                Ok(t)
            }
        })
        .collect()
}
