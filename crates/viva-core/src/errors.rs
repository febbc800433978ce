use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Failures that abort a single challenge before any model is called.
///
/// Everything downstream of parsing (compiler unreachable/rejected, judge
/// errors, unparseable verdicts) is absorbed into that challenge's boolean
/// outcome and never surfaces as an error; see `pipeline`.
#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error("malformed challenge: {0}")]
    MalformedChallenge(String),
}

#[derive(Debug)]
pub struct ConfigError(pub String);

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfigError: {}", self.0)
    }
}
impl std::error::Error for ConfigError {}
