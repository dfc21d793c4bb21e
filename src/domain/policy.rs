// ============================================================
// Layer 3 — Run Policies
// ============================================================
// Two small closed choices that the run configuration carries:
//
//   ReviewSelectMode — how a record's review pool is bounded
//                      before it is encoded (full mode only)
//   NonFinitePolicy  — what the trainer does when a batch loss
//                      comes back NaN or infinite
//
// Both parse from kebab-case names so they can be given on the
// command line and stored in params.json.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;

/// Review selection policy applied to each record's review list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewSelectMode {
    /// Keep the first N reviews in record order
    First,
    /// Sample N reviews with a seeded RNG, keep record order
    Random,
    /// Keep the N reviews with the most tokens
    Longest,
}

impl ReviewSelectMode {
    pub fn name(&self) -> &'static str {
        match self {
            ReviewSelectMode::First => "first",
            ReviewSelectMode::Random => "random",
            ReviewSelectMode::Longest => "longest",
        }
    }
}

impl fmt::Display for ReviewSelectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReviewSelectMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(ReviewSelectMode::First),
            "random" => Ok(ReviewSelectMode::Random),
            "longest" => Ok(ReviewSelectMode::Longest),
            other => Err(PipelineError::UnknownPolicy {
                kind: "review selection",
                value: other.to_string(),
            }),
        }
    }
}

/// What to do with a non-finite batch loss.
///
/// `Propagate` keeps the unguarded behaviour: the value flows into
/// the epoch mean, the logged perplexity and the best-loss check
/// (where a NaN never compares as an improvement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NonFinitePolicy {
    #[default]
    Propagate,
    /// Abort the run with `PipelineError::NonFiniteLoss`
    FailFast,
    /// Drop the batch: no optimizer step, not counted in the epoch mean
    SkipBatch,
}

impl NonFinitePolicy {
    pub fn name(&self) -> &'static str {
        match self {
            NonFinitePolicy::Propagate => "propagate",
            NonFinitePolicy::FailFast => "fail-fast",
            NonFinitePolicy::SkipBatch => "skip-batch",
        }
    }
}

impl fmt::Display for NonFinitePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NonFinitePolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "propagate" => Ok(NonFinitePolicy::Propagate),
            "fail-fast" => Ok(NonFinitePolicy::FailFast),
            "skip-batch" => Ok(NonFinitePolicy::SkipBatch),
            other => Err(PipelineError::UnknownPolicy {
                kind: "non-finite loss",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policies() {
        assert_eq!("random".parse::<ReviewSelectMode>().unwrap(), ReviewSelectMode::Random);
        assert_eq!("skip-batch".parse::<NonFinitePolicy>().unwrap(), NonFinitePolicy::SkipBatch);
        assert!("helpful".parse::<ReviewSelectMode>().is_err());
        assert!("ignore".parse::<NonFinitePolicy>().is_err());
    }

    #[test]
    fn test_default_policy_propagates() {
        assert_eq!(NonFinitePolicy::default(), NonFinitePolicy::Propagate);
    }
}
