use serde::Serialize;

use crate::model::{
    constants::{DEFAULT_GLOBAL_AVERAGE, MINIMUM_VOTES},
    structures::prior_policy::PriorPolicy
};

/// The single source of rating configuration. Built once at startup and
/// shared by the prior estimator, the calculator and the batch updater.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingParameters {
    /// `m` in the weighted formula, and the threshold for prior candidates
    pub minimum_votes: u32,
    /// Prior used when no recipe qualifies as a candidate
    pub default_prior: f64,
    pub prior_policy: PriorPolicy
}

impl RatingParameters {
    pub fn new(minimum_votes: u32, prior_policy: PriorPolicy) -> Self {
        RatingParameters {
            minimum_votes,
            default_prior: DEFAULT_GLOBAL_AVERAGE,
            prior_policy
        }
    }
}

impl Default for RatingParameters {
    fn default() -> Self {
        RatingParameters::new(MINIMUM_VOTES, PriorPolicy::default())
    }
}
