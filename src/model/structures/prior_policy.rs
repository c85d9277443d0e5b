use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// How the corpus-wide prior is derived from recipe accumulators
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PriorPolicy {
    /// Mean of per-recipe averages, restricted to recipes with at least
    /// the minimum number of votes
    #[default]
    ThresholdMean,
    /// Total of all vote sums divided by total of all vote counts
    PooledTotals
}
