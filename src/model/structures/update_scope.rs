use serde::Serialize;
use strum_macros::Display;

/// Which recipes a batch run rewrites
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "camelCase")]
pub enum UpdateScope {
    /// Only recipes with at least one vote
    RatedOnly,
    /// Every recipe. Unrated recipes are written with a score of 0
    AllRecipes
}

impl UpdateScope {
    pub fn includes(self, rating_count: i32) -> bool {
        match self {
            UpdateScope::RatedOnly => rating_count > 0,
            UpdateScope::AllRecipes => true
        }
    }
}
