use crate::model::{structures::star_rating::StarRating, weighted::simple_average};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The rating fields of a recipe row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeAccumulator {
    pub id: i32,
    pub title: String,
    pub rating_sum: f64,
    pub rating_count: i32,
    /// Simple average, stored for display
    pub rating: Option<f64>,
    /// Absent until the first batch run
    pub weighted_rating: Option<f64>,
    pub last_rating_update: Option<DateTime<Utc>>
}

impl RecipeAccumulator {
    /// A zeroed accumulator for a freshly created recipe
    pub fn new(id: i32, title: impl Into<String>) -> Self {
        RecipeAccumulator {
            id,
            title: title.into(),
            rating_sum: 0.0,
            rating_count: 0,
            rating: None,
            weighted_rating: None,
            last_rating_update: None
        }
    }

    pub fn mean(&self) -> Option<f64> {
        simple_average(self.rating_sum, i64::from(self.rating_count))
    }

    pub fn has_votes(&self) -> bool {
        self.rating_count > 0
    }
}

/// An individually recorded vote. `value` is kept raw so the inspection
/// report can flag rows outside the valid range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: i32,
    pub recipe_id: i32,
    pub user_id: String,
    pub value: i32
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVote {
    pub recipe_id: i32,
    pub user_id: String,
    pub rating: StarRating
}
