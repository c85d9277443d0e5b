use std::collections::HashMap;

use serde::Serialize;

use crate::{
    database::{
        db_structs::{RecipeAccumulator, Vote},
        store::StoreError,
        RecipeStore
    },
    model::{
        constants::{INSPECTION_GLOBAL_AVERAGE, SCORE_DECIMALS},
        parameters::RatingParameters,
        structures::star_rating::StarRating,
        weighted::{round_to, simple_average, weighted_rating}
    }
};

/// Number of votes per star value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VoteDistribution {
    #[serde(rename = "1")]
    pub one: i64,
    #[serde(rename = "2")]
    pub two: i64,
    #[serde(rename = "3")]
    pub three: i64,
    #[serde(rename = "4")]
    pub four: i64,
    #[serde(rename = "5")]
    pub five: i64
}

impl VoteDistribution {
    fn add(&mut self, star: StarRating) {
        match star {
            StarRating::One => self.one += 1,
            StarRating::Two => self.two += 1,
            StarRating::Three => self.three += 1,
            StarRating::Four => self.four += 1,
            StarRating::Five => self.five += 1
        }
    }

    pub fn total(&self) -> i64 {
        self.one + self.two + self.three + self.four + self.five
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_recipes: usize,
    pub recipes_with_votes: usize,
    /// Valid votes only
    pub total_votes: i64,
    /// Votes whose value falls outside 1..=5
    pub invalid_votes: i64,
    pub overall_average: Option<f64>,
    pub global_average_used: f64,
    pub minimum_votes: u32,
    pub distribution: VoteDistribution
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStats {
    pub id: i32,
    pub title: String,
    pub actual_sum: i64,
    pub actual_count: i64,
    pub actual_average: Option<f64>,
    /// Smoothed toward the fixed inspection prior, not the corpus prior
    pub weighted_rating: f64,
    pub stored_sum: f64,
    pub stored_count: i32,
    pub stored_weighted_rating: Option<f64>,
    /// Whether the stored accumulator matches the recorded votes
    pub accumulator_consistent: bool
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionReport {
    pub global_stats: GlobalStats,
    pub recipe_stats: Vec<RecipeStats>,
    pub explanation: String
}

#[derive(Default)]
struct Tally {
    sum: i64,
    count: i64
}

/// Rebuilds rating statistics from individual votes, independent of the
/// stored accumulators. Read-only.
pub fn inspect(recipes: &[RecipeAccumulator], votes: &[Vote], params: &RatingParameters) -> InspectionReport {
    let mut tallies: HashMap<i32, Tally> = HashMap::new();
    let mut distribution = VoteDistribution::default();
    let mut invalid_votes = 0;

    for vote in votes {
        match StarRating::try_from(vote.value) {
            Ok(star) => {
                distribution.add(star);
                let tally = tallies.entry(vote.recipe_id).or_default();
                tally.sum += vote.value as i64;
                tally.count += 1;
            }
            Err(_) => invalid_votes += 1
        }
    }

    let m = params.minimum_votes;
    let recipe_stats = recipes
        .iter()
        .map(|recipe| {
            let (actual_sum, actual_count) = tallies
                .get(&recipe.id)
                .map_or((0, 0), |t| (t.sum, t.count));
            let average = simple_average(actual_sum as f64, actual_count);

            RecipeStats {
                id: recipe.id,
                title: recipe.title.clone(),
                actual_sum,
                actual_count,
                actual_average: average.map(|a| round_to(a, SCORE_DECIMALS)),
                weighted_rating: weighted_rating(actual_count, average.unwrap_or(0.0), m, INSPECTION_GLOBAL_AVERAGE),
                stored_sum: recipe.rating_sum,
                stored_count: recipe.rating_count,
                stored_weighted_rating: recipe.weighted_rating,
                accumulator_consistent: recipe.rating_count as i64 == actual_count
                    && (recipe.rating_sum - actual_sum as f64).abs() < f64::EPSILON
            }
        })
        .collect::<Vec<_>>();

    let total_votes = distribution.total();
    let vote_sum = tallies.values().map(|t| t.sum).sum::<i64>();
    let overall_average = simple_average(vote_sum as f64, total_votes).map(|a| round_to(a, SCORE_DECIMALS));

    let global_stats = GlobalStats {
        total_recipes: recipes.len(),
        recipes_with_votes: recipe_stats.iter().filter(|s| s.actual_count > 0).count(),
        total_votes,
        invalid_votes,
        overall_average,
        global_average_used: INSPECTION_GLOBAL_AVERAGE,
        minimum_votes: m,
        distribution
    };

    InspectionReport {
        global_stats,
        recipe_stats,
        explanation: explanation(m)
    }
}

/// Loads recipes and votes from `store` and runs [`inspect`] over them
pub async fn inspect_store(store: &dyn RecipeStore, params: &RatingParameters) -> Result<InspectionReport, StoreError> {
    let (recipes, votes) = tokio::try_join!(store.recipe_accumulators(), store.votes())?;

    Ok(inspect(&recipes, &votes, params))
}

fn explanation(minimum_votes: u32) -> String {
    format!(
        "Weighted rating = (v × R + m × C) / (v + m), where v is the recipe's vote count, R its average vote, \
        m = {} the minimum votes and C the global average. This report recomputes v and R from individual \
        votes and uses a fixed C = {:.1}. Recipes without votes score 0.",
        minimum_votes, INSPECTION_GLOBAL_AVERAGE
    )
}
