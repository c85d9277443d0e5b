use crate::{
    database::db_structs::RecipeAccumulator,
    model::{parameters::RatingParameters, structures::prior_policy::PriorPolicy}
};

/// Computes the corpus-wide prior `C` from a snapshot of accumulators.
///
/// Falls back to [`RatingParameters::default_prior`] when no recipe qualifies.
pub fn global_prior(recipes: &[RecipeAccumulator], params: &RatingParameters) -> f64 {
    let prior = match params.prior_policy {
        PriorPolicy::ThresholdMean => threshold_mean(recipes, params.minimum_votes),
        PriorPolicy::PooledTotals => pooled_totals(recipes)
    };

    prior.unwrap_or(params.default_prior)
}

fn threshold_mean(recipes: &[RecipeAccumulator], minimum_votes: u32) -> Option<f64> {
    let averages = recipes
        .iter()
        .filter(|r| r.rating_count >= 0 && r.rating_count as u32 >= minimum_votes)
        .filter_map(|r| r.mean())
        .collect::<Vec<f64>>();

    if averages.is_empty() {
        return None;
    }

    Some(averages.iter().sum::<f64>() / averages.len() as f64)
}

fn pooled_totals(recipes: &[RecipeAccumulator]) -> Option<f64> {
    let (sum, count) = recipes
        .iter()
        .filter(|r| r.has_votes())
        .fold((0.0, 0i64), |(sum, count), r| (sum + r.rating_sum, count + r.rating_count as i64));

    if count == 0 {
        return None;
    }

    Some(sum / count as f64)
}
