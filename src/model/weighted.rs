use crate::model::constants::SCORE_DECIMALS;

/// Smoothed score for a recipe.
///
/// - `v`: number of votes the recipe has
/// - `r`: the recipe's own mean rating
/// - `m`: minimum votes, i.e. how many phantom votes at the prior are mixed in
/// - `c`: the global prior
///
/// The result is rounded to [`SCORE_DECIMALS`] places. A recipe without
/// votes scores exactly `0.0`, which sorts it below every rated recipe.
pub fn weighted_rating(v: i64, r: f64, m: u32, c: f64) -> f64 {
    if v <= 0 {
        return 0.0;
    }

    round_to(bayesian_average(v as f64, r, m as f64, c), SCORE_DECIMALS)
}

/// `(v × R + m × C) / (v + m)` without rounding or the zero-vote rule
pub fn bayesian_average(v: f64, r: f64, m: f64, c: f64) -> f64 {
    (v * r + m * c) / (v + m)
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

pub fn simple_average(sum: f64, count: i64) -> Option<f64> {
    if count <= 0 {
        return None;
    }

    Some(sum / count as f64)
}

/// Renders the calculation for display, e.g. `(10 × 4.50 + 5 × 3.00) / (10 + 5) = 4.00`
pub fn formula_explanation(v: i64, r: f64, m: u32, c: f64, result: f64) -> String {
    if v <= 0 {
        return "No votes: weighted rating is 0".to_string();
    }

    format!("({} × {:.2} + {} × {:.2}) / ({} + {}) = {:.2}", v, r, m, c, v, m, result)
}
