use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    database::db_structs::RecipeAccumulator,
    model::{
        constants::SCORE_DECIMALS,
        inspect::InspectionReport,
        weighted::round_to,
        BatchReport, RecipeUpdate
    }
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String
}

#[derive(Debug, Deserialize)]
pub struct CronQuery {
    pub secret: Option<String>
}

#[derive(Debug, Deserialize)]
pub struct TopRecipesQuery {
    pub limit: Option<i64>
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRecipeRequest {
    pub user_id: String,
    pub value: i32
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UpdateFailure {
    pub id: i32,
    pub reason: String
}

impl UpdateFailure {
    fn from_outcome(outcome: &RecipeUpdate) -> Option<Self> {
        outcome.status.failure().map(|reason| UpdateFailure {
            id: outcome.recipe_id(),
            reason: reason.to_string()
        })
    }
}

fn failures(report: &BatchReport) -> Vec<UpdateFailure> {
    report.outcomes.iter().filter_map(UpdateFailure::from_outcome).collect()
}

fn message(report: &BatchReport) -> String {
    let mut message = format!("Updated weighted ratings for {} recipes", report.recipes_processed());

    let superseded = report.recipes_superseded();
    if superseded > 0 {
        message.push_str(&format!(", {} already updated by a newer run", superseded));
    }

    let failed = report.failures().len();
    if failed > 0 {
        message.push_str(&format!(", {} failed", failed));
    }

    message
}

/// Response of the scheduled endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronResponse {
    pub success: bool,
    pub message: String,
    pub recipes_updated: usize,
    #[serde(default)]
    pub recipes_superseded: usize,
    pub global_average: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<UpdateFailure>
}

impl From<&BatchReport> for CronResponse {
    fn from(report: &BatchReport) -> Self {
        CronResponse {
            success: report.is_complete(),
            message: message(report),
            recipes_updated: report.recipes_processed(),
            recipes_superseded: report.recipes_superseded(),
            global_average: round_to(report.global_average, SCORE_DECIMALS),
            failures: failures(report)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationSummary {
    pub recipes_processed: usize,
    #[serde(default)]
    pub recipes_superseded: usize,
    pub global_average: f64,
    pub minimum_votes_threshold: u32,
    pub update_time: DateTime<Utc>
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSnapshot {
    pub rating_count: i32,
    pub rating_sum: f64,
    pub rating: Option<f64>,
    pub weighted_rating: Option<f64>,
    pub last_rating_update: Option<DateTime<Utc>>
}

impl From<&RecipeAccumulator> for RatingSnapshot {
    fn from(recipe: &RecipeAccumulator) -> Self {
        RatingSnapshot {
            rating_count: recipe.rating_count,
            rating_sum: recipe.rating_sum,
            rating: recipe.rating,
            weighted_rating: recipe.weighted_rating,
            last_rating_update: recipe.last_rating_update
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedRating {
    pub weighted_rating: f64,
    pub last_rating_update: DateTime<Utc>
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedResult {
    pub id: i32,
    pub title: String,
    pub old_data: RatingSnapshot,
    pub new_data: UpdatedRating,
    pub calculation: String
}

/// Response of the manual endpoint. Echoes a before/after snapshot of every
/// recipe that was written.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateResponse {
    pub success: bool,
    pub message: String,
    pub summary: RecalculationSummary,
    pub detailed_results: Vec<DetailedResult>,
    pub failures: Vec<UpdateFailure>
}

impl From<&BatchReport> for RecalculateResponse {
    fn from(report: &BatchReport) -> Self {
        let detailed_results = report
            .outcomes
            .iter()
            .filter_map(|outcome| {
                let score = outcome.status.score()?;

                Some(DetailedResult {
                    id: outcome.before.id,
                    title: outcome.before.title.clone(),
                    old_data: RatingSnapshot::from(&outcome.before),
                    new_data: UpdatedRating {
                        weighted_rating: score,
                        last_rating_update: report.updated_at
                    },
                    calculation: outcome.calculation.clone()
                })
            })
            .collect();

        RecalculateResponse {
            success: report.is_complete(),
            message: message(report),
            summary: RecalculationSummary {
                recipes_processed: report.recipes_processed(),
                recipes_superseded: report.recipes_superseded(),
                global_average: round_to(report.global_average, SCORE_DECIMALS),
                minimum_votes_threshold: report.minimum_votes,
                update_time: report.updated_at
            },
            detailed_results,
            failures: failures(report)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: InspectionReport
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopRecipesResponse {
    pub success: bool,
    pub recipes: Vec<RecipeAccumulator>
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RateRecipeResponse {
    pub success: bool,
    pub recipe: RecipeAccumulator
}
