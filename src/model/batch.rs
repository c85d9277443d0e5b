use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use itertools::Itertools;
use tracing::{debug, info, warn, Instrument, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;
use uuid::Uuid;

use crate::{
    database::{db_structs::RecipeAccumulator, store::StoreError, RecipeStore},
    model::{
        parameters::RatingParameters,
        prior::global_prior,
        structures::update_scope::UpdateScope,
        weighted::{formula_explanation, weighted_rating}
    },
    utils::progress_utils::progress_span
};

/// What happened to one recipe's write
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateStatus {
    /// The new score is stored
    Written(f64),
    /// A run with a later timestamp already wrote this recipe, so this
    /// run's older score was dropped
    Superseded,
    /// The write failed, with the reason
    Failed(String)
}

impl UpdateStatus {
    pub fn score(&self) -> Option<f64> {
        match self {
            UpdateStatus::Written(score) => Some(*score),
            _ => None
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            UpdateStatus::Failed(reason) => Some(reason),
            _ => None
        }
    }
}

/// Outcome of recomputing a single recipe
#[derive(Debug, Clone)]
pub struct RecipeUpdate {
    /// The accumulator as read at the start of the run
    pub before: RecipeAccumulator,
    pub calculation: String,
    pub status: UpdateStatus
}

impl RecipeUpdate {
    pub fn recipe_id(&self) -> i32 {
        self.before.id
    }
}

/// Summary of one batch run. Writes that succeeded stay committed even when
/// other recipes in the same run failed.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub scope: UpdateScope,
    /// The prior `C` used for every recipe in this run
    pub global_average: f64,
    pub minimum_votes: u32,
    pub updated_at: DateTime<Utc>,
    pub outcomes: Vec<RecipeUpdate>
}

impl BatchReport {
    /// Recipes whose new score was stored by this run
    pub fn recipes_processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.score().is_some()).count()
    }

    /// Recipes left alone because a newer run already wrote them
    pub fn recipes_superseded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == UpdateStatus::Superseded)
            .count()
    }

    pub fn failures(&self) -> Vec<&RecipeUpdate> {
        self.outcomes.iter().filter(|o| o.status.failure().is_some()).collect()
    }

    /// No write failed. Superseded writes do not count as failures.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.failure().is_none())
    }
}

/// Recomputes and persists weighted ratings for a snapshot of recipes
pub struct BatchUpdater {
    store: Arc<dyn RecipeStore>,
    params: RatingParameters,
    show_progress: bool
}

impl BatchUpdater {
    pub fn new(store: Arc<dyn RecipeStore>, params: RatingParameters) -> Self {
        BatchUpdater {
            store,
            params,
            show_progress: false
        }
    }

    /// Draws a progress bar while updates are in flight
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Reads every accumulator once, derives the prior from that snapshot and
    /// writes a new score for each recipe in `scope`.
    ///
    /// Only the initial read can fail the run. Votes recorded after the
    /// snapshot are picked up by the next run. When runs overlap, a recipe
    /// already written by a run with a later timestamp is reported as
    /// [`UpdateStatus::Superseded`] and keeps the newer score.
    pub async fn run(&self, scope: UpdateScope) -> Result<BatchReport, StoreError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, %scope, "Starting weighted rating recalculation");

        let snapshot = self.store.recipe_accumulators().await?;
        let global_average = global_prior(&snapshot, &self.params);
        let updated_at = Utc::now();

        let selected = snapshot
            .into_iter()
            .filter(|r| scope.includes(r.rating_count))
            .collect_vec();

        info!(
            %run_id,
            recipes = selected.len(),
            global_average,
            policy = %self.params.prior_policy,
            "Snapshot loaded"
        );

        let progress = if self.show_progress {
            progress_span(selected.len() as u64, "Updating weighted ratings")
        } else {
            Span::none()
        };

        let store = &self.store;
        let minimum_votes = self.params.minimum_votes;
        let updates = selected.into_iter().map(|recipe| {
            let progress = progress.clone();

            async move {
                let votes = recipe.rating_count as i64;
                let mean = recipe.mean().unwrap_or(0.0);
                let score = weighted_rating(votes, mean, minimum_votes, global_average);
                let calculation = formula_explanation(votes, mean, minimum_votes, global_average, score);

                let status = match store.update_weighted_rating(recipe.id, score, updated_at).await {
                    Ok(()) => {
                        debug!(recipe_id = recipe.id, score, "{}", calculation);
                        UpdateStatus::Written(score)
                    }
                    Err(StoreError::Superseded { .. }) => {
                        info!(recipe_id = recipe.id, "Skipped, a newer run already updated this recipe");
                        UpdateStatus::Superseded
                    }
                    Err(e) => {
                        warn!(recipe_id = recipe.id, "Failed to update weighted rating: {}", e);
                        UpdateStatus::Failed(e.to_string())
                    }
                };

                progress.pb_inc(1);

                RecipeUpdate {
                    before: recipe,
                    calculation,
                    status
                }
            }
        });

        // Each update targets its own row, so they can all be in flight at once
        let outcomes = join_all(updates).instrument(progress.clone()).await;
        drop(progress);

        let report = BatchReport {
            run_id,
            scope,
            global_average,
            minimum_votes,
            updated_at,
            outcomes
        };

        info!(
            %run_id,
            processed = report.recipes_processed(),
            superseded = report.recipes_superseded(),
            failed = report.failures().len(),
            "Weighted rating recalculation complete"
        );

        Ok(report)
    }
}
