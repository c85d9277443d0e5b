use super::{
    db_structs::{NewVote, RecipeAccumulator, Vote},
    store::{RecipeStore, StoreError}
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashSet}
};
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    recipes: BTreeMap<i32, RecipeAccumulator>,
    votes: Vec<Vote>,
    next_vote_id: i32,
    failing_updates: HashSet<i32>,
    unavailable: bool
}

/// Process-local [`RecipeStore`]. Used when no database is configured,
/// and in tests where storage faults need to be injected.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with accumulators as-is. Votes are not synthesized.
    pub fn with_recipes(recipes: Vec<RecipeAccumulator>) -> Self {
        let state = MemoryState {
            recipes: recipes.into_iter().map(|r| (r.id, r)).collect(),
            ..Default::default()
        };

        MemoryStore {
            state: RwLock::new(state)
        }
    }

    /// Inserts a vote row without touching the accumulator
    pub async fn insert_raw_vote(&self, recipe_id: i32, user_id: &str, value: i32) {
        let mut state = self.state.write().await;
        state.next_vote_id += 1;
        let id = state.next_vote_id;

        state.votes.push(Vote {
            id,
            recipe_id,
            user_id: user_id.to_string(),
            value
        });
    }

    /// Deletes a recipe and its votes
    pub async fn remove_recipe(&self, recipe_id: i32) {
        let mut state = self.state.write().await;
        state.recipes.remove(&recipe_id);
        state.votes.retain(|v| v.recipe_id != recipe_id);
    }

    /// Makes every subsequent score update for `recipe_id` fail
    pub async fn fail_updates_for(&self, recipe_id: i32) {
        self.state.write().await.failing_updates.insert(recipe_id);
    }

    /// Makes every operation fail, as if the database were down
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    pub async fn recipe(&self, recipe_id: i32) -> Option<RecipeAccumulator> {
        self.state.read().await.recipes.get(&recipe_id).cloned()
    }

    fn check_available(state: &MemoryState) -> Result<(), StoreError> {
        if state.unavailable {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn create_recipe(&self, title: &str) -> Result<RecipeAccumulator, StoreError> {
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        let id = state.recipes.keys().next_back().map_or(1, |id| id + 1);
        let recipe = RecipeAccumulator::new(id, title);
        state.recipes.insert(id, recipe.clone());

        Ok(recipe)
    }

    async fn recipe_accumulators(&self) -> Result<Vec<RecipeAccumulator>, StoreError> {
        let state = self.state.read().await;
        Self::check_available(&state)?;

        Ok(state.recipes.values().cloned().collect())
    }

    async fn update_weighted_rating(
        &self,
        recipe_id: i32,
        weighted_rating: f64,
        updated_at: DateTime<Utc>
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        if state.failing_updates.contains(&recipe_id) {
            return Err(StoreError::Unavailable(format!("update of recipe {} rejected", recipe_id)));
        }

        let recipe = state
            .recipes
            .get_mut(&recipe_id)
            .ok_or(StoreError::RecipeNotFound(recipe_id))?;

        if recipe.last_rating_update.is_some_and(|stored| stored > updated_at) {
            return Err(StoreError::Superseded { recipe_id });
        }

        recipe.weighted_rating = Some(weighted_rating);
        recipe.last_rating_update = Some(updated_at);

        Ok(())
    }

    async fn votes(&self) -> Result<Vec<Vote>, StoreError> {
        let state = self.state.read().await;
        Self::check_available(&state)?;

        Ok(state.votes.clone())
    }

    async fn record_vote(&self, vote: &NewVote) -> Result<RecipeAccumulator, StoreError> {
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        if !state.recipes.contains_key(&vote.recipe_id) {
            return Err(StoreError::RecipeNotFound(vote.recipe_id));
        }

        let duplicate = state
            .votes
            .iter()
            .any(|v| v.recipe_id == vote.recipe_id && v.user_id == vote.user_id);

        if duplicate {
            return Err(StoreError::DuplicateVote {
                recipe_id: vote.recipe_id,
                user_id: vote.user_id.clone()
            });
        }

        state.next_vote_id += 1;
        let id = state.next_vote_id;
        let value = vote.rating.value();

        state.votes.push(Vote {
            id,
            recipe_id: vote.recipe_id,
            user_id: vote.user_id.clone(),
            value
        });

        let recipe = state
            .recipes
            .get_mut(&vote.recipe_id)
            .ok_or(StoreError::RecipeNotFound(vote.recipe_id))?;

        recipe.rating_sum += value as f64;
        recipe.rating_count += 1;
        recipe.rating = recipe.mean();

        Ok(recipe.clone())
    }

    async fn top_recipes(&self, limit: i64) -> Result<Vec<RecipeAccumulator>, StoreError> {
        let state = self.state.read().await;
        Self::check_available(&state)?;

        let mut recipes = state.recipes.values().cloned().collect::<Vec<_>>();
        recipes.sort_by(|a, b| {
            // None < Some, so descending order leaves unscored recipes last
            b.weighted_rating
                .partial_cmp(&a.weighted_rating)
                .unwrap_or(Ordering::Equal)
                .then(b.rating_count.cmp(&a.rating_count))
                .then(a.id.cmp(&b.id))
        });
        recipes.truncate(limit.max(0) as usize);

        Ok(recipes)
    }
}
