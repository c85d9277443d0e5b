use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::db_structs::{NewVote, RecipeAccumulator, Vote};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Recipe {0} not found")]
    RecipeNotFound(i32),

    #[error("Recipe {recipe_id} already has a weighted rating from a newer run")]
    Superseded { recipe_id: i32 },

    #[error("User {user_id} has already rated recipe {recipe_id}")]
    DuplicateVote { recipe_id: i32, user_id: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String)
}

/// Row-level access to recipe rating data.
///
/// Implementations only guarantee atomicity for a single row. Batch callers
/// read a snapshot and then issue independent per-recipe updates.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Inserts a recipe with a zeroed accumulator
    async fn create_recipe(&self, title: &str) -> Result<RecipeAccumulator, StoreError>;

    /// Snapshot of every recipe's accumulator, ordered by id
    async fn recipe_accumulators(&self) -> Result<Vec<RecipeAccumulator>, StoreError>;

    /// Writes the smoothed score and update timestamp for one recipe.
    ///
    /// The write is skipped with [`StoreError::Superseded`] when the row
    /// already carries a later `last_rating_update`, so the stored timestamp
    /// never moves backwards. Fails with [`StoreError::RecipeNotFound`] if
    /// the row is gone.
    async fn update_weighted_rating(
        &self,
        recipe_id: i32,
        weighted_rating: f64,
        updated_at: DateTime<Utc>
    ) -> Result<(), StoreError>;

    /// Every individually recorded vote
    async fn votes(&self) -> Result<Vec<Vote>, StoreError>;

    /// Records a vote and increments the recipe's accumulator atomically
    async fn record_vote(&self, vote: &NewVote) -> Result<RecipeAccumulator, StoreError>;

    /// Recipes ordered by weighted rating, highest first. Recipes that were
    /// never scored sort last.
    async fn top_recipes(&self, limit: i64) -> Result<Vec<RecipeAccumulator>, StoreError>;
}
