use super::{
    db_structs::{NewVote, RecipeAccumulator, Vote},
    store::{RecipeStore, StoreError}
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use postgres_types::ToSql;
use std::sync::Arc;
use tokio_postgres::{error::SqlState, Client, Error, NoTls, Row};
use tracing::{debug, error, info};

const SCHEMA: &str = include_str!("schema.sql");

const RECIPE_COLUMNS: &str =
    "id, title, rating_sum, rating_count, rating, weighted_rating, last_rating_update";

#[derive(Clone)]
pub struct DbClient {
    client: Arc<Client>
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self, Error> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        Ok(DbClient {
            client: Arc::new(client)
        })
    }

    /// Creates the recipes and ratings tables if they do not exist yet
    pub async fn migrate(&self) -> Result<(), Error> {
        self.client.batch_execute(SCHEMA).await?;
        info!("Database schema is up to date");
        Ok(())
    }

    fn recipe_from_row(row: &Row) -> RecipeAccumulator {
        RecipeAccumulator {
            id: row.get("id"),
            title: row.get("title"),
            rating_sum: row.get("rating_sum"),
            rating_count: row.get("rating_count"),
            rating: row.get("rating"),
            weighted_rating: row.get("weighted_rating"),
            last_rating_update: row.get("last_rating_update")
        }
    }

    fn vote_from_row(row: &Row) -> Vote {
        Vote {
            id: row.get("id"),
            recipe_id: row.get("recipe_id"),
            user_id: row.get("user_id"),
            value: row.get("value")
        }
    }

    fn map_vote_error(e: Error, vote: &NewVote) -> StoreError {
        match e.code() {
            Some(code) if *code == SqlState::UNIQUE_VIOLATION => StoreError::DuplicateVote {
                recipe_id: vote.recipe_id,
                user_id: vote.user_id.clone()
            },
            Some(code) if *code == SqlState::FOREIGN_KEY_VIOLATION => StoreError::RecipeNotFound(vote.recipe_id),
            _ => StoreError::Postgres(e)
        }
    }

    // Access the underlying Client
    pub fn client(&self) -> Arc<Client> {
        Arc::clone(&self.client)
    }
}

#[async_trait]
impl RecipeStore for DbClient {
    async fn create_recipe(&self, title: &str) -> Result<RecipeAccumulator, StoreError> {
        let query = format!("INSERT INTO recipes (title) VALUES ($1) RETURNING {}", RECIPE_COLUMNS);
        let row = self.client.query_one(query.as_str(), &[&title]).await?;

        Ok(Self::recipe_from_row(&row))
    }

    async fn recipe_accumulators(&self) -> Result<Vec<RecipeAccumulator>, StoreError> {
        let query = format!("SELECT {} FROM recipes ORDER BY id", RECIPE_COLUMNS);
        let rows = self.client.query(query.as_str(), &[]).await?;

        debug!("Fetched {} recipe accumulators", rows.len());
        Ok(rows.iter().map(Self::recipe_from_row).collect())
    }

    async fn update_weighted_rating(
        &self,
        recipe_id: i32,
        weighted_rating: f64,
        updated_at: DateTime<Utc>
    ) -> Result<(), StoreError> {
        let query = "UPDATE recipes SET weighted_rating = $1, last_rating_update = $2
            WHERE id = $3 AND (last_rating_update IS NULL OR last_rating_update <= $2)";
        let values: &[&(dyn ToSql + Sync)] = &[&weighted_rating, &updated_at, &recipe_id];

        let updated = self.client.execute(query, values).await?;
        if updated > 0 {
            return Ok(());
        }

        // Nothing matched: either the row is gone or a newer run got there first
        let exists = self
            .client
            .query_opt("SELECT 1 FROM recipes WHERE id = $1", &[&recipe_id])
            .await?
            .is_some();

        if exists {
            Err(StoreError::Superseded { recipe_id })
        } else {
            Err(StoreError::RecipeNotFound(recipe_id))
        }
    }

    async fn votes(&self) -> Result<Vec<Vote>, StoreError> {
        let rows = self
            .client
            .query("SELECT id, recipe_id, user_id, value FROM ratings ORDER BY id", &[])
            .await?;

        Ok(rows.iter().map(Self::vote_from_row).collect())
    }

    async fn record_vote(&self, vote: &NewVote) -> Result<RecipeAccumulator, StoreError> {
        // One statement, so the vote row and the accumulator move together
        let query = format!(
            "WITH inserted AS (
                INSERT INTO ratings (recipe_id, user_id, value) VALUES ($1, $2, $3)
                RETURNING recipe_id, value
            )
            UPDATE recipes r SET
                rating_sum = r.rating_sum + i.value,
                rating_count = r.rating_count + 1,
                rating = (r.rating_sum + i.value) / (r.rating_count + 1)
            FROM inserted i
            WHERE r.id = i.recipe_id
            RETURNING {}",
            RECIPE_COLUMNS.split(", ").map(|c| format!("r.{}", c)).join(", ")
        );
        let value = vote.rating.value();
        let values: &[&(dyn ToSql + Sync)] = &[&vote.recipe_id, &vote.user_id, &value];

        let row = self
            .client
            .query_opt(query.as_str(), values)
            .await
            .map_err(|e| Self::map_vote_error(e, vote))?;

        match row {
            Some(row) => Ok(Self::recipe_from_row(&row)),
            None => Err(StoreError::RecipeNotFound(vote.recipe_id))
        }
    }

    async fn top_recipes(&self, limit: i64) -> Result<Vec<RecipeAccumulator>, StoreError> {
        let query = format!(
            "SELECT {} FROM recipes ORDER BY weighted_rating DESC NULLS LAST, rating_count DESC, id LIMIT $1",
            RECIPE_COLUMNS
        );
        let rows = self.client.query(query.as_str(), &[&limit]).await?;

        Ok(rows.iter().map(Self::recipe_from_row).collect())
    }
}
