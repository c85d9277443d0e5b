use crate::database::db_structs::{RecipeAccumulator, Vote};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn generate_recipe(id: i32, title: &str, rating_count: i32, rating_sum: f64) -> RecipeAccumulator {
    let mut recipe = RecipeAccumulator::new(id, title);
    recipe.rating_count = rating_count;
    recipe.rating_sum = rating_sum;
    recipe.rating = recipe.mean();

    recipe
}

/// One vote per value, each from a distinct user
pub fn generate_votes(recipe_id: i32, values: &[i32]) -> Vec<Vote> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| Vote {
            id: recipe_id * 1_000 + i as i32,
            recipe_id,
            user_id: format!("user-{}", i),
            value: *value
        })
        .collect()
}

/// Generates `n_recipes` recipes with random vote values whose accumulators
/// agree with the returned votes. Seeded, so results are reproducible.
pub fn generate_corpus(n_recipes: i32, max_votes: i32, seed: u64) -> (Vec<RecipeAccumulator>, Vec<Vote>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut recipes = Vec::with_capacity(n_recipes as usize);
    let mut votes = Vec::new();

    for id in 1..=n_recipes {
        let n_votes = rng.random_range(0..=max_votes);
        let values = (0..n_votes).map(|_| rng.random_range(1..=5)).collect::<Vec<i32>>();
        let sum = values.iter().sum::<i32>();

        recipes.push(generate_recipe(id, &format!("Recipe {}", id), n_votes, sum as f64));
        votes.extend(generate_votes(id, &values));
    }

    (recipes, votes)
}
