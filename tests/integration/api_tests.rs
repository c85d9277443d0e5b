use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router
};
use recipe_ratings::{
    api::create_router,
    database::{MemoryStore, RecipeStore},
    utils::test_utils::generate_recipe
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::common::{init_test_env, test_state, TEST_SECRET};

/// Two rated recipes whose averages (4.5 and 1.5) put the prior at 3.0,
/// plus one recipe nobody has rated
fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_recipes(vec![
        generate_recipe(1, "Stew", 10, 45.0),
        generate_recipe(2, "Burnt toast", 10, 15.0),
        generate_recipe(3, "Untried soup", 0, 0.0),
    ]))
}

fn app(store: &Arc<MemoryStore>) -> Router {
    init_test_env();
    create_router(test_state(store.clone()))
}

async fn make_request(app: &Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(path);

    let request = match body {
        Some(json_body) => {
            request = request.header("content-type", "application/json");
            request.body(Body::from(json_body.to_string())).unwrap()
        }
        None => request.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

#[tokio::test]
async fn test_health() {
    let store = seeded_store();
    let (status, body) = make_request(&app(&store), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_cron_rejects_wrong_secret() {
    let store = seeded_store();
    let app = app(&store);

    let (status, body) = make_request(&app, Method::GET, "/api/cron/update-ratings?secret=nope", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = make_request(&app, Method::GET, "/api/cron/update-ratings", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // No row was touched
    for recipe in store.recipe_accumulators().await.unwrap() {
        assert_eq!(recipe.last_rating_update, None);
        assert_eq!(recipe.weighted_rating, None);
    }
}

#[tokio::test]
async fn test_cron_rejects_everything_without_configured_secret() {
    let store = seeded_store();
    let mut state = test_state(store.clone());
    state.cron_secret = None;
    let app = create_router(state);

    let (status, _) = make_request(&app, Method::GET, "/api/cron/update-ratings?secret=", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cron_updates_every_recipe() {
    let store = seeded_store();
    let path = format!("/api/cron/update-ratings?secret={}", TEST_SECRET);

    let (status, body) = make_request(&app(&store), Method::GET, &path, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["recipesUpdated"], 3);
    assert_eq!(body["globalAverage"], 3.0);
    assert!(body.get("failures").is_none());

    assert_eq!(store.recipe(1).await.unwrap().weighted_rating, Some(4.0));
    assert_eq!(store.recipe(2).await.unwrap().weighted_rating, Some(2.0));
    assert_eq!(store.recipe(3).await.unwrap().weighted_rating, Some(0.0));
}

#[tokio::test]
async fn test_manual_recalculation_details() {
    let store = seeded_store();
    let (status, body) = make_request(&app(&store), Method::POST, "/api/ratings/recalculate", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["summary"]["recipesProcessed"], 2);
    assert_eq!(body["summary"]["globalAverage"], 3.0);
    assert_eq!(body["summary"]["minimumVotesThreshold"], 5);
    assert!(body["summary"]["updateTime"].is_string());

    let results = body["detailedResults"].as_array().unwrap();
    assert_eq!(results.len(), 2);

    let stew = results.iter().find(|r| r["id"] == 1).unwrap();
    assert_eq!(stew["title"], "Stew");
    assert_eq!(stew["oldData"]["ratingCount"], 10);
    assert_eq!(stew["oldData"]["ratingSum"], 45.0);
    assert_eq!(stew["oldData"]["weightedRating"], Value::Null);
    assert_eq!(stew["newData"]["weightedRating"], 4.0);
    assert_eq!(stew["newData"]["lastRatingUpdate"], body["summary"]["updateTime"]);
    assert_eq!(stew["calculation"], "(10 × 4.50 + 5 × 3.00) / (10 + 5) = 4.00");

    // Unrated recipes are out of scope for the manual run
    assert_eq!(store.recipe(3).await.unwrap().weighted_rating, None);
}

#[tokio::test]
async fn test_manual_recalculation_on_empty_corpus() {
    let store = Arc::new(MemoryStore::new());
    let (status, body) = make_request(&app(&store), Method::POST, "/api/ratings/recalculate", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["recipesProcessed"], 0);
    assert_eq!(body["summary"]["globalAverage"], 3.0);
    assert_eq!(body["detailedResults"], json!([]));
}

#[tokio::test]
async fn test_recalculation_is_idempotent() {
    let store = seeded_store();
    let app = app(&store);

    let (_, first) = make_request(&app, Method::POST, "/api/ratings/recalculate", None).await;
    let (_, second) = make_request(&app, Method::POST, "/api/ratings/recalculate", None).await;

    let scores = |body: &Value| {
        body["detailedResults"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| (r["id"].as_i64().unwrap(), r["newData"]["weightedRating"].as_f64().unwrap()))
            .collect::<Vec<_>>()
    };

    assert_eq!(scores(&first), scores(&second));

    // The second run sees the first run's scores as its old data
    let stew = second["detailedResults"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == 1)
        .unwrap()
        .clone();
    assert_eq!(stew["oldData"]["weightedRating"], 4.0);
}

#[tokio::test]
async fn test_partial_failure_is_reported() {
    let store = seeded_store();
    store.fail_updates_for(2).await;

    let (status, body) = make_request(&app(&store), Method::POST, "/api/ratings/recalculate", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["summary"]["recipesProcessed"], 1);
    assert_eq!(body["failures"][0]["id"], 2);
    assert!(body["failures"][0]["reason"].as_str().unwrap().contains("recipe 2"));
    assert_eq!(store.recipe(1).await.unwrap().weighted_rating, Some(4.0));
}

#[tokio::test]
async fn test_storage_failure_returns_500() {
    let store = seeded_store();
    store.set_unavailable(true).await;
    let app = app(&store);

    let (status, body) = make_request(&app, Method::POST, "/api/ratings/recalculate", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Storage unavailable: memory store is offline");

    let (status, _) = make_request(&app, Method::GET, "/api/ratings/debug", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_debug_report() {
    let store = Arc::new(MemoryStore::new());
    let recipe = store.create_recipe("Stew").await.unwrap();
    let app = app(&store);

    for (i, value) in [5, 4, 4].iter().enumerate() {
        let path = format!("/api/recipes/{}/ratings", recipe.id);
        let body = json!({ "userId": format!("user-{}", i), "value": value });
        let (status, _) = make_request(&app, Method::POST, &path, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = make_request(&app, Method::GET, "/api/ratings/debug", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["globalStats"]["totalVotes"], 3);
    assert_eq!(body["globalStats"]["distribution"]["4"], 2);
    assert_eq!(body["globalStats"]["distribution"]["5"], 1);
    assert_eq!(body["globalStats"]["globalAverageUsed"], 3.0);

    let stats = &body["recipeStats"][0];
    assert_eq!(stats["actualSum"], 13);
    assert_eq!(stats["actualCount"], 3);
    assert_eq!(stats["actualAverage"], 4.33);
    // (3 × 4.333 + 5 × 3) / 8 = 3.5
    assert_eq!(stats["weightedRating"], 3.5);
    assert_eq!(stats["accumulatorConsistent"], true);
    assert!(body["explanation"].as_str().unwrap().contains("C = 3.0"));

    // Inspection never writes
    assert_eq!(store.recipe(recipe.id).await.unwrap().weighted_rating, None);
}

#[tokio::test]
async fn test_rate_recipe_validation() {
    let store = seeded_store();
    let app = app(&store);

    let (status, _) = make_request(
        &app,
        Method::POST,
        "/api/recipes/1/ratings",
        Some(json!({ "userId": "alice", "value": 6 }))
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = make_request(
        &app,
        Method::POST,
        "/api/recipes/1/ratings",
        Some(json!({ "userId": "  ", "value": 3 }))
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = make_request(
        &app,
        Method::POST,
        "/api/recipes/404/ratings",
        Some(json!({ "userId": "alice", "value": 3 }))
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/recipes/3/ratings",
        Some(json!({ "userId": "alice", "value": 3 }))
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["recipe"]["ratingCount"], 1);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/recipes/3/ratings",
        Some(json!({ "userId": "alice", "value": 5 }))
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_vote_requests_get_json_errors() {
    let store = seeded_store();
    let app = app(&store);

    let bodies = [
        json!({ "userId": "alice", "value": 4.5 }),
        json!({ "userId": "alice", "value": "five" }),
        json!({ "value": 3 }),
    ];

    for body in bodies {
        let (status, response) = make_request(&app, Method::POST, "/api/recipes/1/ratings", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["success"], false);
        assert!(!response["error"].as_str().unwrap().is_empty());
    }

    let (status, response) = make_request(
        &app,
        Method::POST,
        "/api/recipes/stew/ratings",
        Some(json!({ "userId": "alice", "value": 3 }))
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["success"], false);

    let (status, response) = make_request(&app, Method::GET, "/api/recipes/top?limit=lots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["success"], false);

    // Nothing was recorded
    assert!(store.votes().await.unwrap().is_empty());
    assert_eq!(store.recipe(1).await.unwrap().rating_count, 10);
}

#[tokio::test]
async fn test_top_recipes_after_update() {
    let store = seeded_store();
    let app = app(&store);
    let path = format!("/api/cron/update-ratings?secret={}", TEST_SECRET);
    make_request(&app, Method::GET, &path, None).await;

    let (status, body) = make_request(&app, Method::GET, "/api/recipes/top?limit=2", None).await;

    assert_eq!(status, StatusCode::OK);
    let recipes = body["recipes"].as_array().unwrap();
    assert_eq!(recipes.len(), 2);
    assert_eq!(recipes[0]["title"], "Stew");
    assert_eq!(recipes[0]["weightedRating"], 4.0);
    assert_eq!(recipes[1]["title"], "Burnt toast");
}
