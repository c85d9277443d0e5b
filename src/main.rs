use clap::Parser;
use recipe_ratings::{
    api::{self, AppState},
    args::Args,
    database::{DbClient, MemoryStore, RecipeStore},
    model::{structures::update_scope::UpdateScope, BatchUpdater}
};
use std::{process, sync::Arc};
use tracing::{error, info, warn};
use tracing_indicatif::{filter::IndicatifFilter, IndicatifLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    init_tracing(&args.log_level);

    let store = store(&args).await;
    let params = args.rating_parameters();

    info!(
        minimum_votes = params.minimum_votes,
        prior_policy = %params.prior_policy,
        "Rating parameters loaded"
    );

    if args.run_once {
        let report = BatchUpdater::new(store, params)
            .with_progress(true)
            .run(UpdateScope::AllRecipes)
            .await;

        match report {
            Ok(report) if report.is_complete() => {
                info!(
                    recipes = report.recipes_processed(),
                    global_average = report.global_average,
                    "Rating update finished"
                );
            }
            Ok(report) => {
                error!(
                    failed = report.failures().len(),
                    "Rating update finished with failures, re-run to retry"
                );
                process::exit(1);
            }
            Err(e) => {
                error!("Rating update failed: {}", e);
                process::exit(1);
            }
        }

        return;
    }

    if args.cron_secret.is_none() {
        warn!("CRON_SECRET is not set, scheduled rating updates will be rejected");
    }

    let state = AppState {
        store,
        params,
        cron_secret: args.cron_secret.clone()
    };

    if let Err(e) = api::serve(&args.socket_address(), state).await {
        error!("Server error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        // Only spans carrying `indicatif.pb_show` get a bar
        .with(indicatif_layer.with_filter(IndicatifFilter::new(false)))
        .init();
}

async fn store(args: &Args) -> Arc<dyn RecipeStore> {
    let Some(connection_string) = args.connection_string.as_deref() else {
        warn!("No CONNECTION_STRING configured, using an in-memory store");
        return Arc::new(MemoryStore::new());
    };

    let client = match DbClient::connect(connection_string).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            error!("Application cannot start without a valid database connection");
            process::exit(1);
        }
    };

    if let Err(e) = client.migrate().await {
        error!("Failed to prepare database schema: {}", e);
        process::exit(1);
    }

    Arc::new(client)
}
