use std::sync::Arc;
use backend::{
    build_rocket,
    config::AppConfig,
    pg_queue::PgVoteQueue,
    processor::{spawn_workers, VoteProcessor, WorkerSettings},
    queries::{PgCandidateStore, PgVoteStore},
    queue::VoteQueue,
    routes::AppState,
    store::{CandidateStore, VoteStore},
};
use futures::future::join_all;
use rocket::fairing::AdHoc;
use shuttle_runtime::CustomError;
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{error, info};

#[shuttle_runtime::main]
async fn rocket(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secret_store: shuttle_runtime::SecretStore,
) -> shuttle_rocket::ShuttleRocket {
    info!("🚀 Starting vote tally server");

    let config = AppConfig::load(|key| secret_store.get(key)).map_err(CustomError::new)?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(CustomError::new)?;

    info!("📋 Migrations complete");

    let candidates: Arc<dyn CandidateStore> = Arc::new(PgCandidateStore::new(pool.clone()));
    let votes: Arc<dyn VoteStore> = Arc::new(PgVoteStore::new(pool.clone()));
    let queue: Arc<dyn VoteQueue> = Arc::new(PgVoteQueue::new(pool, config.visibility_timeout));

    let processor = Arc::new(VoteProcessor::new(
        Arc::clone(&candidates),
        Arc::clone(&votes),
        Arc::clone(&queue),
        WorkerSettings::from(&config),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let workers = spawn_workers(processor, config.worker_count, shutdown_rx);
    info!("🗳️ {} vote processors running", workers.len());

    let state = AppState::new(candidates, votes, queue, &config);
    let rocket = build_rocket(state, &config).attach(AdHoc::on_shutdown(
        "Stop vote processors",
        |_| Box::pin(async move {
            let _ = shutdown_tx.send(true);
            for result in join_all(workers).await {
                if let Err(e) = result {
                    error!("Vote processor ended abnormally: {}", e);
                }
            }
            info!("🛑 Vote processors stopped");
        }),
    ));

    Ok(rocket.into())
}
