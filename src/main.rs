use dotenv::dotenv;
use log::{error, info};
use std::sync::Arc;

use restake_indexer::config::Config;
use restake_indexer::repositories::{AggregateStore, MongoStore};
use restake_indexer::services::database;
use restake_indexer::services::paged_fetch::PageSettings;
use restake_indexer::services::pipeline::{PipelineContext, PipelineSettings, SystemClock};
use restake_indexer::services::scheduler::{RunOutcome, ScheduleSettings, Scheduler};
use restake_indexer::services::subgraph::HttpSubgraphClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    info!("Starting restaking indexer");
    let config = Config::from_env()?;

    let db = database::connect_to_database(&config.mongo_uri, &config.db_name).await?;
    let store = Arc::new(MongoStore::new(db));
    store.ensure_indexes().await?;

    let ctx = PipelineContext {
        source: Arc::new(HttpSubgraphClient::new(config.request_timeout)?),
        store,
        clock: Arc::new(SystemClock),
        settings: PipelineSettings {
            endpoint: config.subgraph_url.clone(),
            paging: PageSettings {
                page_size: config.page_size,
                page_delay: config.page_delay,
            },
            upsert_concurrency: config.upsert_concurrency,
        },
    };
    let scheduler = Arc::new(Scheduler::new(
        ctx,
        ScheduleSettings {
            startup_delay: config.startup_delay,
            interval: config.sync_interval,
        },
    ));

    if config.run_once {
        if let RunOutcome::Completed(report) = scheduler.trigger_now().await {
            if report.failed_syncs() > 0 {
                error!("{} sync(s) failed", report.failed_syncs());
            }
        }
        info!("Processing complete. Data has been saved to MongoDB.");
        return Ok(());
    }

    let handle = Arc::clone(&scheduler).start();
    tokio::signal::ctrl_c().await?;
    info!(
        "Shutting down{}",
        if scheduler.is_running() {
            ", abandoning the run in progress"
        } else {
            ""
        }
    );
    handle.abort();
    Ok(())
}
