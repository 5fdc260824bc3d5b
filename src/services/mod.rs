pub mod database;
pub mod paged_fetch;
pub mod pipeline;
pub mod restaker_sync;
pub mod reward_aggregator;
pub mod scheduler;
pub mod subgraph;
pub mod validator_sync;
