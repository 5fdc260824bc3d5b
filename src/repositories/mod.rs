pub mod restaker_repository;
pub mod reward_repository;
pub mod validator_repository;

use crate::models::{RestakerAggregate, RewardAggregate, ValidatorAggregate};
use async_trait::async_trait;
use log::info;
use mongodb::Database;

/// Keyed, upsert-only persistence for the three aggregates.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Inserts or replaces the restaker keyed by `user_address`.
    async fn upsert_restaker(&self, restaker: &RestakerAggregate) -> mongodb::error::Result<()>;

    /// Inserts or replaces the validator keyed by `operator_address`.
    async fn upsert_validator(&self, validator: &ValidatorAggregate) -> mongodb::error::Result<()>;

    /// Inserts or replaces the reward document keyed by `wallet_address`.
    async fn upsert_reward(&self, reward: &RewardAggregate) -> mongodb::error::Result<()>;

    async fn find_validator(
        &self,
        operator_address: &str,
    ) -> mongodb::error::Result<Option<ValidatorAggregate>>;

    /// Creates the unique key indexes. Safe to call on every start-up.
    async fn ensure_indexes(&self) -> mongodb::error::Result<()>;
}

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AggregateStore for MongoStore {
    async fn upsert_restaker(&self, restaker: &RestakerAggregate) -> mongodb::error::Result<()> {
        restaker_repository::save_restaker(&self.db, restaker).await
    }

    async fn upsert_validator(&self, validator: &ValidatorAggregate) -> mongodb::error::Result<()> {
        validator_repository::save_validator(&self.db, validator).await
    }

    async fn upsert_reward(&self, reward: &RewardAggregate) -> mongodb::error::Result<()> {
        reward_repository::save_reward(&self.db, reward).await
    }

    async fn find_validator(
        &self,
        operator_address: &str,
    ) -> mongodb::error::Result<Option<ValidatorAggregate>> {
        validator_repository::get_validator(&self.db, operator_address).await
    }

    async fn ensure_indexes(&self) -> mongodb::error::Result<()> {
        restaker_repository::create_indexes(&self.db).await?;
        validator_repository::create_indexes(&self.db).await?;
        reward_repository::create_indexes(&self.db).await?;
        info!(
            "Indexes ensured on {}, {} and {}",
            restaker_repository::COLLECTION,
            validator_repository::COLLECTION,
            reward_repository::COLLECTION
        );
        Ok(())
    }
}
