use crate::models::RewardAggregate;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

pub const COLLECTION: &str = "rewards";

fn collection(db: &Database) -> Collection<RewardAggregate> {
    db.collection(COLLECTION)
}

pub async fn save_reward(
    db: &Database,
    reward: &RewardAggregate,
) -> Result<(), mongodb::error::Error> {
    collection(db)
        .replace_one(doc! { "walletAddress": &reward.wallet_address }, reward)
        .upsert(true)
        .await?;
    Ok(())
}

pub async fn create_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let collection = collection(db);
    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "walletAddress": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;
    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "rewardsBreakdown.operatorAddress": 1 })
                .build(),
        )
        .await?;
    Ok(())
}
