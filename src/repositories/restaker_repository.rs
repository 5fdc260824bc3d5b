use crate::models::RestakerAggregate;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

pub const COLLECTION: &str = "restakers";

fn collection(db: &Database) -> Collection<RestakerAggregate> {
    db.collection(COLLECTION)
}

pub async fn save_restaker(
    db: &Database,
    restaker: &RestakerAggregate,
) -> Result<(), mongodb::error::Error> {
    collection(db)
        .replace_one(doc! { "userAddress": &restaker.user_address }, restaker)
        .upsert(true)
        .await?;
    Ok(())
}

pub async fn create_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let collection = collection(db);
    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "userAddress": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;
    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "targetAVSOperatorAddress": 1 })
                .build(),
        )
        .await?;
    Ok(())
}
