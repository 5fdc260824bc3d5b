use crate::models::ValidatorAggregate;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

pub const COLLECTION: &str = "validators";

fn collection(db: &Database) -> Collection<ValidatorAggregate> {
    db.collection(COLLECTION)
}

pub async fn save_validator(
    db: &Database,
    validator: &ValidatorAggregate,
) -> Result<(), mongodb::error::Error> {
    collection(db)
        .replace_one(
            doc! { "operatorAddress": &validator.operator_address },
            validator,
        )
        .upsert(true)
        .await?;
    Ok(())
}

pub async fn get_validator(
    db: &Database,
    operator_address: &str,
) -> Result<Option<ValidatorAggregate>, mongodb::error::Error> {
    collection(db)
        .find_one(doc! { "operatorAddress": operator_address })
        .await
}

pub async fn create_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let collection = collection(db);
    collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "operatorAddress": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;
    collection
        .create_index(IndexModel::builder().keys(doc! { "status": 1 }).build())
        .await?;
    Ok(())
}
