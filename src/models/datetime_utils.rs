//! Serde helpers storing `chrono` timestamps as native BSON dates.

use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson;
use serde::{self, de, Deserialize, Deserializer, Serialize, Serializer};

fn to_bson_datetime(dt: &DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

fn from_bson_datetime<E: de::Error>(dt: bson::DateTime) -> Result<DateTime<Utc>, E> {
    Utc.timestamp_millis_opt(dt.timestamp_millis())
        .single()
        .ok_or_else(|| E::custom("BSON date out of range"))
}

pub fn serialize_datetime<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    to_bson_datetime(dt).serialize(serializer)
}

pub fn deserialize_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    from_bson_datetime(bson::DateTime::deserialize(deserializer)?)
}

pub mod option {
    use super::*;

    pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.as_ref().map(to_bson_datetime).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<bson::DateTime>::deserialize(deserializer)?
            .map(from_bson_datetime)
            .transpose()
    }
}

pub mod vec {
    use super::*;

    pub fn serialize<S>(dts: &[DateTime<Utc>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dts.iter()
            .map(to_bson_datetime)
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<bson::DateTime>::deserialize(deserializer)?
            .into_iter()
            .map(from_bson_datetime)
            .collect()
    }
}
