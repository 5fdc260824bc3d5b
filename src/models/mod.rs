pub mod amount;
pub mod datetime_utils;
mod restaker;
mod reward;
pub mod source_records;
mod validator;

pub use amount::Wei;
pub use restaker::{RestakerAggregate, RestakerStatus};
pub use reward::{RewardAggregate, RewardBreakdown};
pub use validator::{SlashEvent, ValidatorAggregate, ValidatorMetadata, ValidatorStatus};
