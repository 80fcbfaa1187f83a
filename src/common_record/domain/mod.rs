//! Domain model for legacy common records.

mod error;
mod record;

pub use error::CommonRecordDomainError;
pub use record::{CommonRecord, CommonToolName, NewCommonRecord, Sensitivity};
