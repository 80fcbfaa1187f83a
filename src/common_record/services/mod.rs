//! Application services for the legacy common-record path.

mod ingest;

pub use ingest::{CommonRecordService, CommonRecordServiceError, CommonRecordServiceResult};
