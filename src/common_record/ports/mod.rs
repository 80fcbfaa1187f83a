//! Port contracts for the shared common-record relation.

mod store;

pub use store::{CommonRecordStore, CommonRecordStoreError, CommonRecordStoreResult};
