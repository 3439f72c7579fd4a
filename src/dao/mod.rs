/// Word catalog loading and the content repository contract.
pub mod catalog;
/// Serialized catalog entities.
pub mod models;
/// Storage error types shared by the stores.
pub mod storage;
/// Key/value persistence for the reward counter.
pub mod store;
