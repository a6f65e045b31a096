pub mod connectors;
pub mod dom;
pub mod error;
pub mod fetchers;
pub mod logging;
pub mod querier;
pub mod reconcile;
pub mod storage;
pub mod textutil;
pub mod timeutil;
pub mod types;
