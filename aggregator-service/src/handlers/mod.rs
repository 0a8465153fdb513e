//! HTTP handlers for the aggregator service.

pub mod completion;
pub mod health;
