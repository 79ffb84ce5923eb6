pub mod annotation;
pub mod app;
pub mod atlas;
pub mod config;
pub mod demo;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod merge;
pub mod metrics;
pub mod output;
pub mod resolver;
pub mod serde_util;
pub mod store;
