//! TIERDRAW: tiered token-holder reward draws.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod indexer;
pub mod engine;
pub mod events;
pub mod storage;
pub mod logging;
