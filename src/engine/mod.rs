//! Core engine: the fetch → classify → select → summarize cycle.

pub mod classifier;
pub mod fetcher;
pub mod reporter;
pub mod selector;
pub mod tracker;
