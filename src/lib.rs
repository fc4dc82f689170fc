//! Hybrid lexical + semantic retrieval for a scientific-paper corpus, and the
//! offline harness that scores it.

pub mod config;
pub mod endpoints;
pub mod eval;
pub mod model;
pub mod ranking;
pub mod stats;
pub mod util;
