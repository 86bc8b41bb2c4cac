//! Statistical-arbitrage pair screening.
//!
//! Candle history in, ranked long/short pair signals out. See
//! [`orchestrator::run`] for the end-to-end entry point.

pub mod candle;
pub mod coint;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod rank;
pub mod reject;
pub mod report;
pub mod scheduler;
pub mod series;
pub mod signal;
pub mod spread;
pub mod stats;

#[cfg(test)]
mod testkit;

pub use error::{Result, ScreenError};
