//! prop-lines: late line movement analysis for NFL player yardage props
//!
//! This library provides the core components for:
//! - Snapshot model and per-player series grouping
//! - Late movement detection against percent/absolute drop thresholds
//! - Matching movements to actual game results
//! - Live dashboard deltas over lookback windows, with a TTL cache
//! - Chi-square / Wilson correlation analysis and threshold sweeps
//! - JSON stores and Parquet export
//! - Structured logging and Prometheus metrics

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod movement;
pub mod pipeline;
pub mod snapshot;
pub mod telemetry;
