//! HTTP API handlers

pub mod error;
pub mod metrics;
pub mod system;
