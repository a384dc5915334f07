//! Data models for extracted bills and pipeline configuration.

pub mod bill;
pub mod config;
