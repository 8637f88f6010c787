//! Macrotrack Library
//!
//! Local-first nutrition tracking: foods, logged entries, goals, and the
//! scaling and aggregation that turn them into daily totals.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod remote;
pub mod tools;
