//! Training plan generation, tracking and guided workout sessions.

pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod generator;
pub mod goal;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod profile;
pub mod session;
pub mod store;
pub mod tracker;
pub mod types;
