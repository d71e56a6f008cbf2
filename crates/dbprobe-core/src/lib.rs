pub mod catalog;
pub mod client;
pub mod config;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod model;
pub mod report;
pub mod stats;
