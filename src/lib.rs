pub mod ai_provider;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod generator;
pub mod pipeline;
pub mod report;
