pub mod columns;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod merge;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod synth;
pub mod table;
