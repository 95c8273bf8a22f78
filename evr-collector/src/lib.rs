pub mod api;
pub mod config;
pub mod ingest;
pub mod registry;
pub mod scratch;
pub mod state;
