pub mod analysis;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod scans;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod views;
