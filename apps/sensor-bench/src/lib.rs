pub mod cli;
pub mod config;
pub mod logging;
pub mod pool;
pub mod report;
pub mod risk;
pub mod telemetry;
