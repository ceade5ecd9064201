pub mod command_runner;
pub mod config;
pub mod logger;
pub mod validation;
