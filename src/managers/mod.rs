pub mod aggregate;
pub mod dedup;
pub mod fetcher;
pub mod resolver;
pub mod scheduler;
