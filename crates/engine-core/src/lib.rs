pub mod assembler;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod registry;
pub mod repository;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;
