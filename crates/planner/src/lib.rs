pub mod compiler;
pub mod error;
pub mod query;
pub mod safety;
