pub mod connection;
pub mod errors;
