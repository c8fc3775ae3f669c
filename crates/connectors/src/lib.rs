pub mod adapter;
pub mod error;
pub mod introspect;
pub mod sql;
