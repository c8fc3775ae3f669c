//! Metadata rows describing a queryable model.

pub mod model;
pub mod rows;
