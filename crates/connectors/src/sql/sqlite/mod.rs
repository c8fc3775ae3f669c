pub mod adapter;
pub mod value;
