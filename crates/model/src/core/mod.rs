pub mod params;
pub mod value;
