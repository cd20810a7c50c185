pub mod qa;
pub mod staging;
