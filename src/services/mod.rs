pub mod dispatcher;
pub mod qa;
pub mod session;
pub mod staging;
