pub mod text;
pub mod throttle;
