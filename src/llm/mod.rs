pub mod capability;
pub mod client;
pub mod limiter;
