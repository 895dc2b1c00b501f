pub mod aggregator;
pub mod context;
pub mod duplication;
pub mod ideation;
pub mod invoker;
pub mod orchestrator;
pub mod outlet;
pub mod stages;
pub mod state;
pub mod workflow;
