pub mod config;
pub mod executor;
pub mod node;
pub mod status;
