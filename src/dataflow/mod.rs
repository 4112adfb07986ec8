pub mod edge;
pub mod port;
pub mod redis_edge;
