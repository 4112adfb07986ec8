pub mod dataflow;
pub mod error;
pub mod operator;
pub mod runtime;
