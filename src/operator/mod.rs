use crate::runtime::config::OperatorConfig;
use crate::runtime::node::NodeIdentifier;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

pub mod builtin;
pub mod registry;

/// Per-attempt context handed to `Operator::run`. Built fresh for every
/// attempt and dropped afterwards.
#[derive(Debug, Clone)]
pub struct OperatorContext {
    pub node_identifier: NodeIdentifier,
    /// Zero-based attempt index within the current run.
    pub attempt: u32,
    /// Identifies the executor run, for log correlation.
    pub run_id: Uuid,
}

impl OperatorContext {
    pub fn new(node_identifier: NodeIdentifier, attempt: u32, run_id: Uuid) -> Self {
        Self {
            node_identifier,
            attempt,
            run_id,
        }
    }
}

/// 插件接口：节点上挂载的计算单元
///
/// The node executor drives every attempt through the same sequence:
/// `initial_input_ports`, `initial_output_ports`, `initialize`, `run`.
/// Resources are released on drop.
#[async_trait]
pub trait Operator: Send + Sync + Debug {
    /// Resets the input port. No records from a previous attempt survive.
    async fn initial_input_ports(&mut self) -> Result<()>;

    /// Resets the output port.
    async fn initial_output_ports(&mut self) -> Result<()>;

    async fn initialize(&mut self, config: &OperatorConfig) -> Result<()>;

    async fn run(&mut self, ctx: &OperatorContext) -> Result<()>;
}
