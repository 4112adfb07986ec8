use crate::dataflow::port::{InputPort, OutputPort};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use tokio::sync::Mutex;

/// 物理边：连接上游节点的输出端口与下游节点的输入端口
///
/// An edge is shared (`Arc`) by its producer and its consumer. The scheduler
/// guarantees the producer's `flush` completes before the consumer's
/// `init_read`; edges do not order the two themselves.
#[async_trait]
pub trait PhysicalEdge: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Stages upstream records into the consumer's input port.
    async fn init_read(&self) -> Result<()>;

    /// Publishes the producer's output port downstream.
    async fn flush(&self) -> Result<()>;
}

/// In-process edge. `flush` replaces the buffered records with a snapshot of
/// the output port, so a retried producer never duplicates records.
/// `init_read` copies the buffer and leaves it in place for consumer retries.
#[derive(Debug)]
pub struct LocalEdge {
    name: String,
    source: OutputPort,
    sink: InputPort,
    buffer: Mutex<Vec<Value>>,
}

impl LocalEdge {
    pub fn new(name: &str, source: &OutputPort, sink: &InputPort) -> Self {
        Self {
            name: name.to_string(),
            source: source.clone(),
            sink: sink.clone(),
            buffer: Mutex::new(Vec::new()),
        }
    }

    /// Records currently published on this edge.
    pub async fn buffered(&self) -> Vec<Value> {
        self.buffer.lock().await.clone()
    }
}

#[async_trait]
impl PhysicalEdge for LocalEdge {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init_read(&self) -> Result<()> {
        let records = self.buffer.lock().await.clone();
        self.sink.extend(records).await;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let snapshot = self.source.snapshot().await;
        *self.buffer.lock().await = snapshot;
        Ok(())
    }
}
