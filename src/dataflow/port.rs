use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared record buffer behind a port. Cloning a port clones the handle, so
/// an operator and the edges wired to it see the same records.
type Buffer = Arc<Mutex<Vec<Value>>>;

/// Local input side of a node. Incoming edges stage upstream records here.
#[derive(Debug, Clone, Default)]
pub struct InputPort {
    records: Buffer,
}

impl InputPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reset(&self) {
        self.records.lock().await.clear();
    }

    pub async fn extend(&self, records: Vec<Value>) {
        self.records.lock().await.extend(records);
    }

    pub async fn read_all(&self) -> Vec<Value> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

/// Local output side of a node. Outgoing edges flush from here.
#[derive(Debug, Clone, Default)]
pub struct OutputPort {
    records: Buffer,
}

impl OutputPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reset(&self) {
        self.records.lock().await.clear();
    }

    pub async fn write(&self, record: Value) {
        self.records.lock().await.push(record);
    }

    pub async fn write_all(&self, records: Vec<Value>) {
        self.records.lock().await.extend(records);
    }

    pub async fn snapshot(&self) -> Vec<Value> {
        self.records.lock().await.clone()
    }
}

/// The pair of ports owned by one node. Operators are built around it and
/// edges are wired to its halves.
#[derive(Debug, Clone, Default)]
pub struct NodePorts {
    pub input: InputPort,
    pub output: OutputPort,
}

impl NodePorts {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn clones_share_records() {
        let port = OutputPort::new();
        let handle = port.clone();
        handle.write(json!({"a": 1})).await;
        assert_eq!(port.snapshot().await, vec![json!({"a": 1})]);

        port.reset().await;
        assert!(handle.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn input_reset_clears_staged_records() {
        let port = InputPort::new();
        port.extend(vec![json!(1), json!(2)]).await;
        assert_eq!(port.len().await, 2);
        assert!(!port.is_empty().await);

        port.clone().reset().await;
        assert!(port.is_empty().await);
    }
}
