use crate::dataflow::edge::PhysicalEdge;
use crate::dataflow::port::{InputPort, OutputPort};
use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;

/// Edge whose records live in a Redis list (one JSON string per record).
///
/// Same replace-on-flush semantics as `LocalEdge`; the delete and the push
/// run in one MULTI block.
#[derive(Debug)]
pub struct RedisEdge {
    name: String,
    client: redis::Client,
    list_key: String,
    source: OutputPort,
    sink: InputPort,
}

impl RedisEdge {
    pub fn new(name: &str, client: redis::Client, source: &OutputPort, sink: &InputPort) -> Self {
        Self {
            name: name.to_string(),
            list_key: format!("noderun:edge:{}", name),
            client,
            source: source.clone(),
            sink: sink.clone(),
        }
    }

    pub fn list_key(&self) -> &str {
        &self.list_key
    }
}

#[async_trait]
impl PhysicalEdge for RedisEdge {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init_read(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Vec<String> = conn.lrange(&self.list_key, 0, -1).await?;

        let mut records = Vec::with_capacity(raw.len());
        for item in raw {
            let record: Value = serde_json::from_str(&item)?;
            records.push(record);
        }
        self.sink.extend(records).await;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let snapshot = self.source.snapshot().await;
        let mut items = Vec::with_capacity(snapshot.len());
        for record in &snapshot {
            items.push(serde_json::to_string(record)?);
        }

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic().del(&self.list_key).ignore();
        // RPUSH rejects an empty argument list
        if !items.is_empty() {
            pipe.rpush(&self.list_key, items).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }
}
