use noderun::dataflow::edge::PhysicalEdge;
use noderun::dataflow::port::{InputPort, OutputPort};
use noderun::dataflow::redis_edge::RedisEdge;
use redis::Client;
use serde_json::json;

fn get_redis_client() -> Client {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/6".to_string());
    redis::Client::open(url).expect("Invalid Redis URL")
}

#[tokio::test]
#[ignore] // Needs a running Redis
async fn test_redis_edge_flush_replaces_and_read_stages() {
    let client = get_redis_client();
    let upstream = OutputPort::new();
    let downstream = InputPort::new();
    let edge = RedisEdge::new("redis-test-edge", client.clone(), &upstream, &downstream);

    upstream.write(json!({"stale": true})).await;
    edge.flush().await.expect("first flush");

    upstream.reset().await;
    upstream.write_all(vec![json!({"id": 1}), json!({"id": 2})]).await;
    edge.flush().await.expect("second flush");

    edge.init_read().await.expect("read");
    assert_eq!(downstream.read_all().await, vec![json!({"id": 1}), json!({"id": 2})]);

    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    let _: () = redis::cmd("DEL").arg(edge.list_key()).query_async(&mut conn).await.unwrap();
}
