use noderun::dataflow::edge::{LocalEdge, PhysicalEdge};
use noderun::dataflow::port::{InputPort, NodePorts, OutputPort};
use noderun::operator::registry::OperatorRegistry;
use noderun::runtime::config::NodeConfig;
use noderun::runtime::executor::NodeExecutor;
use noderun::runtime::status::ExecutionStatus;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_two_nodes_connected_by_local_edge() {
    let registry = OperatorRegistry::with_builtins();

    // source -> double -> log -> sink
    let source = OutputPort::new();
    source
        .write_all(vec![json!({"x": 1}), json!({"x": 2}), json!({"x": 3})])
        .await;

    let double_ports = NodePorts::new();
    let log_ports = NodePorts::new();
    let sink = InputPort::new();

    let source_edge = Arc::new(LocalEdge::new("source->double", &source, &double_ports.input));
    let middle_edge = Arc::new(LocalEdge::new("double->log", &double_ports.output, &log_ports.input));
    let sink_edge = Arc::new(LocalEdge::new("log->sink", &log_ports.output, &sink));
    source_edge.flush().await.unwrap();

    let double_config = NodeConfig::new(0)
        .operator("expr")
        .param("expression", "x * 2")
        .param("output", "doubled");
    let mut double = NodeExecutor::new(
        Some("double".into()),
        double_config,
        registry.create("expr", double_ports.clone()).unwrap(),
    );
    double.add_incoming_edge(source_edge);
    double.add_outgoing_edge(middle_edge.clone());

    let mut log = NodeExecutor::new(
        Some("log".into()),
        NodeConfig::new(0).operator("log").param("msg", "doubled:"),
        registry.create("log", log_ports.clone()).unwrap(),
    );
    log.add_incoming_edge(middle_edge);
    log.add_outgoing_edge(sink_edge.clone());

    // Dependency order is the caller's job
    double.execute().await;
    assert_eq!(double.execution_status(), ExecutionStatus::Success);
    log.execute().await;
    assert_eq!(log.execution_status(), ExecutionStatus::Success);

    sink_edge.init_read().await.unwrap();
    assert_eq!(
        sink.read_all().await,
        vec![
            json!({"x": 1, "doubled": 2}),
            json!({"x": 2, "doubled": 4}),
            json!({"x": 3, "doubled": 6}),
        ]
    );
}

#[tokio::test]
async fn test_failed_downstream_does_not_consume_upstream() {
    let registry = OperatorRegistry::with_builtins();

    let source = OutputPort::new();
    source.write_all(vec![json!({"x": 1}), json!("not a mapping")]).await;

    let ports = NodePorts::new();
    let sink = InputPort::new();
    let incoming = Arc::new(LocalEdge::new("in", &source, &ports.input));
    let outgoing = Arc::new(LocalEdge::new("out", &ports.output, &sink));
    incoming.flush().await.unwrap();

    let config = NodeConfig::new(2)
        .operator("expr")
        .param("expression", "x + 1");
    let mut exec = NodeExecutor::new(Some("strict".into()), config, registry.create("expr", ports).unwrap());
    exec.add_incoming_edge(incoming.clone());
    exec.add_outgoing_edge(outgoing.clone());

    exec.execute().await;

    assert_eq!(exec.execution_status(), ExecutionStatus::Failed);
    // Nothing published, and upstream records are still there for a rerun
    assert!(outgoing.buffered().await.is_empty());
    assert_eq!(incoming.buffered().await.len(), 2);
}
