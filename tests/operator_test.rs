use noderun::dataflow::port::NodePorts;
use noderun::error::AttemptError;
use noderun::operator::builtin::ExprOperator;
use noderun::operator::registry::OperatorRegistry;
use noderun::operator::{Operator, OperatorContext};
use noderun::runtime::config::NodeConfig;
use noderun::runtime::executor::NodeExecutor;
use noderun::runtime::node::NodeIdentifier;
use noderun::runtime::status::ExecutionStatus;
use serde_json::json;
use uuid::Uuid;

fn ctx() -> OperatorContext {
    OperatorContext::new(NodeIdentifier::from("op-test"), 0, Uuid::new_v4())
}

#[tokio::test]
async fn test_expr_filter_keeps_matching_records() {
    let ports = NodePorts::new();
    let mut op = ExprOperator::new(ports.clone());
    let config = NodeConfig::new(0)
        .param("expression", "score > 10 && name != \"skip\"")
        .param("filter", true)
        .to_operator_config()
        .unwrap();

    op.initial_input_ports().await.unwrap();
    op.initial_output_ports().await.unwrap();
    ports
        .input
        .extend(vec![
            json!({"name": "a", "score": 20}),
            json!({"name": "b", "score": 5}),
            json!({"name": "skip", "score": 50}),
        ])
        .await;
    op.initialize(&config).await.unwrap();
    op.run(&ctx()).await.unwrap();

    assert_eq!(ports.output.snapshot().await, vec![json!({"name": "a", "score": 20})]);
}

#[tokio::test]
async fn test_expr_writes_default_result_field() {
    let ports = NodePorts::new();
    let mut op = ExprOperator::new(ports.clone());
    let config = NodeConfig::new(0)
        .param("expression", "price * qty")
        .to_operator_config()
        .unwrap();

    ports.input.extend(vec![json!({"price": 2.5, "qty": 4})]).await;
    op.initialize(&config).await.unwrap();
    op.run(&ctx()).await.unwrap();

    assert_eq!(
        ports.output.snapshot().await,
        vec![json!({"price": 2.5, "qty": 4, "result": 10.0})]
    );
}

#[tokio::test]
async fn test_expr_without_expression_fails_initialize() {
    let registry = OperatorRegistry::with_builtins();
    let operator = registry.create("expr", NodePorts::new()).unwrap();
    let mut exec = NodeExecutor::new(Some("no_expr".into()), NodeConfig::new(1).operator("expr"), operator);

    exec.execute().await;

    assert_eq!(exec.execution_status(), ExecutionStatus::Failed);
    match exec.failure().and_then(|f| f.attempt_error()) {
        Some(AttemptError::OperatorInitialize(e)) => assert_eq!(e.to_string(), "Missing expression"),
        other => panic!("unexpected attempt error: {:?}", other),
    }
}

#[tokio::test]
async fn test_non_boolean_filter_is_an_error() {
    let ports = NodePorts::new();
    let mut op = ExprOperator::new(ports.clone());
    let config = NodeConfig::new(0)
        .param("expression", "x + 1")
        .param("filter", true)
        .to_operator_config()
        .unwrap();

    ports.input.extend(vec![json!({"x": 1})]).await;
    op.initialize(&config).await.unwrap();
    assert!(op.run(&ctx()).await.is_err());
}

#[test]
fn test_registry_rejects_unknown_kind() {
    let registry = OperatorRegistry::with_builtins();
    assert!(registry.contains("log"));
    assert!(registry.contains("expr"));

    let err = registry.create("http", NodePorts::new()).unwrap_err();
    assert_eq!(err.to_string(), "Operator definition not found: http");
}
