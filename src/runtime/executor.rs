use crate::dataflow::edge::PhysicalEdge;
use crate::error::{AttemptError, NodeFailure};
use crate::operator::{Operator, OperatorContext};
use crate::runtime::config::NodeConfig;
use crate::runtime::node::NodeIdentifier;
use crate::runtime::status::{ExecutionStatus, StatusCell};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 节点执行器
///
/// Runs one DAG node: stages incoming edges, drives the operator, flushes
/// outgoing edges, and retries the whole sequence up to
/// `num_retry_at_error` extra times. Failures never escape `execute`; they
/// end up in the execution status and [`NodeExecutor::failure`].
///
/// A retried attempt restarts from the port reset. Edge effects of a failed
/// attempt are not rolled back, so edges see at-least-once reads and flushes.
#[derive(Debug)]
pub struct NodeExecutor {
    node_identifier: NodeIdentifier,
    node_config: NodeConfig,
    operator: Box<dyn Operator>,
    incoming_edges: Vec<Arc<dyn PhysicalEdge>>,
    outgoing_edges: Vec<Arc<dyn PhysicalEdge>>,
    status: StatusCell,
    failure: Option<NodeFailure>,
    run_id: Uuid,
}

impl NodeExecutor {
    pub fn new(
        node_identifier: Option<NodeIdentifier>,
        node_config: NodeConfig,
        operator: Box<dyn Operator>,
    ) -> Self {
        Self {
            node_identifier: NodeIdentifier::ensure(node_identifier),
            node_config,
            operator,
            incoming_edges: Vec::new(),
            outgoing_edges: Vec::new(),
            status: StatusCell::new(),
            failure: None,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn with_edges(
        mut self,
        incoming: Vec<Arc<dyn PhysicalEdge>>,
        outgoing: Vec<Arc<dyn PhysicalEdge>>,
    ) -> Self {
        self.incoming_edges = incoming;
        self.outgoing_edges = outgoing;
        self
    }

    pub fn add_incoming_edge(&mut self, edge: Arc<dyn PhysicalEdge>) {
        self.incoming_edges.push(edge);
    }

    pub fn add_outgoing_edge(&mut self, edge: Arc<dyn PhysicalEdge>) {
        self.outgoing_edges.push(edge);
    }

    pub fn node_identifier(&self) -> &NodeIdentifier {
        &self.node_identifier
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn execution_status(&self) -> ExecutionStatus {
        self.status.get()
    }

    /// Terminal cause of a `Failed` run.
    pub fn failure(&self) -> Option<&NodeFailure> {
        self.failure.as_ref()
    }

    /// Status feed for observers on other tasks.
    pub fn subscribe(&self) -> watch::Receiver<ExecutionStatus> {
        self.status.subscribe()
    }

    /// Runs the node to a terminal status and returns its identifier.
    ///
    /// The return value says nothing about the outcome; read
    /// [`NodeExecutor::execution_status`] afterwards. A run is one-shot:
    /// calling this again after it finished does nothing.
    pub async fn execute(&mut self) -> NodeIdentifier {
        if self.status.get().is_terminal() {
            warn!(
                node = %self.node_identifier,
                status = %self.status.get(),
                "Node run already finished, not executing again"
            );
            return self.node_identifier.clone();
        }

        if let Err(failure) = self.check_identifier() {
            error!(node = %self.node_identifier, "Node cannot start: {}", failure);
            self.set_failure(failure);
            return self.node_identifier.clone();
        }

        let num_retry = self.node_config.num_retry_at_error();
        info!(
            node = %self.node_identifier,
            run_id = %self.run_id,
            max_attempts = u64::from(num_retry) + 1,
            "Node started"
        );

        for attempt in 0..=num_retry {
            match self.guarded_attempt(attempt).await {
                Ok(()) => {
                    debug!(node = %self.node_identifier, attempt, "Attempt succeeded");
                    break;
                }
                Err(e) if attempt == num_retry => {
                    error!(
                        node = %self.node_identifier,
                        attempt,
                        error = ?e,
                        "Attempt failed, no retries left"
                    );
                    self.set_failure(NodeFailure::RetriesExhausted {
                        attempts: u64::from(attempt) + 1,
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(
                        node = %self.node_identifier,
                        attempt,
                        error = ?e,
                        "Attempt failed, retrying"
                    );
                }
            }
        }

        if self.status.get() == ExecutionStatus::Running {
            self.status.finish(ExecutionStatus::Success);
            info!(node = %self.node_identifier, run_id = %self.run_id, "Node succeeded");
        }

        self.node_identifier.clone()
    }

    fn check_identifier(&self) -> Result<(), NodeFailure> {
        if self.node_identifier.name().trim().is_empty() {
            return Err(NodeFailure::InvalidIdentifier(self.node_identifier.clone()));
        }
        Ok(())
    }

    /// Runs one attempt, turning a panic anywhere inside it into an attempt
    /// failure so the run still reaches a terminal status.
    async fn guarded_attempt(&mut self, attempt: u32) -> Result<(), AttemptError> {
        match AssertUnwindSafe(self.run_attempt(attempt)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let msg = if let Some(s) = payload.downcast_ref::<String>() {
                    s.clone()
                } else if let Some(s) = payload.downcast_ref::<&str>() {
                    (*s).to_string()
                } else {
                    "unknown panic payload".to_string()
                };
                Err(AttemptError::Panicked(msg))
            }
        }
    }

    /// One full pass: ports, reads, initialize, run, flushes. Steps run
    /// strictly in order and the first error aborts the attempt.
    async fn run_attempt(&mut self, attempt: u32) -> Result<(), AttemptError> {
        // 1. Fresh local ports
        self.operator.initial_input_ports().await.map_err(AttemptError::PortInit)?;
        self.operator.initial_output_ports().await.map_err(AttemptError::PortInit)?;

        // 2. Stage upstream data
        for edge in &self.incoming_edges {
            edge.init_read().await.map_err(|source| AttemptError::EdgeRead {
                edge: edge.name().to_string(),
                source,
            })?;
        }

        // 3. Initialize
        let operator_config = self.node_config.to_operator_config()?;
        self.operator
            .initialize(&operator_config)
            .await
            .map_err(AttemptError::OperatorInitialize)?;

        // 4. Run
        let ctx = OperatorContext::new(self.node_identifier.clone(), attempt, self.run_id);
        self.operator.run(&ctx).await.map_err(AttemptError::OperatorRun)?;

        // 5. Publish downstream, possibly to a remote store
        for edge in &self.outgoing_edges {
            edge.flush().await.map_err(|source| AttemptError::EdgeFlush {
                edge: edge.name().to_string(),
                source,
            })?;
        }

        Ok(())
    }

    fn set_failure(&mut self, failure: NodeFailure) {
        if self.status.finish(ExecutionStatus::Failed) {
            self.failure = Some(failure);
        }
    }
}
