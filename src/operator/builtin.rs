use crate::dataflow::port::NodePorts;
use crate::operator::registry::OperatorDefinition;
use crate::operator::{Operator, OperatorContext};
use crate::runtime::config::OperatorConfig;
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use evalexpr::{
    ContextWithMutableVariables, DefaultNumericTypes, HashMapContext, Node as EvalNode,
    build_operator_tree,
};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

/// Logs every input record and forwards it unchanged.
#[derive(Debug)]
pub struct LogOperator {
    ports: NodePorts,
    msg: Option<String>,
}

impl LogOperator {
    pub fn new(ports: NodePorts) -> Self {
        Self { ports, msg: None }
    }
}

#[async_trait]
impl Operator for LogOperator {
    async fn initial_input_ports(&mut self) -> Result<()> {
        self.ports.input.reset().await;
        Ok(())
    }

    async fn initial_output_ports(&mut self) -> Result<()> {
        self.ports.output.reset().await;
        Ok(())
    }

    async fn initialize(&mut self, config: &OperatorConfig) -> Result<()> {
        self.msg = config.get_str("msg").map(str::to_string);
        Ok(())
    }

    async fn run(&mut self, ctx: &OperatorContext) -> Result<()> {
        let records = self.ports.input.read_all().await;
        for record in &records {
            match &self.msg {
                Some(msg) => info!(node = %ctx.node_identifier, "[LOG] {} {}", msg, record),
                None => info!(node = %ctx.node_identifier, "[LOG] {}", record),
            }
        }
        self.ports.output.write_all(records).await;
        Ok(())
    }
}

/// Evaluates an expression against each input record.
///
/// Params: `expression` (required), `output` (field receiving the result,
/// defaults to `result`) and `filter`. With `filter: true` the expression
/// must yield a boolean and only matching records are forwarded, unchanged.
#[derive(Debug)]
pub struct ExprOperator {
    ports: NodePorts,
    expression: Option<EvalNode>,
    raw_expr: String,
    output: String,
    filter: bool,
}

impl ExprOperator {
    pub fn new(ports: NodePorts) -> Self {
        Self {
            ports,
            expression: None,
            raw_expr: String::new(),
            output: "result".to_string(),
            filter: false,
        }
    }
}

#[async_trait]
impl Operator for ExprOperator {
    async fn initial_input_ports(&mut self) -> Result<()> {
        self.ports.input.reset().await;
        Ok(())
    }

    async fn initial_output_ports(&mut self) -> Result<()> {
        self.ports.output.reset().await;
        Ok(())
    }

    async fn initialize(&mut self, config: &OperatorConfig) -> Result<()> {
        let raw = config
            .get_str("expression")
            .ok_or_else(|| anyhow!("Missing expression"))?;
        let compiled: EvalNode = build_operator_tree(raw)?;

        self.expression = Some(compiled);
        self.raw_expr = raw.to_string();
        self.output = config.get_str("output").unwrap_or("result").to_string();
        self.filter = config.get_bool("filter").unwrap_or(false);
        Ok(())
    }

    async fn run(&mut self, ctx: &OperatorContext) -> Result<()> {
        let expression = self
            .expression
            .as_ref()
            .ok_or_else(|| anyhow!("expr operator used before initialize"))?;

        let records = self.ports.input.read_all().await;
        debug!(
            node = %ctx.node_identifier,
            count = records.len(),
            expr = %self.raw_expr,
            "Evaluating records"
        );

        for record in records {
            let mut fields = match record {
                Value::Object(fields) => fields,
                other => bail!("expr operator expects mapping records, got {}", other),
            };

            let eval_ctx = to_eval_context(&fields)?;
            let result = expression.eval_with_context(&eval_ctx)?;

            if self.filter {
                match result {
                    evalexpr::Value::Boolean(true) => {
                        self.ports.output.write(Value::Object(fields)).await;
                    }
                    evalexpr::Value::Boolean(false) => {}
                    other => bail!("Filter '{}' yielded non-boolean {:?}", self.raw_expr, other),
                }
            } else {
                let json_val = from_eval_value(result).ok_or_else(|| {
                    anyhow!("Expression '{}' yielded an unsupported value", self.raw_expr)
                })?;
                fields.insert(self.output.clone(), json_val);
                self.ports.output.write(Value::Object(fields)).await;
            }
        }
        Ok(())
    }
}

fn to_eval_context(fields: &Map<String, Value>) -> Result<HashMapContext<DefaultNumericTypes>> {
    let mut eval_ctx = HashMapContext::<DefaultNumericTypes>::new();
    for (k, v) in fields {
        let ev = match v {
            Value::String(s) => Some(evalexpr::Value::String(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(evalexpr::Value::Int(i))
                } else {
                    n.as_f64().map(evalexpr::Value::Float)
                }
            }
            Value::Bool(b) => Some(evalexpr::Value::Boolean(*b)),
            _ => None,
        };
        if let Some(ev) = ev {
            eval_ctx.set_value(k.clone(), ev)?;
        }
    }
    Ok(eval_ctx)
}

fn from_eval_value(value: evalexpr::Value) -> Option<Value> {
    match value {
        evalexpr::Value::String(s) => Some(Value::String(s)),
        evalexpr::Value::Int(i) => Some(json!(i)),
        evalexpr::Value::Float(f) => Some(json!(f)),
        evalexpr::Value::Boolean(b) => Some(Value::Bool(b)),
        evalexpr::Value::Empty => Some(Value::Null),
        _ => None,
    }
}

pub struct LogDefinition;

impl OperatorDefinition for LogDefinition {
    fn name(&self) -> &str {
        "log"
    }

    fn prepare(&self, ports: NodePorts) -> Box<dyn Operator> {
        Box::new(LogOperator::new(ports))
    }
}

pub struct ExprDefinition;

impl OperatorDefinition for ExprDefinition {
    fn name(&self) -> &str {
        "expr"
    }

    fn prepare(&self, ports: NodePorts) -> Box<dyn Operator> {
        Box::new(ExprOperator::new(ports))
    }
}
