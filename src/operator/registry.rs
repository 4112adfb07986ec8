use crate::dataflow::port::NodePorts;
use crate::operator::Operator;
use crate::operator::builtin::{ExprDefinition, LogDefinition};
use anyhow::{Result, anyhow};
use std::collections::HashMap;

/// 算子工厂/定义接口
pub trait OperatorDefinition: Send + Sync {
    fn name(&self) -> &str;
    fn prepare(&self, ports: NodePorts) -> Box<dyn Operator>;
}

pub struct OperatorRegistry {
    definitions: HashMap<String, Box<dyn OperatorDefinition>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Registry preloaded with the `log` and `expr` operators.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(LogDefinition));
        registry.register(Box::new(ExprDefinition));
        registry
    }

    pub fn register(&mut self, definition: Box<dyn OperatorDefinition>) {
        self.definitions.insert(definition.name().to_string(), definition);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.definitions.contains_key(kind)
    }

    pub fn create(&self, kind: &str, ports: NodePorts) -> Result<Box<dyn Operator>> {
        let def = self
            .definitions
            .get(kind)
            .ok_or_else(|| anyhow!("Operator definition not found: {}", kind))?;
        Ok(def.prepare(ports))
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
