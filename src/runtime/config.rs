use crate::error::ConfigError;
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;

/// 节点配置 (由 DAG 定义持有，执行器只读)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Extra attempts after the first one. 0 means a single attempt.
    #[serde(default)]
    pub num_retry_at_error: u32,
    /// Operator kind, resolved through the operator registry.
    #[serde(default)]
    pub operator: Option<String>,
    /// Operator-facing parameters, passed through as an `OperatorConfig`.
    #[serde(default)]
    pub params: Value,
}

impl NodeConfig {
    pub fn new(num_retry_at_error: u32) -> Self {
        Self {
            num_retry_at_error,
            ..Self::default()
        }
    }

    pub fn operator(mut self, kind: &str) -> Self {
        self.operator = Some(kind.to_string());
        self
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        if !self.params.is_object() {
            self.params = Value::Object(Map::new());
        }
        if let Some(obj) = self.params.as_object_mut() {
            obj.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn num_retry_at_error(&self) -> u32 {
        self.num_retry_at_error
    }

    /// Builds the operator-scoped view of this config. Pure; every param is
    /// carried over.
    pub fn to_operator_config(&self) -> Result<OperatorConfig, ConfigError> {
        let params = match &self.params {
            Value::Null => Map::new(),
            Value::Object(obj) => obj.clone(),
            Value::Bool(_) => return Err(ConfigError::ParamsNotMapping("a boolean")),
            Value::Number(_) => return Err(ConfigError::ParamsNotMapping("a number")),
            Value::String(_) => return Err(ConfigError::ParamsNotMapping("a string")),
            Value::Array(_) => return Err(ConfigError::ParamsNotMapping("a sequence")),
        };
        Ok(OperatorConfig { params })
    }
}

/// Configuration handed to `Operator::initialize`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorConfig {
    params: Map<String, Value>,
}

impl OperatorConfig {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(|v| v.as_bool())
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }
}

pub fn load_node_config_from_yaml(file_path: &str) -> Result<NodeConfig> {
    let yaml_content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read YAML file from {}", file_path))?;

    let config: NodeConfig = serde_yaml::from_str(&yaml_content)
        .with_context(|| format!("Failed to deserialize node config from {}", file_path))?;

    Ok(config)
}
