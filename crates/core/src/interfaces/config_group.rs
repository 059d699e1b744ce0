//! Executor configuration widgets
//!
//! The core never renders these; it asks the factory for declared defaults
//! and hands widget instances to the host for dialog round-tripping. All
//! values must survive a JSON round trip.

use serde_json::{Map, Value};

use crate::types::RunConfigurationMetadata;

/// Configuration values edited through the Run dialog
pub trait ExecutorConfigurationGroup {
    /// Load values into the widget
    fn set_configuration(&mut self, config: Map<String, Value>);

    /// Current values of the widget
    fn get_configuration(&self) -> Map<String, Value>;
}

/// Per-executor, per-triple factory of configuration widgets
pub trait ConfigurationWidgetFactory: Send + Sync {
    /// Defaults used for the synthesized Default parameter set
    fn get_default_configuration(&self) -> Map<String, Value>;

    fn create(
        &self,
        context: &str,
        input_extension: &str,
        metadata: Option<&RunConfigurationMetadata>,
    ) -> Box<dyn ExecutorConfigurationGroup>;
}

/// Plain key/value widget state backed by a JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonConfigurationGroup {
    values: Map<String, Value>,
}

impl JsonConfigurationGroup {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

impl ExecutorConfigurationGroup for JsonConfigurationGroup {
    fn set_configuration(&mut self, config: Map<String, Value>) {
        self.values = config;
    }

    fn get_configuration(&self) -> Map<String, Value> {
        self.values.clone()
    }
}

/// Factory producing [`JsonConfigurationGroup`]s seeded with fixed defaults
#[derive(Debug, Clone, Default)]
pub struct DefaultsFactory {
    defaults: Map<String, Value>,
}

impl DefaultsFactory {
    pub fn new(defaults: Map<String, Value>) -> Self {
        Self { defaults }
    }

    /// Build from a JSON object literal; non-objects give empty defaults
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(defaults) => Self { defaults },
            _ => Self::default(),
        }
    }
}

impl ConfigurationWidgetFactory for DefaultsFactory {
    fn get_default_configuration(&self) -> Map<String, Value> {
        self.defaults.clone()
    }

    fn create(
        &self,
        _context: &str,
        _input_extension: &str,
        _metadata: Option<&RunConfigurationMetadata>,
    ) -> Box<dyn ExecutorConfigurationGroup> {
        Box::new(JsonConfigurationGroup::new(self.defaults.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get_configuration_is_identity() {
        let factory = DefaultsFactory::from_value(json!({"interact": false, "args": ""}));
        let mut widget = factory.create("file", "py", None);
        let before = widget.get_configuration();
        widget.set_configuration(before.clone());
        assert_eq!(widget.get_configuration(), before);
        assert_eq!(before, factory.get_default_configuration());
    }

    #[test]
    fn test_non_object_defaults_are_empty() {
        let factory = DefaultsFactory::from_value(json!([1, 2]));
        assert!(factory.get_default_configuration().is_empty());
    }
}
