//! Plugin object: identity, semantic types and typed actions
//!
//! Actions declare their inputs, parameters and outputs up front so a host
//! can render a signature without running anything. [`Action::invoke`]
//! checks arguments against that signature, fills in defaults, and only
//! then calls the implementation.

pub mod registry;

use crate::error::{Result, StatsError};
use crate::table::{Distribution, StatsTable};
use crate::types::TypeRegistry;
use q2_stats_manifest::{ActionMetadata, ParameterMetadata, PluginEntry, SlotMetadata};
use serde_json::Value;
use std::collections::BTreeMap;

/// Implementation behind an action, called with validated arguments.
pub type ActionFn = fn(&ActionArgs) -> Result<StatsTable>;

#[derive(Debug, Clone)]
pub struct InputSpec {
    pub name: &'static str,
    pub semantic_type: &'static str,
    pub optional: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub name: &'static str,
    pub semantic_type: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone)]
pub enum ParameterKind {
    Str,
    Bool,
    /// A string restricted to `choices`; `invalid` builds the error for
    /// any other value.
    Choice {
        choices: &'static [&'static str],
        invalid: fn(String) -> StatsError,
    },
}

#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParameterKind,
    /// `None` marks the parameter as required; `Some(Value::Null)` as
    /// optional without a value.
    pub default: Option<Value>,
    pub description: &'static str,
}

impl ParameterSpec {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub fn annotation(&self) -> String {
        match &self.kind {
            ParameterKind::Str => "Str".to_string(),
            ParameterKind::Bool => "Bool".to_string(),
            ParameterKind::Choice { choices, .. } => {
                let quoted: Vec<String> = choices.iter().map(|c| format!("'{}'", c)).collect();
                format!("Str % Choices({})", quoted.join(", "))
            }
        }
    }

    fn check(&self, value: &Value) -> Result<()> {
        let invalid = |message: &str| StatsError::InvalidParameter {
            name: self.name.to_string(),
            message: message.to_string(),
        };

        if value.is_null() {
            return match self.default {
                Some(Value::Null) => Ok(()),
                _ => Err(invalid("a value is required")),
            };
        }

        match (&self.kind, value) {
            (ParameterKind::Str, Value::String(_)) => Ok(()),
            (ParameterKind::Bool, Value::Bool(_)) => Ok(()),
            (ParameterKind::Choice { choices, invalid: on_invalid }, Value::String(s)) => {
                if choices.iter().any(|c| *c == s.as_str()) {
                    Ok(())
                } else {
                    Err(on_invalid(s.clone()))
                }
            }
            (ParameterKind::Bool, _) => Err(invalid("expected a boolean")),
            _ => Err(invalid("expected a string")),
        }
    }
}

/// Arguments for one action call: named input tables and JSON parameters.
#[derive(Debug, Clone, Default)]
pub struct ActionArgs {
    pub inputs: BTreeMap<String, Distribution>,
    pub parameters: BTreeMap<String, Value>,
}

impl ActionArgs {
    pub fn new() -> Self {
        ActionArgs::default()
    }

    pub fn with_input(mut self, name: &str, distribution: Distribution) -> Self {
        self.inputs.insert(name.to_string(), distribution);
        self
    }

    pub fn with_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn input(&self, name: &str) -> Result<&Distribution> {
        self.inputs
            .get(name)
            .ok_or_else(|| StatsError::MissingInput(name.to_string()))
    }

    pub fn optional_input(&self, name: &str) -> Option<&Distribution> {
        self.inputs.get(name)
    }

    /// String parameter, `None` when absent or null.
    pub fn str_param(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(Value::as_str)
    }

    pub fn required_str(&self, name: &str) -> Result<&str> {
        self.str_param(name)
            .ok_or_else(|| StatsError::InvalidParameter {
                name: name.to_string(),
                message: "a value is required".to_string(),
            })
    }

    pub fn bool_param(&self, name: &str) -> bool {
        self.parameters
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct Action {
    /// Identifier used to call the action, e.g. `mann_whitney_u`
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    pub description: &'static str,
    pub inputs: Vec<InputSpec>,
    pub parameters: Vec<ParameterSpec>,
    pub outputs: Vec<OutputSpec>,
    pub callable: ActionFn,
}

impl Action {
    /// Validate `args` against the signature and run the action.
    pub fn invoke(&self, mut args: ActionArgs) -> Result<StatsTable> {
        for input in &self.inputs {
            if !input.optional && !args.inputs.contains_key(input.name) {
                return Err(StatsError::MissingInput(input.name.to_string()));
            }
        }
        if let Some(name) = args
            .inputs
            .keys()
            .find(|name| !self.inputs.iter().any(|i| i.name == name.as_str()))
        {
            return Err(StatsError::InvalidParameter {
                name: name.clone(),
                message: format!("'{}' is not an input of {}", name, self.id),
            });
        }
        if let Some(name) = args
            .parameters
            .keys()
            .find(|name| !self.parameters.iter().any(|p| p.name == name.as_str()))
        {
            return Err(StatsError::InvalidParameter {
                name: name.clone(),
                message: format!("'{}' is not a parameter of {}", name, self.id),
            });
        }

        for spec in &self.parameters {
            let value = match args.parameters.get(spec.name) {
                Some(v) if !v.is_null() => v.clone(),
                _ => spec.default.clone().unwrap_or(Value::Null),
            };
            spec.check(&value)?;
            args.parameters.insert(spec.name.to_string(), value);
        }

        tracing::info!(action = self.id, "running {}", self.name);
        (self.callable)(&args)
    }

    pub fn metadata(&self) -> ActionMetadata {
        let text = |s: &str| (!s.is_empty()).then(|| s.to_string());
        ActionMetadata {
            name: self.name.to_string(),
            description: text(self.description),
            inputs: self
                .inputs
                .iter()
                .map(|i| SlotMetadata {
                    name: i.name.to_string(),
                    semantic_type: i.semantic_type.to_string(),
                    optional: i.optional,
                    description: text(i.description),
                })
                .collect(),
            parameters: self
                .parameters
                .iter()
                .map(|p| ParameterMetadata {
                    name: p.name.to_string(),
                    annotation: p.annotation(),
                    default: p.default.as_ref().map(Value::to_string),
                    is_required: p.is_required(),
                    choices: match &p.kind {
                        ParameterKind::Choice { choices, .. } => {
                            choices.iter().map(|c| c.to_string()).collect()
                        }
                        _ => Vec::new(),
                    },
                    description: text(p.description),
                })
                .collect(),
            outputs: self
                .outputs
                .iter()
                .map(|o| SlotMetadata {
                    name: o.name.to_string(),
                    semantic_type: o.semantic_type.to_string(),
                    optional: false,
                    description: text(o.description),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Plugin {
    pub name: String,
    pub version: String,
    pub website: String,
    pub package: String,
    pub description: String,
    pub short_description: String,
    pub types: TypeRegistry,
    actions: BTreeMap<String, Action>,
}

impl Plugin {
    pub fn new(name: &str, version: &str, package: &str) -> Self {
        Plugin {
            name: name.to_string(),
            version: version.to_string(),
            website: String::new(),
            package: package.to_string(),
            description: String::new(),
            short_description: String::new(),
            types: TypeRegistry::default(),
            actions: BTreeMap::new(),
        }
    }

    /// Add an action after checking that its slot types are known.
    pub fn register_action(&mut self, action: Action) -> Result<()> {
        let slot_types = action
            .inputs
            .iter()
            .map(|i| i.semantic_type)
            .chain(action.outputs.iter().map(|o| o.semantic_type));
        for expr in slot_types {
            self.types.parse(expr)?;
        }
        tracing::debug!("registered action {}", action.id);
        self.actions.insert(action.id.to_string(), action);
        Ok(())
    }

    pub fn action(&self, id: &str) -> Result<&Action> {
        self.actions
            .get(id)
            .ok_or_else(|| StatsError::ActionNotFound(id.to_string()))
    }

    /// Actions ordered by id.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    pub fn invoke(&self, id: &str, args: ActionArgs) -> Result<StatsTable> {
        self.action(id)?.invoke(args)
    }

    /// Serializable description of the plugin, as a host caches it.
    pub fn manifest(&self, entry_point: &str) -> PluginEntry {
        let text = |s: &str| (!s.is_empty()).then(|| s.to_string());
        PluginEntry {
            name: self.name.clone(),
            package: self.package.clone(),
            version: self.version.clone(),
            entry_point: entry_point.to_string(),
            website: text(&self.website),
            description: text(&self.description),
            short_description: text(&self.short_description),
            semantic_types: self.types.names().into_iter().map(String::from).collect(),
            actions: self
                .actions
                .iter()
                .map(|(id, action)| (id.clone(), action.metadata()))
                .collect(),
            registered_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{DistRow, GroupValue, PairwiseRow};

    fn echo(args: &ActionArgs) -> Result<StatsTable> {
        let dist = args.input("distribution")?;
        let label = args.required_str("mode")?;
        let row = PairwiseRow {
            a_group: GroupValue::from(label),
            a_n: dist.rows.len(),
            a_measure: 0.0,
            b_group: GroupValue::from("b"),
            b_n: 0,
            b_measure: 0.0,
            n: 0,
            test_statistic: if args.bool_param("flag") { 1.0 } else { 0.0 },
            p_value: 1.0,
            q_value: 1.0,
        };
        Ok(StatsTable::new(vec![row]))
    }

    fn action() -> Action {
        Action {
            id: "echo",
            name: "Echo",
            description: "",
            inputs: vec![InputSpec {
                name: "distribution",
                semantic_type: "Dist1D[Ordered, Independent]",
                optional: false,
                description: "",
            }],
            parameters: vec![
                ParameterSpec {
                    name: "mode",
                    kind: ParameterKind::Choice {
                        choices: &["one", "two"],
                        invalid: |s| StatsError::InvalidParameter {
                            name: "mode".to_string(),
                            message: format!("bad mode {}", s),
                        },
                    },
                    default: Some(Value::from("one")),
                    description: "",
                },
                ParameterSpec {
                    name: "flag",
                    kind: ParameterKind::Bool,
                    default: Some(Value::Bool(false)),
                    description: "",
                },
                ParameterSpec {
                    name: "label",
                    kind: ParameterKind::Str,
                    default: Some(Value::Null),
                    description: "",
                },
            ],
            outputs: vec![OutputSpec {
                name: "stats",
                semantic_type: "StatsTable[Pairwise]",
                description: "",
            }],
            callable: echo,
        }
    }

    fn dist() -> Distribution {
        Distribution::new(vec![DistRow {
            id: "s1".to_string(),
            subject: None,
            group: GroupValue::from("a"),
            measure: 1.0,
        }])
    }

    fn plugin() -> Plugin {
        let mut plugin = Plugin::new("test", "0.0.1", "q2_test");
        plugin.types = TypeRegistry::builtin();
        plugin.register_action(action()).unwrap();
        plugin
    }

    #[test]
    fn test_invoke_fills_defaults() {
        let table = plugin()
            .invoke("echo", ActionArgs::new().with_input("distribution", dist()))
            .unwrap();
        assert_eq!(table.rows[0].a_group, GroupValue::from("one"));
        assert_eq!(table.rows[0].a_n, 1);
    }

    #[test]
    fn test_invoke_validates_arguments() {
        let plugin = plugin();
        assert!(matches!(
            plugin.invoke("echo", ActionArgs::new()),
            Err(StatsError::MissingInput(name)) if name == "distribution"
        ));

        let args = ActionArgs::new()
            .with_input("distribution", dist())
            .with_parameter("mode", "three");
        let err = plugin.invoke("echo", args).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for parameter 'mode': bad mode three");

        let args = ActionArgs::new()
            .with_input("distribution", dist())
            .with_parameter("flag", "yes");
        assert!(plugin.invoke("echo", args).is_err());

        let args = ActionArgs::new()
            .with_input("distribution", dist())
            .with_parameter("colour", "red");
        assert!(plugin.invoke("echo", args).is_err());

        assert!(matches!(
            plugin.invoke("missing", ActionArgs::new()),
            Err(StatsError::ActionNotFound(_))
        ));
    }

    #[test]
    fn test_register_rejects_unknown_type() {
        let mut plugin = Plugin::new("test", "0.0.1", "q2_test");
        assert!(matches!(
            plugin.register_action(action()),
            Err(StatsError::InvalidType(_))
        ));
    }

    #[test]
    fn test_manifest() {
        let entry = plugin().manifest("q2_test.setup:plugin");
        assert_eq!(entry.entry_point, "q2_test.setup:plugin");
        let echo = &entry.actions["echo"];
        assert_eq!(echo.parameters[0].annotation, "Str % Choices('one', 'two')");
        assert_eq!(echo.parameters[0].default.as_deref(), Some("\"one\""));
        assert_eq!(echo.parameters[2].default.as_deref(), Some("null"));
        assert!(!echo.parameters[1].is_required);
        assert_eq!(echo.outputs[0].semantic_type, "StatsTable[Pairwise]");
        assert!(entry.semantic_types.contains(&"Pairwise".to_string()));
    }
}
