//! Port type registry
//!
//! Maps a [`PortTypeTag`] to the descriptor specialization that backs it and
//! the semantic value type its widget defaults must carry. Registration
//! rejects malformed or duplicate tags; node registration later rejects
//! ports whose tag was never registered.

use std::collections::HashMap;

use serde_json::Value;

use crate::descriptor::{Input, InputKind, Output};
use crate::error::{ContractError, Result};
use crate::types::PortTypeTag;

/// Semantic value type carried by a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Boolean,
    Integer,
    Float,
    String,
    /// A combo member; option lists may hold strings or numbers
    Choice,
    /// Not representable as a widget value (images, models, ...)
    Opaque,
}

impl ValueKind {
    /// Whether a JSON value is acceptable as a default for this kind
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Boolean => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::String => value.is_string(),
            Self::Choice => value.is_string() || value.is_number(),
            Self::Opaque => true,
        }
    }
}

/// Input descriptor specialization backing a port type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputShape {
    Socket,
    Boolean,
    Int,
    Float,
    String,
    Combo,
}

impl InputShape {
    fn of(kind: &InputKind) -> Self {
        match kind {
            InputKind::Socket(_) => Self::Socket,
            InputKind::Boolean(_) => Self::Boolean,
            InputKind::Int(_) => Self::Int,
            InputKind::Float(_) => Self::Float,
            InputKind::String(_) => Self::String,
            InputKind::Combo(_) => Self::Combo,
        }
    }
}

/// What a registered port type supports
///
/// Every port type has an input side; the output side is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortTypeCapabilities {
    pub value_kind: ValueKind,
    pub input: InputShape,
    pub has_output: bool,
}

impl PortTypeCapabilities {
    pub fn new(value_kind: ValueKind, input: InputShape) -> Self {
        Self {
            value_kind,
            input,
            has_output: true,
        }
    }

    /// A type that can only appear as an input
    pub fn input_only(mut self) -> Self {
        self.has_output = false;
        self
    }
}

/// Registry of port type tags
#[derive(Debug, Clone, Default)]
pub struct PortTypeRegistry {
    types: HashMap<PortTypeTag, PortTypeCapabilities>,
}

impl PortTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding BOOLEAN, INT, FLOAT, STRING, and COMBO
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins = [
            (PortTypeTag::BOOLEAN, ValueKind::Boolean, InputShape::Boolean),
            (PortTypeTag::INT, ValueKind::Integer, InputShape::Int),
            (PortTypeTag::FLOAT, ValueKind::Float, InputShape::Float),
            (PortTypeTag::STRING, ValueKind::String, InputShape::String),
            (PortTypeTag::COMBO, ValueKind::Choice, InputShape::Combo),
        ];
        for (tag, value_kind, input) in builtins {
            registry
                .types
                .insert(tag, PortTypeCapabilities::new(value_kind, input));
        }
        registry
    }

    pub fn register(
        &mut self,
        tag: impl Into<PortTypeTag>,
        capabilities: PortTypeCapabilities,
    ) -> Result<()> {
        let tag = tag.into();
        let reason = if tag.as_str().trim().is_empty() {
            Some("tag must not be empty")
        } else if tag.as_str().chars().any(char::is_whitespace) {
            Some("tag must not contain whitespace")
        } else if self.types.contains_key(&tag) {
            Some("tag is already registered")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(ContractError::PortTypeRegistration {
                tag: tag.to_string(),
                reason: reason.to_string(),
            });
        }
        log::debug!("Registered port type {} ({:?})", tag, capabilities);
        self.types.insert(tag, capabilities);
        Ok(())
    }

    /// Register a connection-only type such as "IMAGE"
    pub fn register_socket(&mut self, tag: impl Into<PortTypeTag>) -> Result<()> {
        self.register(tag, PortTypeCapabilities::new(ValueKind::Opaque, InputShape::Socket))
    }

    pub fn get(&self, tag: &PortTypeTag) -> Option<&PortTypeCapabilities> {
        self.types.get(tag)
    }

    pub fn contains(&self, tag: &PortTypeTag) -> bool {
        self.types.contains_key(tag)
    }

    pub fn tags(&self) -> Vec<&PortTypeTag> {
        let mut tags: Vec<_> = self.types.keys().collect();
        tags.sort();
        tags
    }

    /// Check an input (and its expansion) against the registered types
    ///
    /// A widget-type override is published as the port's io type, so it
    /// must be registered too.
    pub fn check_input(&self, input: &Input) -> Result<()> {
        for port in input.flatten() {
            let tag = port.tag();
            let caps = self.lookup(&tag, &port.id)?;
            if let Some(widget_type) = &port.widget.widget_type {
                self.lookup(widget_type, &port.id)?;
            }
            let shape = InputShape::of(&port.kind);
            if caps.input != shape && shape != InputShape::Socket {
                return Err(ContractError::PortTypeRegistration {
                    tag: tag.to_string(),
                    reason: format!(
                        "port '{}' is declared as {:?} but the type is backed by {:?}",
                        port.id, shape, caps.input
                    ),
                });
            }
            if let Some(default) = &port.widget.default {
                if !caps.value_kind.accepts(default) {
                    return Err(ContractError::validation(format!(
                        "Input '{}' default {} is not a valid {:?} value",
                        port.id, default, caps.value_kind
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn check_output(&self, output: &Output) -> Result<()> {
        let port = output.id.as_deref().unwrap_or("<unnamed>");
        let caps = self.lookup(&output.tag, port)?;
        if !caps.has_output {
            return Err(ContractError::PortTypeRegistration {
                tag: output.tag.to_string(),
                reason: format!("type is input-only; output '{}' cannot use it", port),
            });
        }
        Ok(())
    }

    fn lookup(&self, tag: &PortTypeTag, port: &str) -> Result<&PortTypeCapabilities> {
        self.types.get(tag).ok_or_else(|| ContractError::UnknownPortType {
            tag: tag.to_string(),
            port: port.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = PortTypeRegistry::with_builtins();
        for tag in ["BOOLEAN", "INT", "FLOAT", "STRING", "COMBO"] {
            assert!(registry.contains(&PortTypeTag::new(tag)));
        }
        assert_eq!(registry.tags().len(), 5);
    }

    #[test]
    fn test_register_rejects_bad_tags() {
        let mut registry = PortTypeRegistry::with_builtins();
        assert!(registry.register_socket("").is_err());
        assert!(registry.register_socket("MY TYPE").is_err());
        assert!(registry.register_socket("INT").is_err());
        assert!(registry.register_socket("IMAGE").is_ok());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let registry = PortTypeRegistry::with_builtins();
        let err = registry.check_input(&Input::socket("image", "IMAGE")).unwrap_err();
        assert!(matches!(err, ContractError::UnknownPortType { .. }));
        assert!(err.to_string().contains("image"));
    }

    #[test]
    fn test_socket_allowed_on_widget_type() {
        let registry = PortTypeRegistry::with_builtins();
        assert!(registry.check_input(&Input::socket("value", "INT")).is_ok());
    }

    #[test]
    fn test_default_value_kind_checked() {
        let registry = PortTypeRegistry::with_builtins();
        assert!(registry.check_input(&Input::int("steps").default(20)).is_ok());
        assert!(registry.check_input(&Input::int("steps").default("twenty")).is_err());
        assert!(registry.check_input(&Input::float("cfg").default(7)).is_ok());
        assert!(registry.check_input(&Input::boolean("on").default(1)).is_err());
        assert!(registry.check_input(&Input::string("name").default(5)).is_err());
        assert!(registry.check_input(&Input::string("name").default("five")).is_ok());
    }

    #[test]
    fn test_combo_accepts_numeric_options() {
        let registry = PortTypeRegistry::with_builtins();
        let batch = Input::combo("batch", [1, 2, 4]).default(2);
        assert!(registry.check_input(&batch).is_ok());
        let named = Input::combo("mode", ["fast", "slow"]).default("slow");
        assert!(registry.check_input(&named).is_ok());
    }

    #[test]
    fn test_widget_type_override_must_be_registered() {
        let mut registry = PortTypeRegistry::with_builtins();
        let ckpt = Input::combo("ckpt", ["a.safetensors"]).widget_type("CHECKPOINT_NAME");

        let err = registry.check_input(&ckpt).unwrap_err();
        assert!(matches!(
            err,
            ContractError::UnknownPortType { ref tag, ref port }
                if tag == "CHECKPOINT_NAME" && port == "ckpt"
        ));

        registry.register_socket("CHECKPOINT_NAME").unwrap();
        assert!(registry.check_input(&ckpt).is_ok());
    }

    #[test]
    fn test_input_only_type_rejects_outputs() {
        let mut registry = PortTypeRegistry::new();
        registry
            .register(
                "SEED_CONTROL",
                PortTypeCapabilities::new(ValueKind::String, InputShape::Socket).input_only(),
            )
            .unwrap();
        assert!(registry.check_input(&Input::socket("control", "SEED_CONTROL")).is_ok());
        let err = registry.check_output(&Output::new("SEED_CONTROL")).unwrap_err();
        assert!(err.to_string().contains("input-only"));
    }
}
