//! Cost-estimation annex attached to a schema

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::descriptor::Input;
use crate::error::{ContractError, Result};

/// The only evaluation engine price expressions are written for
pub const DEFAULT_PRICE_ENGINE: &str = "jsonata";

/// Widgets and inputs a price expression reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBadgeDepends {
    #[serde(default)]
    pub widgets: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<String>,
}

impl PriceBadgeDepends {
    pub fn widgets<S: Into<String>>(mut self, widgets: impl IntoIterator<Item = S>) -> Self {
        self.widgets = widgets.into_iter().map(Into::into).collect();
        self
    }

    pub fn inputs<S: Into<String>>(mut self, inputs: impl IntoIterator<Item = S>) -> Self {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Check every reference against the flattened input set
    pub fn validate(&self, inputs: &[&Input]) -> Result<()> {
        let known: Vec<&str> = inputs.iter().map(|i| i.id.as_str()).collect();
        for (kind, refs) in [("widget", &self.widgets), ("input", &self.inputs)] {
            if let Some(missing) = refs.iter().find(|r| !known.contains(&r.as_str())) {
                return Err(ContractError::validation(format!(
                    "PriceBadge depends_on references unknown {} '{}'. Available: {:?}",
                    kind, missing, known
                )));
            }
        }
        Ok(())
    }

    /// Widgets are enriched with the io type of the input they name
    pub fn as_serializable(&self, inputs: &[&Input]) -> Result<Value> {
        let mut widgets = Vec::with_capacity(self.widgets.len());
        for name in &self.widgets {
            let input = inputs.iter().find(|i| &i.id == name).ok_or_else(|| {
                ContractError::validation(format!(
                    "PriceBadge depends_on references unknown widget '{}'. Available: {:?}",
                    name,
                    inputs.iter().map(|i| i.id.as_str()).collect::<Vec<_>>()
                ))
            })?;
            widgets.push(json!({ "name": name, "type": input.io_type() }));
        }
        Ok(json!({ "widgets": widgets, "inputs": self.inputs }))
    }
}

/// Price expression evaluated client-side against widget values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBadge {
    pub expr: String,
    #[serde(default)]
    pub depends_on: PriceBadgeDepends,
    #[serde(default = "default_engine")]
    pub engine: String,
}

fn default_engine() -> String {
    DEFAULT_PRICE_ENGINE.to_string()
}

impl PriceBadge {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            depends_on: PriceBadgeDepends::default(),
            engine: default_engine(),
        }
    }

    pub fn depends_on(mut self, depends_on: PriceBadgeDepends) -> Self {
        self.depends_on = depends_on;
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn validate(&self, inputs: &[&Input]) -> Result<()> {
        if self.engine != DEFAULT_PRICE_ENGINE {
            return Err(ContractError::validation(format!(
                "Unsupported PriceBadge engine '{}'. Only '{}' is supported.",
                self.engine, DEFAULT_PRICE_ENGINE
            )));
        }
        if self.expr.trim().is_empty() {
            return Err(ContractError::validation(
                "PriceBadge expr must be a non-empty string.",
            ));
        }
        self.depends_on.validate(inputs)
    }

    pub fn as_serializable(&self, inputs: &[&Input]) -> Result<Value> {
        Ok(json!({
            "engine": self.engine,
            "depends_on": self.depends_on.as_serializable(inputs)?,
            "expr": self.expr,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_widget_reference_names_offender() {
        let seed = Input::int("seed");
        let steps = Input::int("steps");
        let inputs = vec![&seed, &steps];
        let badge = PriceBadge::new("widgets.steps * 0.01")
            .depends_on(PriceBadgeDepends::default().widgets(["steps", "resolution"]));

        let err = badge.validate(&inputs).unwrap_err().to_string();
        assert!(err.contains("'resolution'"));
        assert!(err.contains("seed"));
        assert!(err.contains("steps"));
    }

    #[test]
    fn test_unknown_input_reference_names_offender() {
        let prompt = Input::string("prompt");
        let image = Input::socket("image", "IMAGE");
        let inputs = vec![&prompt, &image];
        let badge = PriceBadge::new("inputs.image.connected ? 2 : 1")
            .depends_on(PriceBadgeDepends::default().inputs(["nope"]));

        let err = badge.validate(&inputs).unwrap_err();
        assert!(matches!(err, ContractError::SchemaValidation(_)));
        let message = err.to_string();
        assert!(message.contains("unknown input 'nope'"));
        assert!(message.contains(r#"["prompt", "image"]"#));

        let badge = badge.depends_on(PriceBadgeDepends::default().inputs(["image"]));
        assert!(badge.validate(&inputs).is_ok());
    }

    #[test]
    fn test_engine_and_expr_checks() {
        let inputs: Vec<&Input> = Vec::new();
        assert!(PriceBadge::new("1").engine("jmespath").validate(&inputs).is_err());
        assert!(PriceBadge::new("   ").validate(&inputs).is_err());
        assert!(PriceBadge::new("1").validate(&inputs).is_ok());
    }

    #[test]
    fn test_serialization_enriches_widget_types() {
        let model = Input::combo("model", ["small", "large"]);
        let inputs = vec![&model];
        let badge = PriceBadge::new("$lookup(rates, widgets.model)")
            .depends_on(PriceBadgeDepends::default().widgets(["model"]));

        let value = badge.as_serializable(&inputs).unwrap();
        assert_eq!(value["engine"], "jsonata");
        assert_eq!(value["depends_on"]["widgets"][0]["name"], "model");
        assert_eq!(value["depends_on"]["widgets"][0]["type"], "COMBO");
    }
}
