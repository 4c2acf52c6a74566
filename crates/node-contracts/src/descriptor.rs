//! Input and output port descriptors
//!
//! An [`Input`] carries the fields every input port has (id, display name,
//! optionality, tooltip, advanced flag, extra metadata), the widget fields
//! used by widget-backed ports, and an [`InputKind`] holding the
//! type-specific extension. An [`Output`] is the much smaller mirror for
//! output ports.
//!
//! Both render to a pruned key/value map via `as_serializable()`: fields that
//! are unset are omitted rather than written as `null`.
//!
//! # Example
//!
//! ```ignore
//! use node_contracts::{Input, IntOptions, NumberDisplay, Output};
//!
//! let steps = Input::new("steps", IntOptions {
//!     min: Some(1),
//!     max: Some(10_000),
//!     display: Some(NumberDisplay::Slider),
//!     ..Default::default()
//! })
//! .default(20)
//! .tooltip("Number of denoising steps");
//!
//! let latent = Output::new("LATENT").display_name("Latent");
//! ```

use serde_json::{Map, Value};

use crate::error::{ContractError, Result};
use crate::types::{ComboChoice, ControlAfterRefresh, NumberDisplay, PortId, PortTypeTag};

/// Insert `value` under `key` unless it is absent or null
fn put<T: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        let value = value.into();
        if !value.is_null() {
            map.insert(key.to_string(), value);
        }
    }
}

fn display_value(display: Option<NumberDisplay>) -> Option<&'static str> {
    display.map(|d| match d {
        NumberDisplay::Number => "number",
        NumberDisplay::Slider => "slider",
    })
}

/// Remote population of a combo's options
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteOptions {
    /// Route the options are fetched from
    pub route: String,
    /// Whether the UI shows a refresh button below the widget
    pub refresh_button: bool,
    /// Which option gets selected after a refresh
    pub control_after_refresh: ControlAfterRefresh,
    /// Request timeout in milliseconds
    pub timeout: Option<u64>,
    /// Retries before the request is abandoned
    pub max_retries: Option<u32>,
    /// Refresh interval (TTL of the fetched value) in milliseconds
    pub refresh: Option<u64>,
}

impl RemoteOptions {
    pub fn new(route: impl Into<String>, refresh_button: bool) -> Self {
        Self {
            route: route.into(),
            refresh_button,
            control_after_refresh: ControlAfterRefresh::First,
            timeout: None,
            max_retries: None,
            refresh: None,
        }
    }

    pub fn as_serializable(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("route".into(), Value::from(self.route.clone()));
        map.insert("refresh_button".into(), Value::from(self.refresh_button));
        let control = match self.control_after_refresh {
            ControlAfterRefresh::First => "first",
            ControlAfterRefresh::Last => "last",
        };
        map.insert("control_after_refresh".into(), Value::from(control));
        put(&mut map, "timeout", self.timeout);
        put(&mut map, "max_retries", self.max_retries);
        put(&mut map, "refresh", self.refresh);
        map
    }
}

/// BOOLEAN widget fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooleanOptions {
    pub label_on: Option<String>,
    pub label_off: Option<String>,
}

/// INT widget fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntOptions {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub step: Option<i64>,
    pub control_after_generate: Option<bool>,
    pub display: Option<NumberDisplay>,
}

/// FLOAT widget fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatOptions {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub round: Option<f64>,
    pub display: Option<NumberDisplay>,
}

/// STRING widget fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringOptions {
    pub multiline: bool,
    pub placeholder: Option<String>,
    pub dynamic_prompts: Option<bool>,
}

/// COMBO widget fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComboOptions {
    /// Literal option values; enum-backed combos are expanded on construction
    pub options: Option<Vec<Value>>,
    pub remote: Option<RemoteOptions>,
    /// Always false for the single-select combo
    pub multiselect: bool,
}

impl ComboOptions {
    /// Combo over a literal list of values
    pub fn new<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self {
            options: Some(values.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Combo over every member of a Rust enum
    pub fn from_choice<C: ComboChoice>() -> Self {
        Self::new(C::all().iter().map(|c| c.value()))
    }

    /// Combo whose options are fetched from a remote route
    pub fn remote(remote: RemoteOptions) -> Self {
        Self {
            options: None,
            remote: Some(remote),
            multiselect: false,
        }
    }

    pub fn with_remote(mut self, remote: RemoteOptions) -> Self {
        self.remote = Some(remote);
        self
    }
}

/// Type-specific extension of an input port
#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    /// Connection-only port with no widget (e.g., "IMAGE")
    Socket(PortTypeTag),
    Boolean(BooleanOptions),
    Int(IntOptions),
    Float(FloatOptions),
    String(StringOptions),
    Combo(ComboOptions),
}

impl InputKind {
    pub fn tag(&self) -> PortTypeTag {
        match self {
            Self::Socket(tag) => tag.clone(),
            Self::Boolean(_) => PortTypeTag::BOOLEAN,
            Self::Int(_) => PortTypeTag::INT,
            Self::Float(_) => PortTypeTag::FLOAT,
            Self::String(_) => PortTypeTag::STRING,
            Self::Combo(_) => PortTypeTag::COMBO,
        }
    }

    /// Whether the port is backed by a widget
    pub fn is_widget(&self) -> bool {
        !matches!(self, Self::Socket(_))
    }

    fn extend_serializable(&self, map: &mut Map<String, Value>) {
        match self {
            Self::Socket(_) => {}
            Self::Boolean(o) => {
                put(map, "label_on", o.label_on.clone());
                put(map, "label_off", o.label_off.clone());
            }
            Self::Int(o) => {
                put(map, "min", o.min);
                put(map, "max", o.max);
                put(map, "step", o.step);
                put(map, "control_after_generate", o.control_after_generate);
                put(map, "display", display_value(o.display));
            }
            Self::Float(o) => {
                put(map, "min", o.min);
                put(map, "max", o.max);
                put(map, "step", o.step);
                put(map, "round", o.round);
                put(map, "display", display_value(o.display));
            }
            Self::String(o) => {
                map.insert("multiline".into(), Value::from(o.multiline));
                put(map, "placeholder", o.placeholder.clone());
                put(map, "dynamicPrompts", o.dynamic_prompts);
            }
            Self::Combo(o) => {
                map.insert("multiselect".into(), Value::from(o.multiselect));
                put(map, "options", o.options.clone());
                put(map, "remote", o.remote.as_ref().map(|r| Value::Object(r.as_serializable())));
            }
        }
    }
}

impl From<BooleanOptions> for InputKind {
    fn from(options: BooleanOptions) -> Self {
        Self::Boolean(options)
    }
}

impl From<IntOptions> for InputKind {
    fn from(options: IntOptions) -> Self {
        Self::Int(options)
    }
}

impl From<FloatOptions> for InputKind {
    fn from(options: FloatOptions) -> Self {
        Self::Float(options)
    }
}

impl From<StringOptions> for InputKind {
    fn from(options: StringOptions) -> Self {
        Self::String(options)
    }
}

impl From<ComboOptions> for InputKind {
    fn from(options: ComboOptions) -> Self {
        Self::Combo(options)
    }
}

impl From<PortTypeTag> for InputKind {
    fn from(tag: PortTypeTag) -> Self {
        Self::Socket(tag)
    }
}

/// Widget-only fields shared by every widget-backed input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetFields {
    pub default: Option<Value>,
    pub socketless: Option<bool>,
    /// Overrides the io type reported for this input
    pub widget_type: Option<PortTypeTag>,
    pub force_input: Option<bool>,
}

impl WidgetFields {
    fn is_empty(&self) -> bool {
        self.default.is_none()
            && self.socketless.is_none()
            && self.widget_type.is_none()
            && self.force_input.is_none()
    }
}

/// A declared input port
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    /// Unique within the declaring schema's inputs
    pub id: PortId,
    pub display_name: Option<String>,
    pub optional: bool,
    pub tooltip: Option<String>,
    pub advanced: Option<bool>,
    /// Free-form metadata merged into the serialized map
    pub extra: Map<String, Value>,
    pub widget: WidgetFields,
    pub kind: InputKind,
    /// Logical inputs this descriptor expands into (composite inputs)
    pub expansion: Vec<Input>,
}

impl Input {
    pub fn new(id: impl Into<PortId>, kind: impl Into<InputKind>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            optional: false,
            tooltip: None,
            advanced: None,
            extra: Map::new(),
            widget: WidgetFields::default(),
            kind: kind.into(),
            expansion: Vec::new(),
        }
    }

    /// Connection-only input of a custom port type
    pub fn socket(id: impl Into<PortId>, tag: impl Into<PortTypeTag>) -> Self {
        Self::new(id, InputKind::Socket(tag.into()))
    }

    pub fn boolean(id: impl Into<PortId>) -> Self {
        Self::new(id, BooleanOptions::default())
    }

    pub fn int(id: impl Into<PortId>) -> Self {
        Self::new(id, IntOptions::default())
    }

    pub fn float(id: impl Into<PortId>) -> Self {
        Self::new(id, FloatOptions::default())
    }

    pub fn string(id: impl Into<PortId>) -> Self {
        Self::new(id, StringOptions::default())
    }

    pub fn combo<V: Into<Value>>(
        id: impl Into<PortId>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(id, ComboOptions::new(values))
    }

    /// Combo over every member of `C`
    pub fn combo_choice<C: ComboChoice>(id: impl Into<PortId>) -> Self {
        Self::new(id, ComboOptions::from_choice::<C>())
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn advanced(mut self, advanced: bool) -> Self {
        self.advanced = Some(advanced);
        self
    }

    /// Attach free-form metadata; keys must not reuse documented field names
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.widget.default = Some(value.into());
        self
    }

    /// Default given as an enum member; stored as its underlying value
    pub fn default_choice<C: ComboChoice>(self, choice: C) -> Self {
        self.default(choice.value())
    }

    pub fn socketless(mut self, socketless: bool) -> Self {
        self.widget.socketless = Some(socketless);
        self
    }

    pub fn widget_type(mut self, tag: impl Into<PortTypeTag>) -> Self {
        self.widget.widget_type = Some(tag.into());
        self
    }

    pub fn force_input(mut self, force: bool) -> Self {
        self.widget.force_input = Some(force);
        self
    }

    /// Declare the logical inputs this descriptor expands into
    pub fn expand(mut self, inputs: Vec<Input>) -> Self {
        self.expansion = inputs;
        self
    }

    /// The declared port type
    pub fn tag(&self) -> PortTypeTag {
        self.kind.tag()
    }

    /// The type reported to consumers: the widget override if set
    pub fn io_type(&self) -> PortTypeTag {
        match &self.widget.widget_type {
            Some(tag) if self.kind.is_widget() => tag.clone(),
            _ => self.kind.tag(),
        }
    }

    /// This input followed by everything it expands into, depth first
    pub fn flatten(&self) -> Vec<&Input> {
        let mut all = vec![self];
        for child in &self.expansion {
            all.extend(child.flatten());
        }
        all
    }

    pub fn validate(&self) -> Result<()> {
        match &self.kind {
            InputKind::Socket(tag) if !self.widget.is_empty() => {
                return Err(ContractError::validation(format!(
                    "Input '{}' of type {} has no widget and cannot carry widget fields",
                    self.id, tag
                )));
            }
            InputKind::Int(IntOptions { min: Some(min), max: Some(max), .. }) if min > max => {
                return Err(ContractError::validation(format!(
                    "Input '{}' has min {} greater than max {}",
                    self.id, min, max
                )));
            }
            InputKind::Float(FloatOptions { min: Some(min), max: Some(max), .. }) if min > max => {
                return Err(ContractError::validation(format!(
                    "Input '{}' has min {} greater than max {}",
                    self.id, min, max
                )));
            }
            InputKind::Combo(ComboOptions { options: Some(options), .. }) => {
                if let Some(default) = &self.widget.default {
                    if !options.is_empty() && !options.contains(default) {
                        return Err(ContractError::validation(format!(
                            "Input '{}' default {} is not one of its options",
                            self.id, default
                        )));
                    }
                }
            }
            _ => {}
        }
        for child in &self.expansion {
            child.validate()?;
        }
        Ok(())
    }

    pub fn as_serializable(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let display_name = self.display_name.clone().unwrap_or_else(|| self.id.clone());
        map.insert("display_name".into(), Value::from(display_name));
        map.insert("optional".into(), Value::from(self.optional));
        put(&mut map, "tooltip", self.tooltip.clone());
        put(&mut map, "advanced", self.advanced);

        if self.kind.is_widget() {
            put(&mut map, "default", self.widget.default.clone());
            put(&mut map, "socketless", self.widget.socketless);
            put(&mut map, "widgetType", self.widget.widget_type.as_ref().map(|t| t.to_string()));
            put(&mut map, "forceInput", self.widget.force_input);
        }
        self.kind.extend_serializable(&mut map);

        for (key, value) in &self.extra {
            if !value.is_null() {
                map.insert(key.clone(), value.clone());
            }
        }
        map
    }
}

/// A declared output port
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// Assigned as `_<index>_<tag>_` during finalize when left unset
    pub id: Option<PortId>,
    pub display_name: Option<String>,
    pub tooltip: Option<String>,
    pub tag: PortTypeTag,
    /// Option values carried by COMBO outputs
    pub options: Vec<Value>,
}

impl Output {
    pub fn new(tag: impl Into<PortTypeTag>) -> Self {
        Self {
            id: None,
            display_name: None,
            tooltip: None,
            tag: tag.into(),
            options: Vec::new(),
        }
    }

    pub fn boolean() -> Self {
        Self::new(PortTypeTag::BOOLEAN)
    }

    pub fn int() -> Self {
        Self::new(PortTypeTag::INT)
    }

    pub fn float() -> Self {
        Self::new(PortTypeTag::FLOAT)
    }

    pub fn string() -> Self {
        Self::new(PortTypeTag::STRING)
    }

    pub fn combo<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        let mut output = Self::new(PortTypeTag::COMBO);
        output.options = values.into_iter().map(Into::into).collect();
        output
    }

    pub fn id(mut self, id: impl Into<PortId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn io_type(&self) -> PortTypeTag {
        self.tag.clone()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.options.is_empty() && self.tag != PortTypeTag::COMBO {
            return Err(ContractError::validation(format!(
                "Output {:?} of type {} cannot carry combo options",
                self.id, self.tag
            )));
        }
        Ok(())
    }

    pub fn as_serializable(&self) -> Map<String, Value> {
        let mut map = Map::new();
        put(&mut map, "display_name", self.display_name.clone().or_else(|| self.id.clone()));
        put(&mut map, "tooltip", self.tooltip.clone());
        if !self.options.is_empty() {
            map.insert("options".into(), Value::Array(self.options.clone()));
        }
        map
    }
}
