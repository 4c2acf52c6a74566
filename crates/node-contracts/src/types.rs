//! Core types shared by port descriptors
//!
//! These types name the semantic type of a port and carry the small
//! enumerations used by widget metadata.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node type (e.g., "PrimitiveInt")
pub type NodeId = String;

/// Identifier of an input or output port
pub type PortId = String;

/// Immutable string identifier for a port's semantic type
///
/// Used both as the serialization key of a port entry and as the
/// dispatch key for widget rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortTypeTag(Cow<'static, str>);

impl PortTypeTag {
    pub const BOOLEAN: PortTypeTag = PortTypeTag(Cow::Borrowed("BOOLEAN"));
    pub const INT: PortTypeTag = PortTypeTag(Cow::Borrowed("INT"));
    pub const FLOAT: PortTypeTag = PortTypeTag(Cow::Borrowed("FLOAT"));
    pub const STRING: PortTypeTag = PortTypeTag(Cow::Borrowed("STRING"));
    pub const COMBO: PortTypeTag = PortTypeTag(Cow::Borrowed("COMBO"));

    /// Create a tag for a custom port type (e.g., "IMAGE")
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for PortTypeTag {
    fn from(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }
}

impl From<String> for PortTypeTag {
    fn from(tag: String) -> Self {
        Self(Cow::Owned(tag))
    }
}

/// How a numeric widget is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberDisplay {
    Number,
    Slider,
}

/// Which option is selected after a remote combo refreshes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAfterRefresh {
    #[default]
    First,
    Last,
}

/// A Rust enum usable as the option set of a combo input
///
/// Combo inputs built from a `ComboChoice` expand to the plain value list
/// at construction time, so serialized schemas only ever carry scalars.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, Copy)]
/// enum Sampler { Euler, Ddim }
///
/// impl ComboChoice for Sampler {
///     fn all() -> &'static [Self] { &[Sampler::Euler, Sampler::Ddim] }
///     fn value(&self) -> &'static str {
///         match self { Sampler::Euler => "euler", Sampler::Ddim => "ddim" }
///     }
/// }
/// ```
pub trait ComboChoice: Copy + 'static {
    /// Every member, in display order
    fn all() -> &'static [Self];

    /// The underlying value of this member
    fn value(&self) -> &'static str;

    /// Parse a member back from its underlying value
    fn from_value(value: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.value() == value)
    }
}
