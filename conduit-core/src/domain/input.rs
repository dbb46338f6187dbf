//! Inputs
//!
//! An input is one typed, named configuration parameter declared by a
//! connector. [`Input`] is generic over its [`InputKind`]; [`FormInput`] is the
//! tagged variant set forms store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::codec::{BooleanKind, InputKind, IntegerKind, MapKind, StringKind};
use crate::domain::element::{MAX_NAME_LENGTH, MAX_SMALLINT, NamedElement, validate_identifier};
use crate::error::{ModelError, Result};

/// Value kind discriminator, as persisted in `input.input_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputType {
    String,
    Map,
    Integer,
    Boolean,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::String => "STRING",
            InputType::Map => "MAP",
            InputType::Integer => "INTEGER",
            InputType::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "STRING" => Ok(InputType::String),
            "MAP" => Ok(InputType::Map),
            "INTEGER" => Ok(InputType::Integer),
            "BOOLEAN" => Ok(InputType::Boolean),
            other => Err(ModelError::validation(format!(
                "Unknown input type '{}'",
                other
            ))),
        }
    }
}

/// A configurable parameter whose value kind is fixed at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Input<K: InputKind> {
    element: NamedElement,
    kind: K,
    value: Option<K::Value>,
}

pub type StringInput = Input<StringKind>;
pub type MapInput = Input<MapKind>;
pub type IntegerInput = Input<IntegerKind>;
pub type BooleanInput = Input<BooleanKind>;

impl<K: InputKind + Default> Input<K> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, K::default())
    }
}

impl<K: InputKind> Input<K> {
    pub fn with_kind(name: impl Into<String>, kind: K) -> Self {
        Self {
            element: NamedElement::new(name),
            kind,
            value: None,
        }
    }

    pub fn name(&self) -> &str {
        self.element.name()
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Previously set value, if any
    pub fn value(&self) -> Option<&K::Value> {
        self.value.as_ref()
    }

    /// Replace the current value unconditionally
    pub fn set_value(&mut self, value: K::Value) {
        self.value = Some(value);
    }

    pub fn clear_value(&mut self) {
        self.value = None;
    }

    pub fn to_url_safe_string(&self) -> String {
        match &self.value {
            Some(value) => self.kind.encode(value),
            None => String::new(),
        }
    }

    /// Overwrite the value with the one represented by `encoded`
    ///
    /// An empty string clears the value. On failure the previous value is kept.
    pub fn restore_from_url_safe_string(&mut self, encoded: &str) -> Result<()> {
        self.value = self
            .kind
            .decode(encoded)
            .map_err(|reason| ModelError::MalformedValue {
                input: self.name().to_string(),
                kind: K::TYPE,
                reason,
            })?;
        Ok(())
    }
}

impl<K: InputKind> fmt::Display for Input<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input-{}:{}", K::TYPE, self.name())
    }
}

/// Persisted attributes of an input, independent of its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDescriptor {
    pub name: String,
    pub input_type: InputType,
    pub sensitive: bool,
    pub max_length: Option<u16>,
}

/// Any input a form can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormInput {
    String(StringInput),
    Map(MapInput),
    Integer(IntegerInput),
    Boolean(BooleanInput),
}

/// Run the same expression against whichever input a `FormInput` wraps
macro_rules! with_input {
    ($form_input:expr, $input:ident => $body:expr) => {
        match $form_input {
            FormInput::String($input) => $body,
            FormInput::Map($input) => $body,
            FormInput::Integer($input) => $body,
            FormInput::Boolean($input) => $body,
        }
    };
}

impl FormInput {
    /// Rebuild a value-less input from its persisted attributes
    pub fn from_descriptor(descriptor: &InputDescriptor) -> Self {
        let name = descriptor.name.clone();
        match descriptor.input_type {
            InputType::String => FormInput::String(Input::with_kind(
                name,
                StringKind {
                    sensitive: descriptor.sensitive,
                    max_length: descriptor.max_length,
                },
            )),
            InputType::Map => FormInput::Map(Input::new(name)),
            InputType::Integer => FormInput::Integer(Input::new(name)),
            InputType::Boolean => FormInput::Boolean(Input::new(name)),
        }
    }

    pub fn name(&self) -> &str {
        with_input!(self, input => input.name())
    }

    pub fn input_type(&self) -> InputType {
        match self {
            FormInput::String(_) => InputType::String,
            FormInput::Map(_) => InputType::Map,
            FormInput::Integer(_) => InputType::Integer,
            FormInput::Boolean(_) => InputType::Boolean,
        }
    }

    pub fn descriptor(&self) -> InputDescriptor {
        let (sensitive, max_length) =
            with_input!(self, input => (input.kind().sensitive(), input.kind().max_length()));
        InputDescriptor {
            name: self.name().to_string(),
            input_type: self.input_type(),
            sensitive,
            max_length,
        }
    }

    pub fn has_value(&self) -> bool {
        with_input!(self, input => input.value().is_some())
    }

    pub fn clear_value(&mut self) {
        with_input!(self, input => input.clear_value())
    }

    pub fn to_url_safe_string(&self) -> String {
        with_input!(self, input => input.to_url_safe_string())
    }

    pub fn restore_from_url_safe_string(&mut self, encoded: &str) -> Result<()> {
        with_input!(self, input => input.restore_from_url_safe_string(encoded))
    }

    /// Resolved value for the execution engine, `None` when unset
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            FormInput::String(input) => input.value().cloned().map(serde_json::Value::String),
            FormInput::Map(input) => input.value().map(|map| {
                serde_json::Value::Object(
                    map.iter()
                        .map(|(key, value)| {
                            let value = value
                                .clone()
                                .map_or(serde_json::Value::Null, serde_json::Value::String);
                            (key.clone(), value)
                        })
                        .collect(),
                )
            }),
            FormInput::Integer(input) => input.value().map(|v| serde_json::Value::from(*v)),
            FormInput::Boolean(input) => input.value().map(|v| serde_json::Value::Bool(*v)),
        }
    }

    /// Check the declaration fits the `input` table
    pub fn validate_declaration(&self) -> Result<()> {
        validate_identifier("Input", self.name(), MAX_NAME_LENGTH)?;
        match self.descriptor().max_length {
            Some(max) if max > MAX_SMALLINT => Err(ModelError::validation(format!(
                "Input '{}' max length {} exceeds {}",
                self.name(),
                max,
                MAX_SMALLINT
            ))),
            _ => Ok(()),
        }
    }

    /// Check the current value against the input's constraints
    pub fn validate_value(&self) -> Result<()> {
        let FormInput::String(input) = self else {
            return Ok(());
        };
        let (Some(value), Some(max)) = (input.value(), input.kind().max_length()) else {
            return Ok(());
        };

        let width = value.chars().count();
        if width > max as usize {
            return Err(ModelError::validation(format!(
                "Value of input '{}' is too long ({} characters, max {})",
                input.name(),
                width,
                max
            )));
        }
        Ok(())
    }

    pub fn as_string_mut(&mut self) -> Option<&mut StringInput> {
        match self {
            FormInput::String(input) => Some(input),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut MapInput> {
        match self {
            FormInput::Map(input) => Some(input),
            _ => None,
        }
    }

    pub fn as_integer_mut(&mut self) -> Option<&mut IntegerInput> {
        match self {
            FormInput::Integer(input) => Some(input),
            _ => None,
        }
    }

    pub fn as_boolean_mut(&mut self) -> Option<&mut BooleanInput> {
        match self {
            FormInput::Boolean(input) => Some(input),
            _ => None,
        }
    }
}

impl fmt::Display for FormInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        with_input!(self, input => fmt::Display::fmt(input, f))
    }
}

impl From<StringInput> for FormInput {
    fn from(input: StringInput) -> Self {
        FormInput::String(input)
    }
}

impl From<MapInput> for FormInput {
    fn from(input: MapInput) -> Self {
        FormInput::Map(input)
    }
}

impl From<IntegerInput> for FormInput {
    fn from(input: IntegerInput) -> Self {
        FormInput::Integer(input)
    }
}

impl From<BooleanInput> for FormInput {
    fn from(input: BooleanInput) -> Self {
        FormInput::Boolean(input)
    }
}
