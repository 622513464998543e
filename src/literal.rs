//! Input-value literals (`{genre: DRAMA, first: 10}`).
//!
//! Input objects are a closed sum: each input type's fields are enumerated
//! once from the schema, and every slot is either given or left unspecified.
//! Unspecified slots are collected in a [`DefaultsAccumulator`] owned by the
//! object scope being written; it is passed in and handed back, never shared
//! with nested objects.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::error::{CodegenError, Result};
use crate::schema::{SchemaGraph, TypeKind, TypeReference};

// ————————————————————————————————————————————————————————————————————————————
// VALUES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Enum(String),
    List(Vec<InputValue>),
    Object { type_name: String, fields: IndexMap<String, Slot> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Given(InputValue),
    /// Left at the schema default; omitted from the literal.
    Unspecified,
}

impl InputValue {
    /// Converts a JSON default value, directed by the declared type:
    /// strings typed as enums become enum literals, objects typed as inputs
    /// are checked against the input's fields.
    pub fn from_json(value: &Value, ty: &TypeReference, graph: &SchemaGraph) -> Result<InputValue> {
        if value.is_null() {
            return Ok(InputValue::Null);
        }
        match ty {
            TypeReference::NonNull(inner) => Self::from_json(value, inner, graph),
            TypeReference::List(inner) => match value {
                Value::Array(items) => {
                    let items = items
                        .iter()
                        .map(|item| Self::from_json(item, inner, graph))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(InputValue::List(items))
                }
                single => Self::from_json(single, inner, graph),
            },
            TypeReference::Named(name) => match (graph.get(name).map(|t| t.kind), value) {
                (Some(TypeKind::Enum), Value::String(symbol)) => {
                    Ok(InputValue::Enum(symbol.clone()))
                }
                (Some(TypeKind::Input), Value::Object(entries)) => {
                    let Some(input) = graph.get(name) else {
                        return Ok(Self::untyped(value));
                    };
                    let mut fields = IndexMap::new();
                    for (key, entry) in entries {
                        let Some(field) = input.field(key) else {
                            return Err(CodegenError::UnknownInputField {
                                type_name: name.clone(),
                                field: key.clone(),
                            });
                        };
                        let value = Self::from_json(entry, &field.ty, graph)?;
                        fields.insert(key.clone(), Slot::Given(value));
                    }
                    Ok(InputValue::Object { type_name: name.clone(), fields })
                }
                _ => Ok(Self::untyped(value)),
            },
        }
    }

    fn untyped(value: &Value) -> InputValue {
        match value {
            Value::Null => InputValue::Null,
            Value::Bool(b) => InputValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => InputValue::Int(i),
                None => InputValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => InputValue::String(s.clone()),
            Value::Array(items) => InputValue::List(items.iter().map(Self::untyped).collect()),
            Value::Object(entries) => InputValue::Object {
                type_name: String::new(),
                fields: entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Slot::Given(Self::untyped(v))))
                    .collect(),
            },
        }
    }
}

/// Fields of one object scope that were left unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultsAccumulator {
    unspecified: IndexSet<String>,
}

impl DefaultsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str) {
        self.unspecified.insert(name.to_string());
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.unspecified.iter().map(String::as_str)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SERIALIZER
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default)]
pub struct LiteralSerializer {
    /// Input type → declared field names.
    input_fields: IndexMap<String, Vec<String>>,
}

impl LiteralSerializer {
    pub fn new(graph: &SchemaGraph) -> Self {
        let input_fields = graph
            .types_of_kind(TypeKind::Input)
            .map(|ty| (ty.name.clone(), ty.active_fields().map(|f| f.name.clone()).collect()))
            .collect();
        Self { input_fields }
    }

    pub fn known_fields(&self, type_name: &str) -> Option<&[String]> {
        self.input_fields.get(type_name).map(Vec::as_slice)
    }

    pub fn serialize(&self, value: &InputValue) -> Result<String> {
        match value {
            InputValue::Null => Ok("null".to_string()),
            InputValue::Int(i) => Ok(i.to_string()),
            InputValue::Float(f) => Ok(format!("{f:?}")),
            InputValue::String(s) => Ok(serde_json::to_string(s)?),
            InputValue::Boolean(b) => Ok(b.to_string()),
            InputValue::Enum(symbol) => Ok(symbol.clone()),
            InputValue::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.serialize(item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("[{}]", items.join(", ")))
            }
            InputValue::Object { type_name, fields } => {
                // a nested object never writes into the caller's accumulator
                let (text, _own) =
                    self.write_object(type_name, fields, DefaultsAccumulator::new())?;
                Ok(text)
            }
        }
    }

    /// Writes an object in declared field order. Declared fields without a
    /// slot count as unspecified.
    pub fn write_object(
        &self,
        type_name: &str,
        fields: &IndexMap<String, Slot>,
        mut defaults: DefaultsAccumulator,
    ) -> Result<(String, DefaultsAccumulator)> {
        let order: Vec<&str> = match self.known_fields(type_name) {
            Some(known) => {
                if let Some(unknown) = fields.keys().find(|k| !known.contains(k)) {
                    return Err(CodegenError::UnknownInputField {
                        type_name: type_name.to_string(),
                        field: unknown.clone(),
                    });
                }
                known.iter().map(String::as_str).collect()
            }
            None => fields.keys().map(String::as_str).collect(),
        };

        let mut parts = Vec::new();
        for name in order {
            match fields.get(name) {
                Some(Slot::Given(value)) => {
                    parts.push(format!("{name}: {}", self.serialize(value)?))
                }
                Some(Slot::Unspecified) | None => defaults.record(name),
            }
        }
        Ok((format!("{{{}}}", parts.join(", ")), defaults))
    }

    /// `name: literal, ...` for a field's argument list, skipping arguments
    /// left unspecified.
    pub fn format_args(
        &self,
        args: &[(String, Slot)],
        mut defaults: DefaultsAccumulator,
    ) -> Result<(String, DefaultsAccumulator)> {
        let mut parts = Vec::new();
        for (name, slot) in args {
            match slot {
                Slot::Given(value) => parts.push(format!("{name}: {}", self.serialize(value)?)),
                Slot::Unspecified => defaults.record(name),
            }
        }
        Ok((parts.join(", "), defaults))
    }
}
