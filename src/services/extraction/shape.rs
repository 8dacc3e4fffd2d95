//! Output shapes: the field contract a model response has to satisfy.
//!
//! The same [`OutputShape`] renders the format instructions sent to the model
//! and validates the records that come back, so the two cannot drift apart.

use serde_json::{Map, Value};

/// Semantic type of one output field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field {
    /// A single string; the payload describes what should fill it.
    Literal(String),
    /// An array of exactly `size` strings, each described by `hint`.
    List { size: usize, hint: String },
    /// A field whose key name is itself generated by the model.
    DynamicKey(String),
}

impl Field {
    pub fn literal(description: impl Into<String>) -> Self {
        Field::Literal(description.into())
    }

    pub fn list(size: usize, hint: impl Into<String>) -> Self {
        Field::List {
            size,
            hint: hint.into(),
        }
    }

    pub fn dynamic(description: impl Into<String>) -> Self {
        Field::DynamicKey(description.into())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ShapeEntry {
    name: String,
    field: Field,
    optional: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputShape {
    entries: Vec<ShapeEntry>,
}

/// Returns true when a key name contains a `<...>` placeholder.
pub fn is_placeholder(name: &str) -> bool {
    match (name.find('<'), name.rfind('>')) {
        (Some(open), Some(close)) => open < close,
        _ => false,
    }
}

impl OutputShape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required field. Names containing `<...>` are always treated as
    /// dynamic keys regardless of the descriptor passed in.
    pub fn field(self, name: impl Into<String>, field: Field) -> Self {
        self.push(name.into(), field, false)
    }

    pub fn optional_field(self, name: impl Into<String>, field: Field) -> Self {
        self.push(name.into(), field, true)
    }

    fn push(mut self, name: String, field: Field, optional: bool) -> Self {
        let field = match field {
            Field::Literal(description) if is_placeholder(&name) => Field::DynamicKey(description),
            other => other,
        };
        self.entries.push(ShapeEntry {
            name,
            field,
            optional,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_list(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.field, Field::List { .. }))
    }

    pub fn has_dynamic_keys(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.field, Field::DynamicKey(_)))
    }

    /// Names of the keys every record must carry verbatim.
    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| !e.optional && !matches!(e.field, Field::DynamicKey(_)))
            .map(|e| e.name.as_str())
    }

    /// Renders the shape as a JSON-like template the model can copy.
    pub fn render(&self) -> String {
        let lines: Vec<String> = self
            .entries
            .iter()
            .map(|entry| {
                let value = match &entry.field {
                    Field::Literal(description) | Field::DynamicKey(description) => {
                        format!("\"<{}>\"", description)
                    }
                    Field::List { size, hint } => {
                        let slots: Vec<String> =
                            (1..=*size).map(|i| format!("\"<{} {}>\"", hint, i)).collect();
                        format!("[{}]", slots.join(", "))
                    }
                };
                let optional = if entry.optional { " (optional)" } else { "" };
                format!("  \"{}\": {}{}", entry.name, value, optional)
            })
            .collect();

        format!("{{\n{}\n}}", lines.join(",\n"))
    }

    /// Checks one record against the shape, naming the first offending field.
    pub fn validate_record(&self, record: &Value) -> Result<(), String> {
        let object = record
            .as_object()
            .ok_or_else(|| format!("expected a JSON object, got {}", type_name(record)))?;

        for entry in &self.entries {
            match &entry.field {
                Field::DynamicKey(_) => {}
                field => match object.get(&entry.name) {
                    None | Some(Value::Null) if entry.optional => {}
                    None | Some(Value::Null) => {
                        return Err(format!("missing required field `{}`", entry.name));
                    }
                    Some(value) => check_field(&entry.name, field, value)?,
                },
            }
        }

        let dynamic = self
            .entries
            .iter()
            .filter(|e| matches!(e.field, Field::DynamicKey(_)))
            .count();
        if dynamic > 0 {
            let generated = object
                .keys()
                .filter(|k| !self.entries.iter().any(|e| &e.name == *k))
                .count();
            if generated < dynamic {
                return Err(format!(
                    "expected {} generated key(s) in place of the <...> placeholders, found {}",
                    dynamic, generated
                ));
            }
        }

        Ok(())
    }
}

fn check_field(name: &str, field: &Field, value: &Value) -> Result<(), String> {
    match field {
        Field::Literal(_) => match value {
            Value::String(s) if s.trim().is_empty() => Err(format!("field `{}` is empty", name)),
            Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(()),
            other => Err(format!(
                "field `{}` must be a string, got {}",
                name,
                type_name(other)
            )),
        },
        Field::List { size, .. } => {
            let items = value.as_array().ok_or_else(|| {
                format!("field `{}` must be an array, got {}", name, type_name(value))
            })?;
            if items.len() != *size {
                return Err(format!(
                    "field `{}` must have exactly {} elements, got {}",
                    name,
                    size,
                    items.len()
                ));
            }
            if let Some(pos) = items.iter().position(|item| !item.is_string()) {
                return Err(format!("field `{}` element {} must be a string", name, pos));
            }
            Ok(())
        }
        Field::DynamicKey(_) => Ok(()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Coerces scalar literal fields to strings so records deserialize cleanly
/// into string-typed targets.
pub(crate) fn stringify_literals(shape: &OutputShape, record: &mut Map<String, Value>) {
    for entry in &shape.entries {
        if let Field::Literal(_) = entry.field {
            if let Some(value) = record.get_mut(&entry.name) {
                match value {
                    Value::Number(n) => *value = Value::String(n.to_string()),
                    Value::Bool(b) => *value = Value::String(b.to_string()),
                    _ => {}
                }
            }
        }
    }
}
