//! Schema values: the JSON shapes tools declare for their input and output.

use crate::taxonomy::TaxonomyMapping;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a schema value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// JSON string
    String,
    /// Integral JSON number
    Integer,
    /// Any JSON number
    Number,
    /// JSON boolean
    Boolean,
    /// JSON array
    Array,
    /// JSON object
    Object,
}

impl SchemaKind {
    /// JSON Schema type name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Whether a (non-null) JSON value has this kind
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of a JSON value's type, for diagnostics
#[must_use]
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A JSON-Schema-like shape with an optional taxonomy mapping.
///
/// `items` is set only for arrays and `properties` only for objects. Values
/// built with the constructors below always satisfy this; deserialized trees
/// are checked by the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaValue {
    /// Value kind
    #[serde(rename = "type")]
    pub kind: SchemaKind,
    /// Human readable description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Default used when the value is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Inclusive numeric lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive numeric upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Element schema (arrays only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaValue>>,
    /// Member schemas in declared order (objects only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaValue>>,
    /// Required member names (objects only)
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub required: IndexSet<String>,
    /// Graph mapping for values at this position
    #[serde(rename = "x-taxonomy", default, skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<TaxonomyMapping>,
}

impl SchemaValue {
    fn of_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            description: String::new(),
            default: None,
            enum_values: None,
            minimum: None,
            maximum: None,
            items: None,
            properties: None,
            required: IndexSet::new(),
            taxonomy: None,
        }
    }

    /// String schema
    #[must_use]
    pub fn string() -> Self {
        Self::of_kind(SchemaKind::String)
    }

    /// String schema with a description
    #[must_use]
    pub fn string_with_desc(description: impl Into<String>) -> Self {
        Self::string().with_description(description)
    }

    /// Integer schema
    #[must_use]
    pub fn integer() -> Self {
        Self::of_kind(SchemaKind::Integer)
    }

    /// Number schema
    #[must_use]
    pub fn number() -> Self {
        Self::of_kind(SchemaKind::Number)
    }

    /// Boolean schema
    #[must_use]
    pub fn boolean() -> Self {
        Self::of_kind(SchemaKind::Boolean)
    }

    /// Array schema
    #[must_use]
    pub fn array(items: SchemaValue) -> Self {
        let mut schema = Self::of_kind(SchemaKind::Array);
        schema.items = Some(Box::new(items));
        schema
    }

    /// Object schema; members keep the order given
    #[must_use]
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaValue)>,
        K: Into<String>,
    {
        let mut schema = Self::of_kind(SchemaKind::Object);
        schema.properties = Some(
            properties
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        );
        schema
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Restrict to a set of values
    #[must_use]
    pub fn with_enum<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the inclusive minimum
    #[must_use]
    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Set the inclusive maximum
    #[must_use]
    pub fn with_maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    /// Mark a member as required
    #[must_use]
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.insert(name.into());
        self
    }

    /// Attach a taxonomy mapping, replacing any previous one
    #[must_use]
    pub fn with_taxonomy(mut self, mapping: TaxonomyMapping) -> Self {
        self.taxonomy = Some(mapping);
        self
    }

    /// Member schema by name
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&SchemaValue> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }

    /// Whether a member is required
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// Count of taxonomy mappings in this subtree
    #[must_use]
    pub fn mapping_count(&self) -> usize {
        let own = usize::from(self.taxonomy.is_some());
        let items = self.items.as_ref().map_or(0, |i| i.mapping_count());
        let members = self
            .properties
            .iter()
            .flat_map(|p| p.values())
            .map(SchemaValue::mapping_count)
            .sum::<usize>();
        own + items + members
    }

    /// Render as a JSON Schema document (taxonomy under `x-taxonomy`)
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json_schema(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Read a schema from a JSON Schema document
    ///
    /// # Errors
    ///
    /// Returns error if the document does not have the expected shape
    pub fn from_json_schema(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
