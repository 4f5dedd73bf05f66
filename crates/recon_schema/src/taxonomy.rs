//! Taxonomy mappings: how schema values become graph nodes and edges.
//!
//! These are plain declarations holding the author's source text. They are
//! checked and parsed by [`crate::compiler::compile`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Declarative graph mapping attached to a schema value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyMapping {
    /// Graph node type, e.g. `host`
    pub node_type: String,
    /// How the node identity is derived
    pub identity: IdentitySpec,
    /// Source fields copied onto the node
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyMapping>,
    /// Edges created from this position
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipMapping>,
}

impl TaxonomyMapping {
    /// Mapping whose identity is an ID template such as `host:{.ip}`
    #[must_use]
    pub fn new(node_type: impl Into<String>, id_template: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            identity: IdentitySpec::Template(id_template.into()),
            properties: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Mapping identified by named field references
    #[must_use]
    pub fn identified_by<I, K, V>(node_type: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            node_type: node_type.into(),
            identity: IdentitySpec::fields(fields),
            properties: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Add a property mapping
    #[must_use]
    pub fn with_property(mut self, property: PropertyMapping) -> Self {
        self.properties.push(property);
        self
    }

    /// Add several property mappings
    #[must_use]
    pub fn with_properties(mut self, properties: impl IntoIterator<Item = PropertyMapping>) -> Self {
        self.properties.extend(properties);
        self
    }

    /// Add a relationship
    #[must_use]
    pub fn with_relationship(mut self, relationship: RelationshipMapping) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Add several relationships
    #[must_use]
    pub fn with_relationships(
        mut self,
        relationships: impl IntoIterator<Item = RelationshipMapping>,
    ) -> Self {
        self.relationships.extend(relationships);
        self
    }
}

/// Identity derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySpec {
    /// Template whose rendering is the identity
    Template(String),
    /// Named identifying fields; the identity is their tuple
    Fields(BTreeMap<String, String>),
}

impl IdentitySpec {
    /// Template identity
    #[must_use]
    pub fn template(template: impl Into<String>) -> Self {
        Self::Template(template.into())
    }

    /// Identifying-fields identity
    #[must_use]
    pub fn fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fields(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Copy of one source field onto a node property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMapping {
    /// Field reference to read
    pub source: String,
    /// Node property to write
    pub target: String,
    /// Optional named transform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
}

/// Copy `source` to property `target`
#[must_use]
pub fn prop_map(source: impl Into<String>, target: impl Into<String>) -> PropertyMapping {
    PropertyMapping {
        source: source.into(),
        target: target.into(),
        transform: None,
    }
}

/// Copy `source` to property `target` through a named transform
#[must_use]
pub fn prop_map_with_transform(
    source: impl Into<String>,
    target: impl Into<String>,
    transform: impl Into<String>,
) -> PropertyMapping {
    PropertyMapping {
        source: source.into(),
        target: target.into(),
        transform: Some(transform.into()),
    }
}

/// Edge declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipMapping {
    /// Edge type, e.g. `HAS_SUBDOMAIN`
    #[serde(rename = "type")]
    pub relationship: String,
    /// Source endpoint
    pub from: NodeRef,
    /// Target endpoint
    pub to: NodeRef,
}

/// Endpoint of a relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeRef {
    /// The node built by the enclosing mapping
    #[serde(rename = "self")]
    SelfNode,
    /// A node given by an ID template; its type is the template's literal
    /// prefix (`endpoint` in `endpoint:{_parent.url}`)
    Template { template: String },
    /// A node of an explicit type identified like a mapping identity
    Node {
        node_type: String,
        identity: IdentitySpec,
    },
}

/// The enclosing mapping's node
#[must_use]
pub fn self_node() -> NodeRef {
    NodeRef::SelfNode
}

/// A node of `node_type` identified by named field references
#[must_use]
pub fn node<I, K, V>(node_type: impl Into<String>, fields: I) -> NodeRef
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    NodeRef::Node {
        node_type: node_type.into(),
        identity: IdentitySpec::fields(fields),
    }
}

/// A node given by an ID template
#[must_use]
pub fn template_node(template: impl Into<String>) -> NodeRef {
    NodeRef::Template {
        template: template.into(),
    }
}

/// Relationship between two ID templates
#[must_use]
pub fn rel(
    relationship: impl Into<String>,
    from_template: impl Into<String>,
    to_template: impl Into<String>,
) -> RelationshipMapping {
    rel_nodes(
        relationship,
        template_node(from_template),
        template_node(to_template),
    )
}

/// Relationship between two node references
#[must_use]
pub fn rel_nodes(relationship: impl Into<String>, from: NodeRef, to: NodeRef) -> RelationshipMapping {
    RelationshipMapping {
        relationship: relationship.into(),
        from,
        to,
    }
}

/// Named value transform applied to copied properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    /// ASCII/Unicode lowercase
    Lowercase,
    /// Uppercase
    Uppercase,
    /// Strip surrounding whitespace
    Trim,
}

impl Transform {
    /// Look up a transform by name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lowercase" => Some(Self::Lowercase),
            "uppercase" => Some(Self::Uppercase),
            "trim" => Some(Self::Trim),
            _ => None,
        }
    }

    /// Transform name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Lowercase => "lowercase",
            Self::Uppercase => "uppercase",
            Self::Trim => "trim",
        }
    }

    /// Apply to a value. Strings are transformed, arrays element-wise;
    /// anything else passes through unchanged.
    #[must_use]
    pub fn apply(self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(match self {
                Self::Lowercase => s.to_lowercase(),
                Self::Uppercase => s.to_uppercase(),
                Self::Trim => s.trim().to_string(),
            }),
            Value::Array(items) => Value::Array(items.into_iter().map(|v| self.apply(v)).collect()),
            other => other,
        }
    }
}
