//! Taxonomy materializer.
//!
//! Walks an output document alongside its compiled schema and applies every
//! mapping it meets. Data problems never fail a run: an unresolved identity
//! drops that node, an unresolved property is omitted, an unresolved
//! endpoint drops that edge instance, and a value of the wrong kind skips
//! its subtree. Each case is counted in [`MaterializeStats`].
//!
//! [`MaterializeStats`]: crate::graph::MaterializeStats

use crate::config::MaterializeConfig;
use crate::graph::{Edge, GraphBuilder, MaterializedGraph};
use crate::resolver::{cartesian, property_value, render, resolve_all, stringify, Env};
use recon_core::ExecutionContext;
use recon_schema::{
    compile, json_type_name, CompiledIdentity, CompiledMapping, CompiledNode, CompiledNodeRef,
    CompiledRelationship, CompiledSchema, SchemaError, SchemaValue,
};
use serde_json::Value;

/// Compile `schema` and materialize `document` with the default config
///
/// # Errors
///
/// Returns error if the schema declaration is malformed
pub fn materialize(
    document: &Value,
    schema: &SchemaValue,
    context: &ExecutionContext,
) -> Result<MaterializedGraph, SchemaError> {
    let compiled = compile(schema)?.schema;
    Ok(Materializer::default().materialize(document, &compiled, context))
}

/// Applies compiled taxonomy mappings to documents
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    config: MaterializeConfig,
}

impl Materializer {
    /// Create a materializer; a zero fan-out cap is raised to one
    #[must_use]
    pub fn new(config: MaterializeConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &MaterializeConfig {
        &self.config
    }

    /// Materialize one document.
    ///
    /// Nodes and edges come out in first-encounter order: object members in
    /// declared schema order, array elements in document order.
    #[must_use]
    pub fn materialize(
        &self,
        document: &Value,
        schema: &CompiledSchema,
        context: &ExecutionContext,
    ) -> MaterializedGraph {
        let span = tracing::debug_span!("materialize", mappings = schema.mapping_count());
        let _entered = span.enter();

        let context = context.to_value();
        let mut walk = Walk {
            config: &self.config,
            builder: GraphBuilder::default(),
        };
        walk.visit(schema.root(), Env::at_root(document, &context));

        let graph = walk.builder.finish(self.config.flag_dangling);
        tracing::debug!(
            nodes = graph.stats.nodes,
            edges = graph.stats.edges,
            nodes_dropped = graph.stats.nodes_dropped,
            edges_dropped = graph.stats.edges_dropped,
            "materialized graph"
        );
        graph
    }
}

struct ResolvedIdentity {
    value: String,
    fields: Vec<(String, Value)>,
}

struct Walk<'c> {
    config: &'c MaterializeConfig,
    builder: GraphBuilder,
}

impl Walk<'_> {
    fn visit(&mut self, node: &CompiledNode, env: Env<'_>) {
        let value = env.current;
        if value.is_null() {
            return;
        }
        if !node.kind.matches(value) {
            self.builder.stats.kind_mismatches += 1;
            tracing::trace!(
                path = %node.path,
                expected = %node.kind,
                found = json_type_name(value),
                "kind mismatch, skipping subtree"
            );
            return;
        }

        if let Some(mapping) = &node.taxonomy {
            self.apply(mapping, &env);
        }

        match value {
            Value::Array(items) => {
                if let Some(item_node) = &node.items {
                    for item in items {
                        self.visit(item_node, env.descend(item, env.parent));
                    }
                }
            }
            Value::Object(members) => {
                for (name, member_node) in &node.properties {
                    if let Some(member) = members.get(name) {
                        self.visit(member_node, env.descend(member, Some(value)));
                    }
                }
            }
            _ => {}
        }
    }

    fn apply(&mut self, mapping: &CompiledMapping, env: &Env<'_>) {
        let identities = self.identities(&mapping.node_type, &mapping.identity, env);

        if identities.is_empty() {
            self.builder.stats.nodes_dropped += 1;
            tracing::trace!(node_type = %mapping.node_type, "identity unresolved, node dropped");
        } else {
            let properties = self.properties(mapping, env);
            for identity in &identities {
                let writes = identity
                    .fields
                    .iter()
                    .chain(properties.iter())
                    .cloned();
                self.builder
                    .upsert_node(&mapping.node_type, &identity.value, writes);
            }
        }

        for relationship in &mapping.relationships {
            self.relate(relationship, &mapping.node_type, &identities, env);
        }
    }

    fn identities(
        &mut self,
        node_type: &str,
        identity: &CompiledIdentity,
        env: &Env<'_>,
    ) -> Vec<ResolvedIdentity> {
        match identity {
            CompiledIdentity::Template(template) => {
                let rendered = render(template, env, self.config.max_fanout);
                self.note_truncation(rendered.truncated);
                rendered
                    .items
                    .into_iter()
                    .map(|value| ResolvedIdentity {
                        value,
                        fields: Vec::new(),
                    })
                    .collect()
            }
            CompiledIdentity::Fields(fields) => {
                let columns: Vec<Vec<(String, Value)>> = fields
                    .iter()
                    .map(|(_, reference)| {
                        resolve_all(reference, env)
                            .into_iter()
                            .filter_map(|v| stringify(v).map(|text| (text, v.clone())))
                            .collect()
                    })
                    .collect();
                let rows = cartesian(&columns, self.config.max_fanout);
                self.note_truncation(rows.truncated);
                rows.items
                    .into_iter()
                    .map(|row| {
                        let value = match row.as_slice() {
                            [(text, _)] => format!("{}:{}", node_type, text),
                            _ => {
                                let pairs: Vec<String> = fields
                                    .iter()
                                    .zip(&row)
                                    .map(|((name, _), (text, _))| format!("{}={}", name, text))
                                    .collect();
                                format!("{}:{}", node_type, pairs.join(";"))
                            }
                        };
                        let fields = fields
                            .iter()
                            .zip(row)
                            .map(|((name, _), (_, v))| (name.clone(), v))
                            .collect();
                        ResolvedIdentity { value, fields }
                    })
                    .collect()
            }
        }
    }

    fn properties(&mut self, mapping: &CompiledMapping, env: &Env<'_>) -> Vec<(String, Value)> {
        let mut resolved = Vec::with_capacity(mapping.properties.len());
        for property in &mapping.properties {
            match property_value(&property.source, env) {
                Some(value) => {
                    let value = match property.transform {
                        Some(transform) => transform.apply(value),
                        None => value,
                    };
                    resolved.push((property.target.clone(), value));
                }
                None => {
                    self.builder.stats.properties_omitted += 1;
                    tracing::trace!(
                        node_type = %mapping.node_type,
                        property = %property.target,
                        "source unresolved, property omitted"
                    );
                }
            }
        }
        resolved
    }

    fn endpoints(
        &mut self,
        node_ref: &CompiledNodeRef,
        self_type: &str,
        self_ids: &[ResolvedIdentity],
        env: &Env<'_>,
    ) -> Vec<(String, String)> {
        match node_ref {
            CompiledNodeRef::SelfNode => self_ids
                .iter()
                .map(|id| (self_type.to_string(), id.value.clone()))
                .collect(),
            CompiledNodeRef::Foreign {
                node_type,
                identity,
            } => self
                .identities(node_type, identity, env)
                .into_iter()
                .map(|id| (node_type.clone(), id.value))
                .collect(),
        }
    }

    fn relate(
        &mut self,
        relationship: &CompiledRelationship,
        self_type: &str,
        self_ids: &[ResolvedIdentity],
        env: &Env<'_>,
    ) {
        let from = self.endpoints(&relationship.from, self_type, self_ids, env);
        let to = self.endpoints(&relationship.to, self_type, self_ids, env);
        if from.is_empty() || to.is_empty() {
            self.builder.stats.edges_dropped += 1;
            tracing::trace!(
                relationship = %relationship.relationship,
                "endpoint unresolved, edge dropped"
            );
            return;
        }

        let mut emitted = 0;
        'pairs: for (from_type, from_identity) in &from {
            for (to_type, to_identity) in &to {
                if emitted == self.config.max_fanout {
                    self.note_truncation(true);
                    break 'pairs;
                }
                self.builder.push_edge(
                    Edge {
                        relationship: relationship.relationship.clone(),
                        from_type: from_type.clone(),
                        from_identity: from_identity.clone(),
                        to_type: to_type.clone(),
                        to_identity: to_identity.clone(),
                        dangling: false,
                    },
                    self.config.dedup_edges,
                );
                emitted += 1;
            }
        }
    }

    fn note_truncation(&mut self, truncated: bool) {
        if truncated {
            self.builder.stats.fanout_truncated += 1;
            tracing::debug!(max_fanout = self.config.max_fanout, "fan-out truncated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use recon_schema::{node, prop_map, prop_map_with_transform, rel, rel_nodes, self_node, TaxonomyMapping};
    use serde_json::json;

    fn run(document: Value, schema: &SchemaValue) -> MaterializedGraph {
        let context = ExecutionContext::new().with_agent_run_id("run-1");
        materialize(&document, schema, &context).unwrap()
    }

    fn domain_schema() -> SchemaValue {
        SchemaValue::object([(
            "domain",
            SchemaValue::string().with_taxonomy(
                TaxonomyMapping::new("domain", "domain:{.}").with_property(prop_map(".", "name")),
            ),
        )])
    }

    #[test]
    fn test_bare_string_domain() {
        let graph = run(json!({"domain": "example.com"}), &domain_schema());
        assert_eq!(graph.nodes.len(), 1);
        let node = &graph.nodes[0];
        assert_eq!(node.node_type, "domain");
        assert_eq!(node.identity, "domain:example.com");
        assert_eq!(node.properties.len(), 1);
        assert_eq!(node.property("name"), Some(&json!("example.com")));
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_no_implicit_name_property() {
        let schema = SchemaValue::object([(
            "domain",
            SchemaValue::string().with_taxonomy(TaxonomyMapping::new("domain", "domain:{.}")),
        )]);
        let graph = run(json!({"domain": "example.com"}), &schema);
        assert!(graph.nodes[0].properties.is_empty());
    }

    #[test]
    fn test_serves_certificate_edge() {
        let schema = SchemaValue::object([
            ("target", SchemaValue::string()),
            (
                "certificate",
                SchemaValue::object([("subject", SchemaValue::string())]),
            ),
        ])
        .with_taxonomy(
            TaxonomyMapping::new("endpoint", "endpoint:{.target}").with_relationship(rel_nodes(
                "SERVES_CERTIFICATE",
                self_node(),
                recon_schema::template_node("certificate:{.certificate.subject}"),
            )),
        );
        let graph = run(
            json!({"target": "example.com:443", "certificate": {"subject": "CN=example.com"}}),
            &schema,
        );
        assert_eq!(graph.edges.len(), 1);
        let edge = &graph.edges[0];
        assert_eq!(edge.relationship, "SERVES_CERTIFICATE");
        assert_eq!(edge.from_identity, "endpoint:example.com:443");
        assert_eq!(edge.to_type, "certificate");
        assert_eq!(edge.to_identity, "certificate:CN=example.com");
        assert!(edge.dangling);
    }

    fn vulnerability_schema() -> SchemaValue {
        let vulnerability = SchemaValue::object([
            ("id", SchemaValue::string()),
            ("severity", SchemaValue::string()),
        ])
        .with_taxonomy(
            TaxonomyMapping::new("vulnerability", "vulnerability:{.id}:{_parent.target}")
                .with_property(prop_map("id", "vulnerability_id"))
                .with_property(prop_map_with_transform("severity", "severity", "lowercase"))
                .with_relationship(rel(
                    "HAS_VULNERABILITY",
                    "endpoint:{_parent.target}",
                    "vulnerability:{.id}:{_parent.target}",
                )),
        );
        SchemaValue::object([
            (
                "target",
                SchemaValue::string().with_taxonomy(TaxonomyMapping::new("endpoint", "endpoint:{.}")),
            ),
            ("vulnerabilities", SchemaValue::array(vulnerability)),
        ])
    }

    #[test]
    fn test_empty_identity_drops_only_that_node() {
        let graph = run(
            json!({
                "target": "example.com",
                "vulnerabilities": [
                    {"id": "", "severity": "HIGH"},
                    {"id": "CVE-2024-1", "severity": "HIGH"}
                ]
            }),
            &vulnerability_schema(),
        );
        let vulns: Vec<_> = graph.nodes_of_type("vulnerability").collect();
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0].identity, "vulnerability:CVE-2024-1:example.com");
        assert_eq!(vulns[0].property("severity"), Some(&json!("high")));
        assert_eq!(graph.stats.nodes_dropped, 1);

        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.stats.edges_dropped, 1);
        assert!(!graph.edges[0].dangling);
    }

    #[test]
    fn test_missing_property_is_omitted() {
        let graph = run(
            json!({"target": "example.com", "vulnerabilities": [{"id": "CVE-1"}]}),
            &vulnerability_schema(),
        );
        let node = graph
            .node("vulnerability", "vulnerability:CVE-1:example.com")
            .unwrap();
        assert!(node.property("severity").is_none());
        assert_eq!(node.property("vulnerability_id"), Some(&json!("CVE-1")));
        assert_eq!(graph.stats.properties_omitted, 1);
    }

    fn resolves_schema(to: recon_schema::NodeRef) -> SchemaValue {
        SchemaValue::object([
            ("name", SchemaValue::string()),
            ("ips", SchemaValue::array(SchemaValue::string())),
        ])
        .with_taxonomy(
            TaxonomyMapping::new("subdomain", "subdomain:{.name}")
                .with_relationship(rel_nodes("RESOLVES_TO", self_node(), to)),
        )
    }

    #[test]
    fn test_wildcard_fanout_edges() {
        let document = json!({"name": "example.com", "ips": ["1.1.1.1", "2.2.2.2"]});
        for to in [
            node("ip", [("address", "ips[*]")]),
            recon_schema::template_node("ip:{.ips[*]}"),
        ] {
            let graph = run(document.clone(), &resolves_schema(to));
            assert_eq!(graph.edges.len(), 2);
            assert!(graph
                .edges
                .iter()
                .all(|e| e.from_identity == "subdomain:example.com"));
            assert_eq!(graph.edges[0].to_identity, "ip:1.1.1.1");
            assert_eq!(graph.edges[1].to_identity, "ip:2.2.2.2");
        }
    }

    #[test]
    fn test_wildcard_fanout_cap() {
        let document = json!({"name": "example.com", "ips": ["1.1.1.1", "2.2.2.2", "3.3.3.3"]});
        let compiled = compile(&resolves_schema(recon_schema::template_node("ip:{.ips[*]}")))
            .unwrap()
            .schema;
        let graph = Materializer::new(MaterializeConfig::default().with_max_fanout(2)).materialize(
            &document,
            &compiled,
            &ExecutionContext::new(),
        );
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.stats.fanout_truncated, 1);
    }

    #[test]
    fn test_identifying_fields_identity() {
        let service = SchemaValue::object([
            ("port", SchemaValue::integer()),
            ("protocol", SchemaValue::string()),
        ])
        .with_taxonomy(TaxonomyMapping::identified_by(
            "port",
            [("number", "$.port"), ("protocol", "$.protocol")],
        ));
        let schema = SchemaValue::object([("ports", SchemaValue::array(service))]);
        let graph = run(
            json!({"ports": [{"port": 443, "protocol": "tcp"}, {"port": 53}]}),
            &schema,
        );
        assert_eq!(graph.nodes.len(), 1);
        let node = &graph.nodes[0];
        assert_eq!(node.identity, "port:number=443;protocol=tcp");
        assert_eq!(node.property("number"), Some(&json!(443)));
        assert_eq!(node.property("protocol"), Some(&json!("tcp")));

        let single = SchemaValue::object([("url", SchemaValue::string())])
            .with_taxonomy(TaxonomyMapping::identified_by("endpoint", [("url", "$.url")]));
        let graph = run(json!({"url": "https://a.com"}), &single);
        assert_eq!(graph.nodes[0].identity, "endpoint:https://a.com");
    }

    #[test]
    fn test_duplicate_identity_last_write_wins() {
        let host = SchemaValue::object([
            ("ip", SchemaValue::string()),
            ("os", SchemaValue::string()),
            ("ttl", SchemaValue::integer()),
        ])
        .with_taxonomy(
            TaxonomyMapping::new("host", "host:{.ip}")
                .with_property(prop_map("os", "os"))
                .with_property(prop_map("ttl", "ttl")),
        );
        let schema = SchemaValue::object([("hosts", SchemaValue::array(host))]);
        let graph = run(
            json!({"hosts": [
                {"ip": "1.2.3.4", "os": "linux", "ttl": 64},
                {"ip": "1.2.3.4", "os": "freebsd"}
            ]}),
            &schema,
        );
        assert_eq!(graph.nodes.len(), 1);
        let node = &graph.nodes[0];
        assert_eq!(node.property("os"), Some(&json!("freebsd")));
        assert_eq!(node.property("ttl"), Some(&json!(64)));
        assert_eq!(graph.stats.nodes_merged, 1);
    }

    #[test]
    fn test_context_and_root_scopes() {
        let subdomain = SchemaValue::string().with_taxonomy(
            TaxonomyMapping::new("subdomain", "subdomain:{.}")
                .with_relationship(rel("HAS_SUBDOMAIN", "domain:{_root.domain}", "subdomain:{.}"))
                .with_relationship(rel(
                    "DISCOVERED",
                    "agent_run:{_context.agent_run_id}",
                    "subdomain:{.}",
                )),
        );
        let schema = SchemaValue::object([
            (
                "domain",
                SchemaValue::string().with_taxonomy(TaxonomyMapping::new("domain", "domain:{.}")),
            ),
            ("subdomains", SchemaValue::array(subdomain)),
        ]);
        let graph = run(
            json!({"domain": "example.com", "subdomains": ["a.example.com", "b.example.com"]}),
            &schema,
        );
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges_of_type("HAS_SUBDOMAIN").count(), 2);
        let discovered: Vec<_> = graph.edges_of_type("DISCOVERED").collect();
        assert_eq!(discovered[0].from_identity, "agent_run:run-1");
        assert!(discovered[0].dangling);
        assert!(graph.edges_of_type("HAS_SUBDOMAIN").all(|e| !e.dangling));
    }

    #[test]
    fn test_parent_skips_arrays() {
        let leaf = SchemaValue::string().with_taxonomy(
            TaxonomyMapping::new("technology", "technology:{.}")
                .with_relationship(rel("USES_TECHNOLOGY", "endpoint:{_parent.url}", "technology:{.}")),
        );
        let schema = SchemaValue::object([(
            "results",
            SchemaValue::array(SchemaValue::object([
                ("url", SchemaValue::string()),
                ("tech", SchemaValue::array(leaf)),
            ])),
        )]);
        let graph = run(
            json!({"results": [{"url": "https://a.com", "tech": ["nginx", "php"]}]}),
            &schema,
        );
        let edges: Vec<_> = graph.edges_of_type("USES_TECHNOLOGY").collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].from_identity, "endpoint:https://a.com");
    }

    #[test]
    fn test_unresolved_parent_still_visits_children() {
        let endpoint = SchemaValue::object([
            ("url", SchemaValue::string()),
            (
                "tech",
                SchemaValue::array(
                    SchemaValue::string()
                        .with_taxonomy(TaxonomyMapping::new("technology", "technology:{.}")),
                ),
            ),
        ])
        .with_taxonomy(TaxonomyMapping::new("endpoint", "endpoint:{.url}"));
        let schema = SchemaValue::object([("results", SchemaValue::array(endpoint))]);

        let graph = run(json!({"results": [{"tech": ["nginx"]}]}), &schema);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].identity, "technology:nginx");
        assert_eq!(graph.nodes_of_type("endpoint").count(), 0);
        assert_eq!(graph.stats.nodes_dropped, 1);
    }

    #[test]
    fn test_zero_fanout_config_keeps_nodes() {
        let compiled = compile(&SchemaValue::object([
            (
                "domain",
                SchemaValue::string()
                    .with_taxonomy(TaxonomyMapping::new("domain", "domain:{.}")),
            ),
            (
                "subdomains",
                SchemaValue::array(
                    SchemaValue::string()
                        .with_taxonomy(TaxonomyMapping::new("subdomain", "subdomain:{.}")),
                ),
            ),
        ]))
        .unwrap()
        .schema;
        let document = json!({"domain": "a.com", "subdomains": ["x.a.com"]});
        let context = ExecutionContext::new();

        let parsed = MaterializeConfig::from_json(r#"{"max_fanout": 0}"#).unwrap();
        let literal = MaterializeConfig {
            max_fanout: 0,
            ..MaterializeConfig::default()
        };
        for config in [parsed, literal] {
            let materializer = Materializer::new(config);
            assert_eq!(materializer.config().max_fanout, 1);
            let graph = materializer.materialize(&document, &compiled, &context);
            assert_eq!(graph.nodes.len(), 2);
            assert_eq!(graph.stats.nodes_dropped, 0);
        }
    }

    #[test]
    fn test_kind_mismatch_skips_subtree() {
        let graph = run(json!({"domain": 42}), &domain_schema());
        assert!(graph.is_empty());
        assert_eq!(graph.stats.kind_mismatches, 1);

        let graph = run(json!("not an object"), &domain_schema());
        assert!(graph.is_empty());
        assert_eq!(graph.stats.kind_mismatches, 1);
    }

    #[test]
    fn test_malformed_schema_is_an_error() {
        let mut schema = domain_schema();
        schema.kind = recon_schema::SchemaKind::Array;
        assert!(materialize(&json!({}), &schema, &ExecutionContext::new()).is_err());
    }

    #[test]
    fn test_edge_dedup_toggle() {
        let subdomain = SchemaValue::string().with_taxonomy(
            TaxonomyMapping::new("subdomain", "subdomain:{.}")
                .with_relationship(rel("HAS_SUBDOMAIN", "domain:{_root.domain}", "subdomain:{.}")),
        );
        let schema = compile(&SchemaValue::object([
            ("domain", SchemaValue::string()),
            ("subdomains", SchemaValue::array(subdomain)),
        ]))
        .unwrap()
        .schema;
        let document = json!({"domain": "a.com", "subdomains": ["x.a.com", "x.a.com"]});
        let context = ExecutionContext::new();

        let graph = Materializer::default().materialize(&document, &schema, &context);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.stats.edges_deduplicated, 1);
        assert_eq!(graph.nodes.len(), 1);

        let graph = Materializer::new(MaterializeConfig::default().with_dedup_edges(false))
            .materialize(&document, &schema, &context);
        assert_eq!(graph.edges.len(), 2);
    }

    fn scan_schema() -> CompiledSchema {
        let host = SchemaValue::object([
            ("ip", SchemaValue::string()),
            ("ports", SchemaValue::array(SchemaValue::integer())),
        ])
        .with_taxonomy(
            TaxonomyMapping::new("host", "host:{.ip}")
                .with_property(prop_map("ports[*]", "open_ports"))
                .with_relationship(rel("HAS_PORT", "host:{.ip}", "port:{.ip}:{.ports[*]}"))
                .with_relationship(rel("RESOLVES_TO", "domain:{_root.domain}", "host:{.ip}")),
        );
        let subdomain = SchemaValue::string().with_taxonomy(
            TaxonomyMapping::new("subdomain", "subdomain:{.}")
                .with_property(prop_map(".", "name"))
                .with_relationship(rel("HAS_SUBDOMAIN", "domain:{_root.domain}", "subdomain:{.}")),
        );
        let schema = SchemaValue::object([
            (
                "domain",
                SchemaValue::string().with_taxonomy(TaxonomyMapping::new("domain", "domain:{.}")),
            ),
            ("subdomains", SchemaValue::array(subdomain)),
            ("hosts", SchemaValue::array(host)),
        ]);
        compile(&schema).unwrap().schema
    }

    fn arb_document() -> impl Strategy<Value = Value> {
        let label = "[a-c]{0,2}";
        let host = (
            proptest::option::of("10\\.0\\.0\\.[1-3]"),
            proptest::collection::vec(1u16..4, 0..3),
        )
            .prop_map(|(ip, ports)| json!({"ip": ip, "ports": ports}));
        (
            label,
            proptest::collection::vec(label, 0..6),
            proptest::collection::vec(host, 0..5),
        )
            .prop_map(|(domain, subdomains, hosts)| {
                json!({"domain": domain, "subdomains": subdomains, "hosts": hosts})
            })
    }

    proptest! {
        #[test]
        fn prop_node_keys_unique(document in arb_document()) {
            let graph = Materializer::default().materialize(&document, &scan_schema(), &ExecutionContext::new());
            let mut keys: Vec<_> = graph.nodes.iter().map(|n| (&n.node_type, &n.identity)).collect();
            let total = keys.len();
            keys.sort();
            keys.dedup();
            prop_assert_eq!(keys.len(), total);
        }

        #[test]
        fn prop_materialize_is_idempotent(document in arb_document()) {
            let schema = scan_schema();
            let context = ExecutionContext::new().with_agent_run_id("run-1");
            let first = Materializer::default().materialize(&document, &schema, &context);
            let second = Materializer::default().materialize(&document, &schema, &context);
            prop_assert_eq!(first.digest().unwrap(), second.digest().unwrap());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_edges_reference_node_identities(document in arb_document()) {
            let graph = Materializer::default().materialize(&document, &scan_schema(), &ExecutionContext::new());
            for edge in &graph.edges {
                let both = graph.node(&edge.from_type, &edge.from_identity).is_some()
                    && graph.node(&edge.to_type, &edge.to_identity).is_some();
                prop_assert_eq!(edge.dangling, !both);
            }
            for edge in graph.edges_of_type("HAS_SUBDOMAIN") {
                prop_assert!(!edge.dangling);
                let subdomain = graph.node("subdomain", &edge.to_identity);
                prop_assert!(subdomain.is_some());
                let expected = subdomain
                    .and_then(|n| n.property("name"))
                    .and_then(Value::as_str)
                    .map(|name| format!("subdomain:{}", name));
                prop_assert_eq!(Some(edge.to_identity.clone()), expected);
            }
        }
    }
}
