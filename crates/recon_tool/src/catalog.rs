//! Descriptors for the bundled reconnaissance and fingerprinting tools.
//!
//! Each descriptor pairs the tool's input schema with an output schema
//! whose taxonomy mappings turn a scan result into graph nodes and edges.

use crate::schema::ToolSchema;
use recon_schema::{
    node, prop_map, prop_map_with_transform, rel, rel_nodes, self_node, RelationshipMapping,
    SchemaValue, TaxonomyMapping,
};

const VERSION: &str = "1.0.0";

/// Names of all bundled tools, in catalog order
pub const TOOL_NAMES: [&str; 8] = [
    "subfinder",
    "amass",
    "httpx",
    "nuclei",
    "testssl",
    "sslyze",
    "whatweb",
    "wappalyzer",
];

/// All bundled tool descriptors
#[must_use]
pub fn all() -> Vec<ToolSchema> {
    vec![
        subfinder(),
        amass(),
        httpx(),
        nuclei(),
        testssl(),
        sslyze(),
        whatweb(),
        wappalyzer(),
    ]
}

/// Bundled descriptor by name
#[must_use]
pub fn get(name: &str) -> Option<ToolSchema> {
    match name {
        "subfinder" => Some(subfinder()),
        "amass" => Some(amass()),
        "httpx" => Some(httpx()),
        "nuclei" => Some(nuclei()),
        "testssl" => Some(testssl()),
        "sslyze" => Some(sslyze()),
        "whatweb" => Some(whatweb()),
        "wappalyzer" => Some(wappalyzer()),
        _ => None,
    }
}

fn discovered(to: &str) -> RelationshipMapping {
    rel("DISCOVERED", "agent_run:{_context.agent_run_id}", to)
}

fn timeout() -> SchemaValue {
    SchemaValue::integer().with_description("Execution timeout in seconds")
}

fn targets(description: &str) -> SchemaValue {
    SchemaValue::array(SchemaValue::string()).with_description(description)
}

fn strings() -> SchemaValue {
    SchemaValue::array(SchemaValue::string())
}

fn domain_output() -> SchemaValue {
    SchemaValue::string().with_taxonomy(
        TaxonomyMapping::new("domain", "domain:{.}")
            .with_property(prop_map(".", "name"))
            .with_relationship(discovered("domain:{.}")),
    )
}

fn subdomains_output() -> SchemaValue {
    SchemaValue::array(
        SchemaValue::string().with_taxonomy(
            TaxonomyMapping::new("subdomain", "subdomain:{.}")
                .with_property(prop_map(".", "name"))
                .with_relationships([
                    rel("HAS_SUBDOMAIN", "domain:{_root.domain}", "subdomain:{.}"),
                    discovered("subdomain:{.}"),
                ]),
        ),
    )
}

/// Passive subdomain enumeration
#[must_use]
pub fn subfinder() -> ToolSchema {
    let input = SchemaValue::object([
        (
            "domain",
            SchemaValue::string_with_desc("Target domain for subdomain enumeration"),
        ),
        ("timeout", timeout()),
        (
            "silent",
            SchemaValue::boolean()
                .with_description("Only print subdomains")
                .with_default(false),
        ),
        (
            "recursive",
            SchemaValue::boolean()
                .with_description("Use recursive enumeration")
                .with_default(false),
        ),
        (
            "all",
            SchemaValue::boolean()
                .with_description("Use every passive source")
                .with_default(true),
        ),
    ])
    .with_required("domain");

    let output = SchemaValue::object([
        ("domain", domain_output()),
        ("subdomains", subdomains_output()),
        ("count", SchemaValue::integer()),
        ("scan_time_ms", SchemaValue::integer()),
    ]);

    ToolSchema::new("subfinder", VERSION, input, output)
        .with_description("Fast passive subdomain enumeration tool")
        .with_tags(["reconnaissance", "subdomain-enumeration", "dns", "passive"])
}

/// In-depth attack surface mapping over DNS, ASN, and WHOIS sources
#[must_use]
pub fn amass() -> ToolSchema {
    let input = SchemaValue::object([
        (
            "domain",
            SchemaValue::string_with_desc("Target domain for enumeration"),
        ),
        (
            "mode",
            SchemaValue::string()
                .with_description("Enumeration mode")
                .with_enum(["passive", "active"])
                .with_default("passive"),
        ),
        ("timeout", timeout()),
        (
            "max_depth",
            SchemaValue::integer()
                .with_description("DNS recursion depth")
                .with_minimum(0.0),
        ),
        (
            "include_whois",
            SchemaValue::boolean().with_description("Include WHOIS information"),
        ),
        (
            "include_asn",
            SchemaValue::boolean().with_description("Include ASN information"),
        ),
    ])
    .with_required("domain");

    let ip = SchemaValue::string().with_taxonomy(
        TaxonomyMapping::new("host", "host:{.}")
            .with_property(prop_map(".", "ip"))
            .with_relationship(discovered("host:{.}")),
    );

    let asn = SchemaValue::object([
        ("asn", SchemaValue::integer()),
        ("description", SchemaValue::string()),
        ("country", SchemaValue::string()),
    ])
    .with_taxonomy(
        TaxonomyMapping::new("asn", "asn:{.asn}")
            .with_properties([
                prop_map("asn", "number"),
                prop_map("description", "description"),
                prop_map("country", "country"),
            ])
            .with_relationship(discovered("asn:{.asn}")),
    );

    let dns_record = SchemaValue::object([
        ("name", SchemaValue::string()),
        ("type", SchemaValue::string()),
        ("value", SchemaValue::string()),
    ])
    .with_taxonomy(
        TaxonomyMapping::new("dns_record", "dns_record:{.name}:{.type}:{.value}")
            .with_properties([
                prop_map("name", "name"),
                prop_map("type", "record_type"),
                prop_map("value", "value"),
            ])
            .with_relationship(rel(
                "HAS_DNS_RECORD",
                "subdomain:{.name}",
                "dns_record:{.name}:{.type}:{.value}",
            )),
    );

    let output = SchemaValue::object([
        ("domain", domain_output()),
        ("subdomains", subdomains_output()),
        ("ip_addresses", SchemaValue::array(ip)),
        ("asn_info", SchemaValue::array(asn)),
        ("dns_records", SchemaValue::array(dns_record)),
        (
            "whois",
            SchemaValue::object(Vec::<(String, SchemaValue)>::new()),
        ),
        ("scan_time_ms", SchemaValue::integer()),
    ]);

    ToolSchema::new("amass", VERSION, input, output)
        .with_description("In-depth attack surface mapping and asset discovery")
        .with_tags(["reconnaissance", "subdomain-enumeration", "dns", "asn"])
}

/// HTTP probing of discovered hosts
#[must_use]
pub fn httpx() -> ToolSchema {
    let input = SchemaValue::object([
        ("targets", targets("Hosts or URLs to probe")),
        ("timeout", timeout()),
        (
            "follow_redirects",
            SchemaValue::boolean().with_default(true),
        ),
        ("status_code", SchemaValue::boolean().with_default(true)),
        ("title", SchemaValue::boolean().with_default(true)),
        ("tech_detect", SchemaValue::boolean().with_default(false)),
    ])
    .with_required("targets");

    let technology = SchemaValue::string().with_taxonomy(
        TaxonomyMapping::new("technology", "technology:{.}")
            .with_property(prop_map(".", "name"))
            .with_relationship(rel(
                "USES_TECHNOLOGY",
                "endpoint:{_parent.url}",
                "technology:{.}",
            )),
    );

    let result = SchemaValue::object([
        ("url", SchemaValue::string()),
        ("status_code", SchemaValue::integer()),
        ("title", SchemaValue::string()),
        ("content_type", SchemaValue::string()),
        ("technologies", SchemaValue::array(technology)),
    ])
    .with_taxonomy(
        TaxonomyMapping::new("endpoint", "endpoint:{.url}")
            .with_properties([
                prop_map("url", "url"),
                prop_map("status_code", "status_code"),
                prop_map("title", "page_title"),
                prop_map("content_type", "content_type"),
            ])
            .with_relationship(discovered("endpoint:{.url}")),
    );

    let output = SchemaValue::object([
        ("results", SchemaValue::array(result)),
        ("total_probed", SchemaValue::integer()),
        ("alive_count", SchemaValue::integer()),
        ("scan_time_ms", SchemaValue::integer()),
    ]);

    ToolSchema::new("httpx", VERSION, input, output)
        .with_description("Multi-purpose HTTP toolkit for probing live web services")
        .with_tags(["reconnaissance", "http", "web"])
}

/// Template based vulnerability scanning
#[must_use]
pub fn nuclei() -> ToolSchema {
    let input = SchemaValue::object([
        ("target", SchemaValue::string_with_desc("Target URL or host to scan")),
        (
            "templates",
            strings().with_description("Specific template IDs to use"),
        ),
        (
            "severity",
            strings().with_description("Filter templates by severity"),
        ),
        ("tags", strings().with_description("Filter templates by tags")),
        ("timeout", timeout()),
        (
            "rate_limit",
            SchemaValue::integer()
                .with_description("Maximum requests per second")
                .with_minimum(1.0)
                .with_default(150),
        ),
    ])
    .with_required("target");

    let finding = SchemaValue::object([
        ("template_id", SchemaValue::string()),
        ("template_name", SchemaValue::string()),
        ("severity", SchemaValue::string()),
        ("type", SchemaValue::string()),
        ("matched_at", SchemaValue::string()),
        ("extracted", strings()),
    ])
    .with_taxonomy(
        TaxonomyMapping::new("finding", "finding:{.template_id}:{.matched_at}")
            .with_properties([
                prop_map("template_id", "template_id"),
                prop_map("template_name", "title"),
                prop_map_with_transform("severity", "severity", "lowercase"),
                prop_map("type", "category"),
                prop_map("matched_at", "affected_component"),
            ])
            .with_relationships([
                rel(
                    "AFFECTS",
                    "finding:{.template_id}:{.matched_at}",
                    "endpoint:{.matched_at}",
                ),
                discovered("finding:{.template_id}:{.matched_at}"),
            ]),
    );

    let output = SchemaValue::object([
        ("target", SchemaValue::string()),
        ("findings", SchemaValue::array(finding)),
        ("total_findings", SchemaValue::integer()),
        ("scan_time_ms", SchemaValue::integer()),
    ]);

    ToolSchema::new("nuclei", VERSION, input, output)
        .with_description("Template based vulnerability scanner")
        .with_tags(["reconnaissance", "vulnerability-detection", "web"])
}

fn ssl_entry() -> SchemaValue {
    SchemaValue::object([
        ("name", SchemaValue::string()),
        ("severity", SchemaValue::string()),
        ("finding", SchemaValue::string()),
    ])
}

fn vulnerability_fields() -> SchemaValue {
    SchemaValue::object([
        ("id", SchemaValue::string()),
        ("severity", SchemaValue::string()),
        ("finding", SchemaValue::string()),
        ("cve", SchemaValue::string()),
        ("description", SchemaValue::string()),
    ])
}

fn vulnerability_properties() -> TaxonomyMapping {
    TaxonomyMapping::new("vulnerability", "vulnerability:{.id}:{_parent.target}").with_properties([
        prop_map("id", "vulnerability_id"),
        prop_map("severity", "severity"),
        prop_map("finding", "finding"),
        prop_map("cve", "cve"),
        prop_map("description", "description"),
    ])
}

fn certificate_fields() -> SchemaValue {
    SchemaValue::object([
        ("subject", SchemaValue::string()),
        ("issuer", SchemaValue::string()),
        ("not_before", SchemaValue::string()),
        ("not_after", SchemaValue::string()),
        ("sans", strings()),
        ("expired", SchemaValue::boolean()),
    ])
}

fn ssl_result(
    vulnerability: SchemaValue,
    certificate: SchemaValue,
    endpoint: TaxonomyMapping,
) -> SchemaValue {
    SchemaValue::object([
        ("target", SchemaValue::string()),
        ("ip", SchemaValue::string()),
        ("port", SchemaValue::integer()),
        ("protocols", SchemaValue::array(ssl_entry())),
        ("ciphers", SchemaValue::array(ssl_entry())),
        ("certificate", certificate),
        ("vulnerabilities", SchemaValue::array(vulnerability)),
    ])
    .with_taxonomy(endpoint)
}

fn ssl_output(result: SchemaValue) -> SchemaValue {
    SchemaValue::object([
        ("results", SchemaValue::array(result)),
        ("total_scanned", SchemaValue::integer()),
        ("scan_time_ms", SchemaValue::integer()),
    ])
}

const SSL_TAGS: [&str; 4] = [
    "fingerprinting",
    "ssl-tls",
    "security-testing",
    "vulnerability-detection",
];

/// SSL/TLS configuration testing, template identities
#[must_use]
pub fn testssl() -> ToolSchema {
    let input = SchemaValue::object([
        (
            "targets",
            targets("Hosts or URLs to test, as hostname:port or URL"),
        ),
        ("timeout", timeout()),
        (
            "severity",
            SchemaValue::string()
                .with_description("Minimum severity level to include")
                .with_enum(["LOW", "MEDIUM", "HIGH", "CRITICAL"])
                .with_default("LOW"),
        ),
    ])
    .with_required("targets");

    let vulnerability = vulnerability_fields().with_taxonomy(
        vulnerability_properties().with_relationship(rel(
            "HAS_VULNERABILITY",
            "endpoint:{_parent.target}",
            "vulnerability:{.id}:{_parent.target}",
        )),
    );

    let certificate = certificate_fields().with_taxonomy(
        TaxonomyMapping::new("certificate", "certificate:{.subject}")
            .with_properties([
                prop_map("subject", "subject"),
                prop_map("issuer", "issuer"),
                prop_map("not_before", "not_before"),
                prop_map("not_after", "not_after"),
                prop_map("sans", "subject_alternative_names"),
                prop_map("expired", "expired"),
            ])
            .with_relationship(rel(
                "SERVED_BY",
                "certificate:{.subject}",
                "endpoint:{_parent.target}",
            )),
    );

    let endpoint = TaxonomyMapping::new("endpoint", "endpoint:{.target}")
        .with_properties([
            prop_map("target", "url"),
            prop_map("ip", "ip"),
            prop_map("port", "port"),
        ])
        .with_relationships([
            discovered("endpoint:{.target}"),
            rel(
                "SERVES_CERTIFICATE",
                "endpoint:{.target}",
                "certificate:{.certificate.subject}",
            ),
        ]);

    ToolSchema::new(
        "testssl",
        VERSION,
        input,
        ssl_output(ssl_result(vulnerability, certificate, endpoint)),
    )
    .with_description(
        "SSL/TLS security testing tool for analyzing protocols, ciphers, vulnerabilities, and certificate information",
    )
    .with_tags(SSL_TAGS)
}

/// SSL/TLS configuration scanning, identifying-field identities
#[must_use]
pub fn sslyze() -> ToolSchema {
    let input = SchemaValue::object([
        (
            "targets",
            targets("Hosts to scan, as hostname or hostname:port"),
        ),
        ("timeout", timeout()),
    ])
    .with_required("targets");

    let vulnerability = vulnerability_fields().with_taxonomy(
        TaxonomyMapping::identified_by(
            "vulnerability",
            [("vulnerability_id", "$.id"), ("target", "$._parent.target")],
        )
        .with_properties([
            prop_map("severity", "severity"),
            prop_map("finding", "finding"),
            prop_map("cve", "cve"),
            prop_map("description", "description"),
        ])
        .with_relationship(rel_nodes(
            "HAS_VULNERABILITY",
            node("endpoint", [("url", "$._parent.target")]),
            self_node(),
        )),
    );

    let certificate = certificate_fields().with_taxonomy(
        TaxonomyMapping::identified_by("certificate", [("subject", "$.subject")])
            .with_properties([
                prop_map("issuer", "issuer"),
                prop_map("not_before", "not_before"),
                prop_map("not_after", "not_after"),
                prop_map("sans", "subject_alternative_names"),
                prop_map("expired", "expired"),
            ])
            .with_relationship(rel_nodes(
                "SERVED_BY",
                self_node(),
                node("endpoint", [("url", "$._parent.target")]),
            )),
    );

    let endpoint = TaxonomyMapping::identified_by("endpoint", [("url", "$.target")])
        .with_properties([prop_map("ip", "ip"), prop_map("port", "port")])
        .with_relationships([
            rel_nodes(
                "DISCOVERED",
                node("agent_run", [("agent_run_id", "$._context.agent_run_id")]),
                self_node(),
            ),
            rel_nodes(
                "SERVES_CERTIFICATE",
                self_node(),
                node("certificate", [("subject", "$.certificate.subject")]),
            ),
        ]);

    ToolSchema::new(
        "sslyze",
        VERSION,
        input,
        ssl_output(ssl_result(vulnerability, certificate, endpoint)),
    )
    .with_description(
        "Fast and powerful SSL/TLS scanning library for analyzing security configurations",
    )
    .with_tags(SSL_TAGS)
}

const WEB_TAGS: [&str; 3] = ["fingerprinting", "technology-detection", "web"];

/// Web technology fingerprinting through plugin matches
#[must_use]
pub fn whatweb() -> ToolSchema {
    let input = SchemaValue::object([
        ("targets", targets("URLs to fingerprint")),
        ("timeout", timeout()),
        (
            "aggression",
            SchemaValue::integer()
                .with_description("Aggression level, 1 (stealthy) to 4 (heavy)")
                .with_minimum(1.0)
                .with_maximum(4.0)
                .with_default(1),
        ),
    ])
    .with_required("targets");

    let plugin = SchemaValue::object([
        ("name", SchemaValue::string()),
        ("version", strings()),
        ("categories", strings()),
        ("string", strings()),
    ])
    .with_taxonomy(
        TaxonomyMapping::new("technology", "technology:{.name}")
            .with_properties([
                prop_map("name", "name"),
                prop_map("version", "version"),
                prop_map("categories", "categories"),
            ])
            .with_relationship(rel(
                "USES_TECHNOLOGY",
                "endpoint:{_parent.target}",
                "technology:{.name}",
            )),
    );

    let result = SchemaValue::object([
        ("target", SchemaValue::string()),
        ("http_status", SchemaValue::integer()),
        ("request_url", SchemaValue::string()),
        ("plugins", SchemaValue::array(plugin)),
        ("ip", SchemaValue::string()),
        ("host", SchemaValue::string()),
    ])
    .with_taxonomy(
        TaxonomyMapping::new("endpoint", "endpoint:{.target}")
            .with_properties([
                prop_map("target", "url"),
                prop_map("http_status", "status_code"),
                prop_map("request_url", "request_url"),
                prop_map("ip", "ip"),
                prop_map("host", "host"),
            ])
            .with_relationships([
                discovered("endpoint:{.target}"),
                rel("HOSTED_ON", "endpoint:{.target}", "host:{.host}"),
            ]),
    );

    let output = SchemaValue::object([
        ("results", SchemaValue::array(result)),
        ("total_scanned", SchemaValue::integer()),
        ("scan_time_ms", SchemaValue::integer()),
    ]);

    ToolSchema::new("whatweb", VERSION, input, output)
        .with_description(
            "Web technology detection tool for identifying CMS, frameworks, JavaScript libraries, and server technologies",
        )
        .with_tags(WEB_TAGS)
}

/// Web technology fingerprinting through signature matches
#[must_use]
pub fn wappalyzer() -> ToolSchema {
    let input = SchemaValue::object([
        ("targets", targets("URLs to analyze")),
        ("timeout", timeout()),
    ])
    .with_required("targets");

    let technology = SchemaValue::object([
        ("name", SchemaValue::string()),
        ("version", SchemaValue::string()),
        ("categories", strings()),
        ("confidence", SchemaValue::integer()),
    ])
    .with_taxonomy(
        TaxonomyMapping::new("technology", "technology:{.name}")
            .with_properties([
                prop_map("name", "name"),
                prop_map("version", "version"),
                prop_map("categories", "categories"),
                prop_map("confidence", "confidence"),
            ])
            .with_relationship(rel(
                "USES_TECHNOLOGY",
                "endpoint:{_parent.url}",
                "technology:{.name}",
            )),
    );

    let result = SchemaValue::object([
        ("url", SchemaValue::string()),
        ("host", SchemaValue::string()),
        ("technologies", SchemaValue::array(technology)),
    ])
    .with_taxonomy(
        TaxonomyMapping::new("endpoint", "endpoint:{.url}")
            .with_properties([prop_map("url", "url"), prop_map("host", "host")])
            .with_relationships([
                discovered("endpoint:{.url}"),
                rel("HOSTED_ON", "endpoint:{.url}", "host:{.host}"),
            ]),
    );

    let output = SchemaValue::object([
        ("results", SchemaValue::array(result)),
        ("total_scanned", SchemaValue::integer()),
        ("scan_time_ms", SchemaValue::integer()),
    ]);

    ToolSchema::new("wappalyzer", VERSION, input, output)
        .with_description(
            "Technology detection tool using webanalyze for identifying web technologies and frameworks",
        )
        .with_tags(WEB_TAGS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::builtin::ReplayTool;
    use crate::adapter::ToolHost;
    use crate::registry::ToolRegistry;
    use recon_core::ExecutionContext;
    use recon_schema::compile;
    use recon_taxonomy::{MaterializeConfig, MaterializedGraph, Materializer};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn map(schema: &ToolSchema, output: Value) -> MaterializedGraph {
        let compiled = compile(&schema.output).unwrap().schema;
        let context = ExecutionContext::new().with_agent_run_id("run-1");
        Materializer::new(MaterializeConfig::default()).materialize(&output, &compiled, &context)
    }

    #[test]
    fn test_catalog_names() {
        let names: Vec<String> = all().into_iter().map(|s| s.name).collect();
        assert_eq!(names, TOOL_NAMES);
        for name in TOOL_NAMES {
            assert_eq!(get(name).map(|s| s.name), Some(name.to_string()));
        }
        assert!(get("nmap").is_none());
    }

    #[test]
    fn test_catalog_compiles_cleanly() {
        for schema in all() {
            let output = compile(&schema.output).unwrap();
            assert!(
                output.warnings.is_empty(),
                "{}: {:?}",
                schema.name,
                output.warnings
            );
            assert!(output.schema.mapping_count() > 0, "{}", schema.name);
            compile(&schema.input).unwrap();
        }
    }

    #[test]
    fn test_catalog_registers() {
        let mut registry = ToolRegistry::new();
        for schema in all() {
            let tool = Arc::new(ReplayTool::new(&schema.name, &schema.version, json!({})));
            registry.register(tool, schema).unwrap();
        }
        assert_eq!(registry.count(), 8);
        assert_eq!(registry.list_by_tag("ssl-tls"), vec!["testssl", "sslyze"]);
    }

    #[test]
    fn test_subfinder_output() {
        let graph = map(
            &subfinder(),
            json!({
                "domain": "example.com",
                "subdomains": ["www.example.com", "api.example.com"],
                "count": 2,
                "scan_time_ms": 1200
            }),
        );
        assert_eq!(
            graph.node("domain", "domain:example.com").unwrap().property("name"),
            Some(&json!("example.com"))
        );
        assert_eq!(graph.nodes_of_type("subdomain").count(), 2);
        assert_eq!(graph.edges_of_type("HAS_SUBDOMAIN").count(), 2);
        let discovered: Vec<_> = graph.edges_of_type("DISCOVERED").collect();
        assert_eq!(discovered.len(), 3);
        assert!(discovered
            .iter()
            .all(|e| e.from_identity == "agent_run:run-1" && e.dangling));
    }

    #[test]
    fn test_amass_dns_records() {
        let graph = map(
            &amass(),
            json!({
                "domain": "example.com",
                "subdomains": ["www.example.com"],
                "ip_addresses": ["93.184.216.34"],
                "asn_info": [{"asn": 15133, "description": "EDGECAST", "country": "US"}],
                "dns_records": [{"name": "www.example.com", "type": "A", "value": "93.184.216.34"}],
                "whois": {"registrar": "IANA"}
            }),
        );
        assert_eq!(
            graph.node("asn", "asn:15133").unwrap().property("number"),
            Some(&json!(15133))
        );
        assert!(graph.node("host", "host:93.184.216.34").is_some());
        let record = graph
            .edges_of_type("HAS_DNS_RECORD")
            .next()
            .unwrap();
        assert_eq!(record.from_identity, "subdomain:www.example.com");
        assert_eq!(record.to_identity, "dns_record:www.example.com:A:93.184.216.34");
        assert!(!record.dangling);
    }

    #[test]
    fn test_httpx_technologies_link_to_endpoint() {
        let graph = map(
            &httpx(),
            json!({
                "results": [{
                    "url": "https://example.com",
                    "status_code": 200,
                    "title": "Example Domain",
                    "technologies": ["nginx", "React"]
                }]
            }),
        );
        let endpoint = graph.node("endpoint", "endpoint:https://example.com").unwrap();
        assert_eq!(endpoint.property("page_title"), Some(&json!("Example Domain")));
        let uses: Vec<_> = graph.edges_of_type("USES_TECHNOLOGY").collect();
        assert_eq!(uses.len(), 2);
        assert!(uses
            .iter()
            .all(|e| e.from_identity == "endpoint:https://example.com" && !e.dangling));
    }

    #[test]
    fn test_nuclei_severity_lowercased() {
        let graph = map(
            &nuclei(),
            json!({
                "target": "https://example.com",
                "findings": [{
                    "template_id": "tech-detect",
                    "template_name": "Wappalyzer Technology Detection",
                    "severity": "INFO",
                    "type": "http",
                    "matched_at": "https://example.com"
                }]
            }),
        );
        let finding = graph
            .node("finding", "finding:tech-detect:https://example.com")
            .unwrap();
        assert_eq!(finding.property("severity"), Some(&json!("info")));
        let affects = graph.edges_of_type("AFFECTS").next().unwrap();
        assert_eq!(affects.to_identity, "endpoint:https://example.com");
    }

    fn ssl_scan() -> Value {
        json!({
            "results": [{
                "target": "example.com:443",
                "ip": "93.184.216.34",
                "port": 443,
                "protocols": [{"name": "TLSv1.3", "severity": "OK", "finding": "offered"}],
                "certificate": {
                    "subject": "CN=example.com",
                    "issuer": "CN=DigiCert",
                    "sans": ["example.com", "www.example.com"],
                    "expired": false
                },
                "vulnerabilities": [{"id": "heartbleed", "severity": "OK", "finding": "not vulnerable"}]
            }],
            "total_scanned": 1
        })
    }

    #[test]
    fn test_testssl_certificate_edges() {
        let graph = map(&testssl(), ssl_scan());
        let served = graph.edges_of_type("SERVES_CERTIFICATE").next().unwrap();
        assert_eq!(served.from_identity, "endpoint:example.com:443");
        assert_eq!(served.to_identity, "certificate:CN=example.com");
        assert!(!served.dangling);

        let cert = graph.node("certificate", "certificate:CN=example.com").unwrap();
        assert_eq!(
            cert.property("subject_alternative_names"),
            Some(&json!(["example.com", "www.example.com"]))
        );
        assert!(graph
            .node("vulnerability", "vulnerability:heartbleed:example.com:443")
            .is_some());
        assert_eq!(
            graph.edges_of_type("SERVED_BY").next().unwrap().to_identity,
            "endpoint:example.com:443"
        );
    }

    #[test]
    fn test_sslyze_identifying_fields() {
        let graph = map(&sslyze(), ssl_scan());
        let endpoint = graph.node("endpoint", "endpoint:example.com:443").unwrap();
        assert_eq!(endpoint.property("url"), Some(&json!("example.com:443")));
        assert_eq!(endpoint.property("port"), Some(&json!(443)));

        let vuln = graph
            .node(
                "vulnerability",
                "vulnerability:target=example.com:443;vulnerability_id=heartbleed",
            )
            .unwrap();
        assert_eq!(vuln.property("vulnerability_id"), Some(&json!("heartbleed")));

        let has_vuln = graph.edges_of_type("HAS_VULNERABILITY").next().unwrap();
        assert_eq!(has_vuln.from_identity, "endpoint:example.com:443");
        assert!(!has_vuln.dangling);

        let discovered = graph.edges_of_type("DISCOVERED").next().unwrap();
        assert_eq!(discovered.from_identity, "agent_run:run-1");
    }

    #[test]
    fn test_whatweb_and_wappalyzer_share_technology_nodes() {
        let mut registry = ToolRegistry::new();
        let whatweb_out = json!({
            "results": [{
                "target": "https://example.com",
                "http_status": 200,
                "host": "example.com",
                "plugins": [{"name": "nginx", "version": ["1.25.3"]}]
            }]
        });
        let wappalyzer_out = json!({
            "results": [{
                "url": "https://example.com",
                "host": "example.com",
                "technologies": [{"name": "nginx", "version": "1.25.3", "confidence": 100}]
            }]
        });
        registry
            .register(
                Arc::new(ReplayTool::new("whatweb", VERSION, whatweb_out)),
                whatweb(),
            )
            .unwrap();
        registry
            .register(
                Arc::new(ReplayTool::new("wappalyzer", VERSION, wappalyzer_out)),
                wappalyzer(),
            )
            .unwrap();
        let host = ToolHost::new(Arc::new(registry));
        let context = ExecutionContext::new();

        let first = host
            .run("whatweb", &json!({"targets": ["https://example.com"]}), &context)
            .unwrap();
        let second = host
            .run("wappalyzer", &json!({"targets": ["https://example.com"]}), &context)
            .unwrap();

        assert_eq!(first.input["aggression"], json!(1));
        for graph in [&first.graph, &second.graph] {
            assert!(graph.node("technology", "technology:nginx").is_some());
            let hosted = graph.edges_of_type("HOSTED_ON").next().unwrap();
            assert_eq!(hosted.to_identity, "host:example.com");
        }
        // DISCOVERED has no agent run to resolve against
        assert_eq!(first.graph.edges_of_type("DISCOVERED").count(), 0);
        assert!(first.graph.stats.edges_dropped > 0);
    }
}
