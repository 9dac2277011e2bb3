use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::canonical::KeyStrategy;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::schema::{FieldDescriptor, FieldKind};
use crate::value::{Scalar, ScalarType};

fn cluster_schema() -> ResourceSchema {
    ResourceSchema::new(
        "test_cluster",
        vec![
            FieldDescriptor::string("name").required(),
            FieldDescriptor::string("description"),
            FieldDescriptor::string("kubernetes_version").with_backend_name("kubernetesVersion"),
            FieldDescriptor::object(
                "blueprint",
                vec![
                    FieldDescriptor::string("name"),
                    FieldDescriptor::string("version").with_default("latest"),
                ],
            ),
            FieldDescriptor {
                kind: FieldKind::Dictionary,
                ..FieldDescriptor::string("labels")
            },
            FieldDescriptor {
                kind: FieldKind::List,
                unordered: true,
                ..FieldDescriptor::string("instance_types")
            },
            FieldDescriptor {
                kind: FieldKind::List,
                ..FieldDescriptor::string("availability_zones")
            },
            FieldDescriptor::keyed(
                "tolerations",
                KeyStrategy::field("key"),
                vec![
                    FieldDescriptor::string("key"),
                    FieldDescriptor::string("operator"),
                    FieldDescriptor::string("effect"),
                    FieldDescriptor::scalar("toleration_seconds", ScalarType::Int)
                        .with_backend_name("tolerationSeconds"),
                ],
            ),
            FieldDescriptor::scalar("max_pods", ScalarType::Int32),
        ],
    )
}

fn toleration(key: &str, effect: &str) -> ConfigNode {
    ConfigNode::object([
        ("key", ConfigNode::scalar(key)),
        ("effect", ConfigNode::scalar(effect)),
    ])
}

fn paths(result: &ConversionResult<impl Sized>, kind: DiagnosticKind) -> Vec<String> {
    result
        .diagnostics
        .iter()
        .filter(|d| d.kind == Some(kind))
        .map(|d| d.path.to_string())
        .collect()
}

fn graph(document: serde_json::Value) -> GraphNode {
    GraphNode::from_json(&document).unwrap()
}

#[test]
fn test_round_trip_preserves_null_absent_and_empty() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);

    let config = ConfigNode::object([
        ("name", ConfigNode::scalar("prod")),
        ("description", ConfigNode::scalar("")),
        ("kubernetes_version", ConfigNode::Null),
        ("blueprint", ConfigNode::object([("name", ConfigNode::scalar("default"))])),
        ("labels", ConfigNode::keyed(Vec::<(String, ConfigNode)>::new())),
        ("instance_types", ConfigNode::list([])),
    ]);

    let result = engine.round_trip(&config);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.output, config);
}

#[test]
fn test_expand_sets_present_and_default_fields_only() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);

    let config = ConfigNode::object([
        ("name", ConfigNode::scalar("prod")),
        ("description", ConfigNode::scalar("")),
        ("kubernetes_version", ConfigNode::Null),
        ("blueprint", ConfigNode::object([("name", ConfigNode::scalar("default"))])),
        ("instance_types", ConfigNode::list([])),
    ]);
    let expanded = engine.expand(&config);
    assert!(!expanded.has_error());

    assert_eq!(
        expanded.output.to_json(),
        json!({
            "name": "prod",
            "description": "",
            "blueprint": {"name": "default", "version": "latest"},
            "instance_types": [],
        })
    );
}

#[test]
fn test_flatten_without_prior_never_invents_values() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);

    let flattened = engine.flatten(
        &graph(json!({
            "name": "prod",
            "kubernetesVersion": "1.31",
            "blueprint": {"name": "default", "version": "latest"},
        })),
        None,
    );

    assert!(!flattened.has_error());
    let config = flattened.output;
    assert_eq!(config.child("kubernetes_version"), &ConfigNode::scalar("1.31"));
    assert_eq!(config.lookup("blueprint.version"), &ConfigNode::Null);
    assert_eq!(config.child("description"), &ConfigNode::Null);
    assert_eq!(config.child("tolerations"), &ConfigNode::Null);
}

#[test]
fn test_backend_array_with_empty_key_is_stable() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);
    let backend = graph(json!({
        "name": "prod",
        "tolerations": [
            {"key": "gpu", "effect": "NoSchedule"},
            {"key": "", "effect": "NoExecute", "tolerationSeconds": 300},
            {"key": "node-role", "effect": "NoSchedule"},
        ],
    }));

    let first = engine.flatten(&backend, None);
    assert!(!first.has_error());
    assert_eq!(paths(&first, DiagnosticKind::AmbiguousCollectionKey), vec!["tolerations[1]"]);

    let tolerations = first.output.child("tolerations").as_map().unwrap();
    assert_eq!(
        tolerations.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["gpu", "node-role", "toleration-1"]
    );
    assert_eq!(
        tolerations["toleration-1"].child("toleration_seconds"),
        &ConfigNode::scalar(300)
    );

    // Writing the flattened configuration back and reading it again is a no-op.
    let expanded = engine.expand(&first.output);
    assert!(!expanded.diagnostics.contains_kind(DiagnosticKind::KeyMismatch));
    let second = engine.flatten(&expanded.output, Some(&first.output));
    assert_eq!(second.output, first.output);
}

#[test]
fn test_expand_orders_collection_by_natural_key() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);

    let config = ConfigNode::object([
        ("name", ConfigNode::scalar("prod")),
        (
            "tolerations",
            ConfigNode::keyed([
                ("zone", toleration("zone", "NoSchedule")),
                ("gpu", toleration("gpu", "NoExecute")),
            ]),
        ),
    ]);

    let expanded = engine.expand(&config);
    assert_eq!(
        expanded.output.field("tolerations").map(GraphNode::to_json),
        Some(json!([
            {"key": "gpu", "effect": "NoExecute"},
            {"key": "zone", "effect": "NoSchedule"},
        ]))
    );
}

#[test]
fn test_key_that_will_not_read_back_is_warned() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);

    let config = ConfigNode::object([
        ("name", ConfigNode::scalar("prod")),
        ("tolerations", ConfigNode::keyed([("accelerator", toleration("gpu", "NoSchedule"))])),
    ]);

    let expanded = engine.expand(&config);
    assert!(!expanded.has_error());
    assert_eq!(
        paths(&expanded, DiagnosticKind::KeyMismatch),
        vec![r#"tolerations["accelerator"]"#]
    );
}

#[test]
fn test_failed_attribute_does_not_affect_siblings() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);

    let config = ConfigNode::object([
        ("name", ConfigNode::scalar("prod")),
        ("max_pods", ConfigNode::scalar("many")),
        ("availability_zones", ConfigNode::list([ConfigNode::scalar("a"), ConfigNode::Null])),
    ]);

    let expanded = engine.expand(&config);
    assert_eq!(
        paths(&expanded, DiagnosticKind::TypeMismatch),
        vec!["availability_zones[1]", "max_pods"]
    );
    assert_eq!(
        expanded.output.to_json(),
        json!({"name": "prod", "availability_zones": ["a"]})
    );
    let error = crate::error::BridgeError::from(expanded.into_result().unwrap_err());
    assert_eq!(error.diagnostics().map(Diagnostics::error_count), Some(2));
}

#[test]
fn test_int32_overflow_is_a_backend_failure() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);

    let config = ConfigNode::object([
        ("name", ConfigNode::scalar("prod")),
        ("max_pods", ConfigNode::scalar(5_000_000_000_i64)),
    ]);

    let expanded = engine.expand(&config);
    assert_eq!(paths(&expanded, DiagnosticKind::BackendConversionFailure), vec!["max_pods"]);
}

#[test]
fn test_codec_failures_are_collected() {
    let schema = cluster_schema();
    let mut codec = MockLeafCodec::new();
    codec.expect_encode().returning(|field, value| {
        if field.name == "kubernetes_version" {
            Err(CodecError::new("version is not offered in this region"))
        } else {
            Ok(value.clone())
        }
    });
    let engine = ConversionEngine::with_codec(&schema, codec);

    let config = ConfigNode::object([
        ("name", ConfigNode::scalar("prod")),
        ("kubernetes_version", ConfigNode::scalar("1.18")),
    ]);
    let expanded = engine.expand(&config);

    let error = expanded.diagnostics.errors().next().unwrap();
    assert_eq!(error.kind, Some(DiagnosticKind::BackendConversionFailure));
    assert_eq!(error.path.to_string(), "kubernetes_version");
    assert_eq!(error.message, "version is not offered in this region");
    assert_eq!(expanded.output.field("name"), Some(&GraphNode::Scalar(Scalar::string("prod"))));
}

#[test]
fn test_decode_failures_are_collected() {
    let schema = cluster_schema();
    let mut codec = MockLeafCodec::new();
    codec
        .expect_decode()
        .returning(|_, value| match value {
            Scalar::String(s) if s.is_empty() => Err(CodecError::new("empty value")),
            other => Ok(other.clone()),
        });
    let engine = ConversionEngine::with_codec(&schema, codec);

    let flattened = engine.flatten(&graph(json!({"name": "prod", "description": ""})), None);
    assert_eq!(paths(&flattened, DiagnosticKind::BackendConversionFailure), vec!["description"]);
    assert_eq!(flattened.output.child("description"), &ConfigNode::Null);
    assert_eq!(flattened.output.child("name"), &ConfigNode::scalar("prod"));
}

#[test]
fn test_unknown_values_are_left_out() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);

    let config = ConfigNode::object([
        ("name", ConfigNode::scalar("prod")),
        ("kubernetes_version", ConfigNode::Unknown),
        (
            "tolerations",
            ConfigNode::keyed([(
                "gpu",
                ConfigNode::object([("key", ConfigNode::scalar("gpu")), ("effect", ConfigNode::Unknown)]),
            )]),
        ),
    ]);

    let expanded = engine.expand(&config);
    assert!(!expanded.has_error());
    assert!(!expanded.is_complete());
    assert_eq!(
        expanded.unknown.iter().map(ToString::to_string).collect::<Vec<_>>(),
        vec!["kubernetes_version", "tolerations"]
    );
    assert_eq!(expanded.output.to_json(), json!({"name": "prod"}));
}

#[test]
fn test_unordered_list_keeps_written_order() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);
    let written = ConfigNode::list([ConfigNode::scalar("m5.large"), ConfigNode::scalar("c5.xlarge")]);
    let config = ConfigNode::object([
        ("name", ConfigNode::scalar("prod")),
        ("instance_types", written.clone()),
        (
            "availability_zones",
            ConfigNode::list([ConfigNode::scalar("us-east-1b"), ConfigNode::scalar("us-east-1a")]),
        ),
    ]);

    let expanded = engine.expand(&config);
    assert_eq!(
        expanded.output.field("instance_types").map(GraphNode::to_json),
        Some(json!(["c5.xlarge", "m5.large"]))
    );
    assert_eq!(
        expanded.output.field("availability_zones").map(GraphNode::to_json),
        Some(json!(["us-east-1b", "us-east-1a"]))
    );

    let flattened = engine.flatten(&expanded.output, Some(&config));
    assert_eq!(flattened.output.child("instance_types"), &written);

    let fresh = engine.flatten(&expanded.output, None);
    assert_eq!(
        fresh.output.child("instance_types"),
        &ConfigNode::list([ConfigNode::scalar("c5.xlarge"), ConfigNode::scalar("m5.large")])
    );
}

#[test]
fn test_required_field_severity_by_direction() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);

    let expanded = engine.expand(&ConfigNode::object([("description", ConfigNode::scalar("x"))]));
    assert!(expanded.has_error());
    assert_eq!(paths(&expanded, DiagnosticKind::MissingRequiredField), vec!["name"]);

    let flattened = engine.flatten(&graph(json!({"description": "x"})), None);
    assert!(!flattened.has_error());
    assert_eq!(paths(&flattened, DiagnosticKind::MissingRequiredField), vec!["name"]);
}

#[test]
fn test_undeclared_attributes() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);

    let expanded = engine.expand(&ConfigNode::object([
        ("name", ConfigNode::scalar("prod")),
        ("colour", ConfigNode::scalar("blue")),
    ]));
    assert_eq!(paths(&expanded, DiagnosticKind::UndeclaredAttribute), vec!["colour"]);

    // Read-only backend fields such as status are dropped silently.
    let flattened = engine.flatten(&graph(json!({"name": "prod", "status": "READY"})), None);
    assert!(flattened.diagnostics.is_empty());
    assert_eq!(flattened.output.child("status"), &ConfigNode::Absent);
}

#[test]
fn test_root_must_be_an_object() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);

    let expanded = engine.expand(&ConfigNode::scalar("prod"));
    assert_eq!(paths(&expanded, DiagnosticKind::TypeMismatch), vec!["<root>"]);
    assert_eq!(expanded.output, GraphNode::empty_struct());

    let flattened = engine.flatten(&GraphNode::Array(vec![]), None);
    assert!(flattened.has_error());
}

#[test]
fn test_dictionary_round_trip() {
    let schema = cluster_schema();
    let engine = ConversionEngine::new(&schema);
    let config = ConfigNode::object([
        ("name", ConfigNode::scalar("prod")),
        (
            "labels",
            ConfigNode::keyed([("env", ConfigNode::scalar("prod")), ("team", ConfigNode::scalar(""))]),
        ),
    ]);

    let expanded = engine.expand(&config);
    assert_eq!(
        expanded.output.field("labels").map(GraphNode::to_json),
        Some(json!({"env": "prod", "team": ""}))
    );
    assert_eq!(engine.round_trip(&config).output, config);
}

#[test]
fn test_integer_written_float_round_trips() {
    let schema = ResourceSchema::new(
        "node_pool",
        vec![
            FieldDescriptor::string("name"),
            FieldDescriptor::scalar("cpu_ratio", ScalarType::Float).with_backend_name("cpuRatio"),
        ],
    );
    let engine = ConversionEngine::new(&schema);
    let config = ConfigNode::object([
        ("name", ConfigNode::scalar("pool-a")),
        ("cpu_ratio", ConfigNode::scalar(2)),
    ]);

    let expanded = engine.expand(&config);
    assert_eq!(expanded.output.to_json(), json!({"name": "pool-a", "cpuRatio": 2.0}));

    let round_trip = engine.round_trip(&config);
    assert!(round_trip.diagnostics.is_empty());
    assert_eq!(round_trip.output, config);
}

#[test]
fn test_invalid_element_does_not_affect_sibling_elements() {
    let schema = ResourceSchema::new(
        "placement",
        vec![FieldDescriptor::keyed(
            "tolerations",
            KeyStrategy::field("key"),
            vec![
                FieldDescriptor::string("key"),
                FieldDescriptor::string("effect").required(),
            ],
        )],
    );
    let engine = ConversionEngine::new(&schema);
    let config = ConfigNode::object([(
        "tolerations",
        ConfigNode::keyed([
            ("a", toleration("a", "NoSchedule")),
            ("b", ConfigNode::object([("key", ConfigNode::scalar("b"))])),
            ("c", toleration("c", "NoExecute")),
        ]),
    )]);

    let expanded = engine.expand(&config);
    let reported: Vec<String> = expanded.diagnostics.iter().map(|d| d.path.to_string()).collect();
    assert_eq!(reported, vec![r#"tolerations["b"].effect"#]);
    assert_eq!(
        paths(&expanded, DiagnosticKind::MissingRequiredField),
        vec![r#"tolerations["b"].effect"#]
    );
    assert_eq!(
        expanded.output.to_json(),
        json!({"tolerations": [
            {"key": "a", "effect": "NoSchedule"},
            {"key": "b"},
            {"key": "c", "effect": "NoExecute"},
        ]})
    );
}
