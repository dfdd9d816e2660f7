//! Integration tests for stackdeps-cli functionality.
//! Tests the underlying library functions that the CLI commands invoke.

use stackdeps_core::config::StackdepsConfig;
use stackdeps_core::export::{ExportFormat, export};
use stackdeps_core::{order, validate};
use stackdeps_parser::project::load_project;
use std::fs;
use std::path::Path;

fn write_template(root: &Path, rel: &str, content: &str) {
    let path = root.join("templates").join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn make_project() -> tempfile::TempDir {
    let tmpdir = tempfile::tempdir().unwrap();
    let root = tmpdir.path();
    write_template(root, "vpc/base.yaml", "Outputs:\n  vpc-id:\n    Value: x\n");
    write_template(
        root,
        "network/vpc.yaml",
        "Parameters:\n  vpc-id:\n    Type: String\nOutputs:\n  subnet-ids:\n    Value: y\n",
    );
    write_template(
        root,
        "app/service.yaml",
        "Parameters:\n  subnet-ids:\n    Type: String\n",
    );
    write_template(root, "dns/zone.yaml", "Resources: {}\n");
    tmpdir
}

#[test]
fn test_check_passes_on_complete_project() {
    let tmpdir = make_project();
    let project = load_project(tmpdir.path()).unwrap();
    let report = validate::validate(&project.graph, &project.config.validation);
    assert!(report.is_ok());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["undefined"].as_array().unwrap().len(), 0);
    assert!(json.get("cycle").is_none());
}

#[test]
fn test_check_fails_on_missing_provider() {
    let tmpdir = make_project();
    write_template(
        tmpdir.path(),
        "db/cluster.yaml",
        "Parameters:\n  subnet-idz:\n    Type: String\n",
    );

    let project = load_project(tmpdir.path()).unwrap();
    let report = validate::validate(&project.graph, &project.config.validation);
    assert!(!report.is_ok());
    assert_eq!(report.undefined[0].variable, "subnet-idz");
    assert_eq!(report.undefined[0].suggestion.as_deref(), Some("subnet-ids"));
}

#[test]
fn test_deploy_order_for_project() {
    let tmpdir = make_project();
    let project = load_project(tmpdir.path()).unwrap();
    let planned = order::deploy_plan(&project.graph, &["app/service.yaml"]).unwrap();
    assert_eq!(
        planned,
        vec!["vpc/base.yaml", "network/vpc.yaml", "app/service.yaml"]
    );
}

#[test]
fn test_retract_plan_for_project() {
    let tmpdir = make_project();
    let project = load_project(tmpdir.path()).unwrap();
    let plan =
        order::retract_plan(&project.graph, &["network/vpc.yaml", "dns/zone.yaml"]).unwrap();
    assert_eq!(plan.order, vec!["dns/zone.yaml"]);
    assert_eq!(plan.dropped[0].template, "network/vpc.yaml");
    assert_eq!(plan.dropped[0].blocked_by, vec!["app/service.yaml"]);
}

#[test]
fn test_closed_json_shape() {
    let tmpdir = make_project();
    let project = load_project(tmpdir.path()).unwrap();
    let report = project
        .graph
        .closure_report(&["app/service.yaml", "vpc/base.yaml"]);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["kept"], serde_json::json!(["app/service.yaml"]));
    assert_eq!(json["dropped"][0]["template"], "vpc/base.yaml");
}

#[test]
fn test_export_mermaid_for_project() {
    let tmpdir = make_project();
    let project = load_project(tmpdir.path()).unwrap();
    let out = export(&project.graph, ExportFormat::Mermaid);
    assert!(out.contains("-->|vpc-id|"));
    assert!(out.contains("dns/zone.yaml"));
}

#[test]
fn test_config_defaults_without_file() {
    let tmpdir = tempfile::tempdir().unwrap();
    let config = StackdepsConfig::load(tmpdir.path()).unwrap();
    assert_eq!(config.validation.suggestion_threshold, 0.8);
    assert!(!config.validation.strict_providers);
}
