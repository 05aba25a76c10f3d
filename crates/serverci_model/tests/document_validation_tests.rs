//! Integration tests for decoding and validating whole documents.

use std::fs;
use tempfile::tempdir;

use serverci_model::{
    Configuration, ConfigurationItem, Document, DocumentReader, DocumentValidator, Interface,
    ModelError, Version,
};

const FULL_DOCUMENT: &str = r#"
ci:
  author-company: ACME Corp
  author-department: Platform
  classification: internal
  versions:
    - number: "1.0"
      date: "01.03.2024"
      user: jdoe
      description: Initial version
    - number: "1.1.2"
      date: "29.02.2024"
  audit-versions:
    - number: "1"
      date: "15.04.2024"
      authority: Security
  release-versions:
    - number: "2.0"
      date: "20.05.2024"
      authority: CAB
      remarks: approved
  requirements:
    - type: backup
      name: daily
  surrounding-systems:
    - type: ldap
      name: Directory
      address: ldap.corp.example
    - type: db
      name: Oracle
      address: 10.20.30.40
  description:
    service-code: SVC-042
    customer: Finance
    description: Ledger service
    supplier: In-house
    disaster-lvl: 2
  configuration:
    name: ledger01
    fqdn: ledger01.corp.example
    os: Debian 12
    ram: 16
    cpu: 4
    domain: corp.example
    ntp: [10.0.0.1, 10.0.0.2]
    snmp: v3
  interfaces:
    - name: eth0
      zone: dmz
      vlan: 120
      dhcp: false
      ip: 10.0.120.5
      subnet: 255.255.255.0
      dns: [10.0.0.53, "fd00::53"]
    - name: eth1
      vlan: 4094
      dhcp: true
  accounts:
    - type: service
      name: ledger
      usage: batch jobs
"#;

/// A realistic, fully populated document produces no findings.
#[test]
fn test_full_document_is_valid() {
    let document = DocumentReader::from_yaml_str(FULL_DOCUMENT).unwrap();
    let report = DocumentValidator::validate(&document);
    assert!(report.is_valid(), "unexpected findings: {:?}", report.findings());

    let ci = document.ci.unwrap();
    assert_eq!(ci.versions.len(), 2);
    assert_eq!(ci.interfaces[0].dns.len(), 2);
    assert_eq!(ci.description.unwrap().disaster_level, Some(2));
}

/// Findings come back in traversal order across the whole tree.
#[test]
fn test_findings_follow_traversal_order() {
    let yaml = r#"
ci:
  versions:
    - number: "1.a"
      date: "2024-02-29"
  release-versions:
    - number: "3"
      date: "31.04.2024"
  surrounding-systems:
    - address: "not a host"
  description:
    disaster-lvl: -1
  configuration:
    fqdn: localhost
    ram: -4
    cpu: 2
    ntp: ["10.0.0.1", "10.0.0.1", "bad-ip"]
  interfaces:
    - vlan: 1
    - vlan: 0
      ip: 10.0.0.1
      subnet: 255.255.0.255
      dns: ["1.1.1.1", "1.1.1.1"]
"#;
    let document = DocumentReader::from_yaml_str(yaml).unwrap();
    let report = DocumentValidator::validate(&document);
    let paths: Vec<_> = report.findings().iter().map(|f| f.path.as_str()).collect();

    assert_eq!(
        paths,
        vec![
            "ci.versions[0].number",
            "ci.versions[0].date",
            "ci.release_versions[0].date",
            "ci.surrounding_systems[0].address",
            "ci.description.disaster_level",
            "ci.configuration.fqdn",
            "ci.configuration.ram",
            "ci.configuration.ntp[1]",
            "ci.configuration.ntp[2]",
            "ci.interfaces[1].vlan",
            "ci.interfaces[1].subnet",
            "ci.interfaces[1].dns[1]",
        ]
    );
}

/// Each bad version number yields exactly one finding.
#[test]
fn test_one_finding_per_bad_version_number() {
    for bad in ["1.2-beta", "x", "1,2", "1.2 3"] {
        let document = Document::new(ConfigurationItem {
            versions: vec![Version {
                number: Some(bad.to_string()),
                ..Default::default()
            }],
            ..Default::default()
        });
        let report = DocumentValidator::validate(&document);
        assert_eq!(report.len(), 1, "{bad}");
        assert_eq!(report.findings()[0].path, "ci.versions[0].number");
    }
}

/// Validation has no side effects and is repeatable.
#[test]
fn test_validation_is_idempotent() {
    let document = Document::new(ConfigurationItem {
        configuration: Some(Configuration {
            fqdn: Some("bad".to_string()),
            ntp: vec![Some("x".to_string())],
            ..Default::default()
        }),
        interfaces: vec![Interface {
            vlan: Some(9000),
            ..Default::default()
        }],
        ..Default::default()
    });
    let snapshot = document.clone();

    let first = DocumentValidator::validate(&document).into_findings();
    let second = DocumentValidator::validate(&document).into_findings();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_eq!(document, snapshot);
}

/// Empty strings are present-but-empty and never flagged.
#[test]
fn test_empty_values_pass() {
    let yaml = r#"
ci:
  versions:
    - number: ""
      date: ""
  configuration:
    fqdn: ""
    ntp: ["", null]
  interfaces:
    - ip: ""
      subnet: ""
"#;
    let document = DocumentReader::from_yaml_str(yaml).unwrap();
    assert!(document.validate().is_ok());
}

/// JSON and YAML encodings decode to the same document.
#[test]
fn test_json_and_yaml_agree() {
    let json = r#"{
        "ci": {
            "authorCompany": "ACME Corp",
            "surroundingSystems": [{"type": "ldap", "address": "ldap.corp.example"}],
            "description": {"serviceCode": "SVC-1", "disasterLvl": 1},
            "interfaces": [{"name": "eth0", "vlan": 10, "dhcp": true, "dns": ["10.0.0.53"]}]
        }
    }"#;
    let yaml = r#"
ci:
  author-company: ACME Corp
  surrounding-systems:
    - type: ldap
      address: ldap.corp.example
  description:
    service-code: SVC-1
    disaster-lvl: 1
  interfaces:
    - name: eth0
      vlan: 10
      dhcp: true
      dns: [10.0.0.53]
"#;
    assert_eq!(
        DocumentReader::from_json_str(json).unwrap(),
        DocumentReader::from_yaml_str(yaml).unwrap()
    );
}

#[test]
fn test_decode_errors() {
    assert!(matches!(
        DocumentReader::from_yaml_str("ci: [unterminated"),
        Err(ModelError::Yaml(_))
    ));
    assert!(matches!(
        DocumentReader::from_json_str("{\"ci\": "),
        Err(ModelError::Json(_))
    ));
    assert!(matches!(
        DocumentReader::from_json_str(r#"{"cis": {}}"#),
        Err(ModelError::UnknownField(_))
    ));
}

#[test]
fn test_read_file_by_extension() {
    let temp = tempdir().unwrap();
    let yaml_path = temp.path().join("ci.yaml");
    let json_path = temp.path().join("ci.json");
    fs::write(&yaml_path, "ci:\n  classification: secret\n").unwrap();
    fs::write(&json_path, r#"{"ci": {"classification": "secret"}}"#).unwrap();

    let from_yaml = DocumentReader::read_file(&yaml_path).unwrap();
    let from_json = DocumentReader::read_file(&json_path).unwrap();
    assert_eq!(from_yaml, from_json);

    let missing = DocumentReader::read_file(temp.path().join("nope.yaml"));
    assert!(matches!(missing, Err(ModelError::Read { .. })));
}
