//! Data models for configuration-item documents.
//!
//! Every scalar is an `Option`: a missing key stays `None`, an explicit empty
//! string stays `Some("")`. Nothing here is ever defaulted into a value a
//! validator could mistake for user input.

use serde::{Deserialize, Serialize};

/// Root of a decoded document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub ci: Option<ConfigurationItem>,
}

impl Document {
    pub fn new(ci: ConfigurationItem) -> Self {
        Self { ci: Some(ci) }
    }

    /// A document without a configuration item.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every block present and every sequence holding one blank entry.
    /// Templates resolve paths below absent blocks against this shape.
    pub fn skeleton() -> Self {
        Self::new(ConfigurationItem {
            versions: vec![Version::default()],
            audit_versions: vec![AuditVersion::default()],
            release_versions: vec![ReleaseVersion::default()],
            requirements: vec![Requirement::default()],
            surrounding_systems: vec![SurroundingSystem::default()],
            description: Some(Description::default()),
            configuration: Some(Configuration {
                ntp: vec![None],
                ..Default::default()
            }),
            interfaces: vec![Interface {
                dns: vec![None],
                ..Default::default()
            }],
            accounts: vec![Account::default()],
            ..Default::default()
        })
    }
}

/// Metadata describing a single system or service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfigurationItem {
    pub author_company: Option<String>,
    pub author_department: Option<String>,
    pub classification: Option<String>,
    pub versions: Vec<Version>,
    pub audit_versions: Vec<AuditVersion>,
    pub release_versions: Vec<ReleaseVersion>,
    pub requirements: Vec<Requirement>,
    pub surrounding_systems: Vec<SurroundingSystem>,
    pub description: Option<Description>,
    pub configuration: Option<Configuration>,
    pub interfaces: Vec<Interface>,
    pub accounts: Vec<Account>,
}

/// Document revision history entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Version {
    pub number: Option<String>,
    pub date: Option<String>,
    pub user: Option<String>,
    pub description: Option<String>,
}

/// Audit sign-off entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditVersion {
    pub number: Option<String>,
    pub date: Option<String>,
    pub authority: Option<String>,
    pub remarks: Option<String>,
}

/// Release approval entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseVersion {
    pub number: Option<String>,
    pub date: Option<String>,
    pub authority: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirement {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
}

/// A neighbouring system this item talks to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurroundingSystem {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    /// IP literal or hostname.
    pub address: Option<String>,
    pub description: Option<String>,
}

/// Service description block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Description {
    pub service_code: Option<String>,
    pub customer: Option<String>,
    pub description: Option<String>,
    pub supplier: Option<String>,
    #[serde(
        rename(serialize = "disaster-level", deserialize = "disaster-lvl"),
        alias = "disaster-level"
    )]
    pub disaster_level: Option<i64>,
}

/// Host configuration block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub name: Option<String>,
    pub fqdn: Option<String>,
    pub os: Option<String>,
    /// Memory in GB.
    pub ram: Option<i64>,
    pub cpu: Option<i64>,
    pub domain: Option<String>,
    pub ntp: Vec<Option<String>>,
    pub snmp: Option<String>,
}

/// Network interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interface {
    pub name: Option<String>,
    pub zone: Option<String>,
    pub vlan: Option<i64>,
    pub dhcp: Option<bool>,
    pub ip: Option<String>,
    /// Either `/N` or a dotted IPv4 mask.
    pub subnet: Option<String>,
    pub dns: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub usage: Option<String>,
}
