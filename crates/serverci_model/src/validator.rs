//! Document validation.
//!
//! The validator walks the whole document and collects every finding into a
//! single [`ValidationReport`]. A failing field never stops the walk.

use std::fmt;

use tracing::debug;

use crate::models::{
    Account, AuditVersion, Configuration, ConfigurationItem, Description, Document, Interface,
    ReleaseVersion, Requirement, SurroundingSystem, Version,
};
use crate::rules::{self, RuleResult};

/// A single violation, scoped to a field path such as `ci.interfaces[2].vlan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFinding {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Collector threaded through the tree walk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.findings.push(ValidationFinding {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Record the outcome of a rule under `path`.
    pub fn check(&mut self, path: impl Into<String>, outcome: RuleResult) {
        if let Err(message) = outcome {
            self.add(path, message);
        }
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.findings.extend(other.findings);
    }

    pub fn is_valid(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<ValidationFinding> {
        self.findings
    }

    /// Convert into a composite error when anything was found.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.findings.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.findings))
        }
    }
}

/// Every finding of a document, rendered one `path: message` per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationFinding>);

impl ValidationErrors {
    pub fn findings(&self) -> &[ValidationFinding] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, finding) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{finding}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Something that can check itself and report under a path prefix.
pub trait Validate {
    fn validate_into(&self, path: &str, report: &mut ValidationReport);
}

/// Validator for configuration-item documents.
pub struct DocumentValidator;

impl DocumentValidator {
    /// Produce every finding for the document, in traversal order.
    pub fn validate(document: &Document) -> ValidationReport {
        let mut report = ValidationReport::new();
        if let Some(ci) = &document.ci {
            ci.validate_into("ci", &mut report);
        }
        debug!("Validation finished with {} finding(s)", report.len());
        report
    }
}

impl Document {
    /// Validate the document, failing with all findings at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        DocumentValidator::validate(self).into_result()
    }
}

fn validate_each<T: Validate>(items: &[T], path: &str, report: &mut ValidationReport) {
    for (i, item) in items.iter().enumerate() {
        item.validate_into(&format!("{path}[{i}]"), report);
    }
}

impl Validate for ConfigurationItem {
    fn validate_into(&self, path: &str, report: &mut ValidationReport) {
        validate_each(&self.versions, &format!("{path}.versions"), report);
        validate_each(&self.audit_versions, &format!("{path}.audit_versions"), report);
        validate_each(&self.release_versions, &format!("{path}.release_versions"), report);
        validate_each(&self.requirements, &format!("{path}.requirements"), report);
        validate_each(&self.surrounding_systems, &format!("{path}.surrounding_systems"), report);
        if let Some(description) = &self.description {
            description.validate_into(&format!("{path}.description"), report);
        }
        if let Some(configuration) = &self.configuration {
            configuration.validate_into(&format!("{path}.configuration"), report);
        }
        validate_each(&self.interfaces, &format!("{path}.interfaces"), report);
        validate_each(&self.accounts, &format!("{path}.accounts"), report);
    }
}

fn validate_revision(
    number: Option<&str>,
    date: Option<&str>,
    path: &str,
    report: &mut ValidationReport,
) {
    report.check(format!("{path}.number"), rules::version_number(number));
    report.check(format!("{path}.date"), rules::date(date));
}

impl Validate for Version {
    fn validate_into(&self, path: &str, report: &mut ValidationReport) {
        validate_revision(self.number.as_deref(), self.date.as_deref(), path, report);
    }
}

impl Validate for AuditVersion {
    fn validate_into(&self, path: &str, report: &mut ValidationReport) {
        validate_revision(self.number.as_deref(), self.date.as_deref(), path, report);
    }
}

impl Validate for ReleaseVersion {
    fn validate_into(&self, path: &str, report: &mut ValidationReport) {
        validate_revision(self.number.as_deref(), self.date.as_deref(), path, report);
    }
}

// Free-form entries.
impl Validate for Requirement {
    fn validate_into(&self, _path: &str, _report: &mut ValidationReport) {}
}

impl Validate for Account {
    fn validate_into(&self, _path: &str, _report: &mut ValidationReport) {}
}

impl Validate for SurroundingSystem {
    fn validate_into(&self, path: &str, report: &mut ValidationReport) {
        report.check(
            format!("{path}.address"),
            rules::host_or_ip(self.address.as_deref()),
        );
    }
}

impl Validate for Description {
    fn validate_into(&self, path: &str, report: &mut ValidationReport) {
        report.check(
            format!("{path}.disaster_level"),
            rules::non_negative(self.disaster_level),
        );
    }
}

impl Validate for Configuration {
    fn validate_into(&self, path: &str, report: &mut ValidationReport) {
        report.check(format!("{path}.fqdn"), rules::fqdn(self.fqdn.as_deref()));
        report.check(format!("{path}.ram"), rules::non_negative(self.ram));
        report.check(format!("{path}.cpu"), rules::non_negative(self.cpu));
        rules::ip_list(report, &format!("{path}.ntp"), &self.ntp);
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}

impl Validate for Interface {
    fn validate_into(&self, path: &str, report: &mut ValidationReport) {
        report.check(format!("{path}.vlan"), rules::vlan(self.vlan));
        report.check(format!("{path}.ip"), rules::ip_address(self.ip.as_deref()));
        report.check(
            format!("{path}.subnet"),
            rules::subnet_mask(self.subnet.as_deref()),
        );
        rules::ip_list(report, &format!("{path}.dns"), &self.dns);

        if self.dhcp == Some(false) && is_blank(self.ip.as_deref()) && is_blank(self.subnet.as_deref())
        {
            report.add(
                format!("{path}.dhcp"),
                "dhcp=false but ip/subnet not provided",
            );
        }
    }
}
