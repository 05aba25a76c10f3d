//! Field-level validation rules.
//!
//! Each rule checks one value and returns a human-readable message on
//! failure. Absent or blank values always pass; presence is never enforced
//! here. Strings are trimmed before checking.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::validator::ValidationReport;

/// Accepted date layout, `DD.MM.YYYY`.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;
const VLAN_RANGE: std::ops::RangeInclusive<i64> = 1..=4094;

static VERSION_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*$").expect("version number pattern"));

// chrono accepts unpadded days and signed years, so the shape is pinned first.
static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").expect("date pattern"));

static HOSTNAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$").expect("label pattern")
});

static SUBNET_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(?:[0-9]|[12][0-9]|3[0-2])$").expect("prefix pattern"));

/// Outcome of a single rule.
pub type RuleResult = Result<(), String>;

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

pub fn version_number(value: Option<&str>) -> RuleResult {
    let Some(s) = trimmed(value) else {
        return Ok(());
    };
    if VERSION_NUMBER.is_match(s) {
        Ok(())
    } else {
        Err(format!(
            "invalid version number {s:?} (expected digits with optional dots, e.g. 1.2.3)"
        ))
    }
}

pub fn date(value: Option<&str>) -> RuleResult {
    let Some(s) = trimmed(value) else {
        return Ok(());
    };
    let valid = DATE_SHAPE.is_match(s) && NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok();
    if valid {
        Ok(())
    } else {
        Err(format!("invalid date {s:?} (expected DD.MM.YYYY)"))
    }
}

pub fn non_negative(value: Option<i64>) -> RuleResult {
    match value {
        Some(n) if n < 0 => Err(format!("must be >= 0, got {n}")),
        _ => Ok(()),
    }
}

pub fn vlan(value: Option<i64>) -> RuleResult {
    match value {
        Some(n) if !VLAN_RANGE.contains(&n) => Err(format!(
            "VLAN must be in [{}..{}], got {n}",
            VLAN_RANGE.start(),
            VLAN_RANGE.end()
        )),
        _ => Ok(()),
    }
}

pub fn ip_address(value: Option<&str>) -> RuleResult {
    let Some(s) = trimmed(value) else {
        return Ok(());
    };
    if s.parse::<IpAddr>().is_ok() {
        Ok(())
    } else {
        Err(format!("invalid IP address {s:?}"))
    }
}

/// Check every entry of an IP list, reporting under `path[i]`.
///
/// The first occurrence of a literal is accepted; each later repeat is
/// reported as a duplicate. Invalid entries never count as seen.
pub fn ip_list(report: &mut ValidationReport, path: &str, list: &[Option<String>]) {
    let mut seen = HashSet::new();
    for (i, entry) in list.iter().enumerate() {
        let Some(value) = trimmed(entry.as_deref()) else {
            continue;
        };
        let entry_path = format!("{path}[{i}]");
        if value.parse::<IpAddr>().is_err() {
            report.add(entry_path, format!("invalid IP address {value:?}"));
        } else if !seen.insert(value) {
            report.add(entry_path, format!("duplicate IP {value:?}"));
        }
    }
}

fn valid_labels(s: &str) -> Result<usize, String> {
    let mut count = 0;
    for label in s.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN || !HOSTNAME_LABEL.is_match(label) {
            return Err(label.to_string());
        }
        count += 1;
    }
    Ok(count)
}

pub fn fqdn(value: Option<&str>) -> RuleResult {
    let Some(s) = trimmed(value) else {
        return Ok(());
    };
    let labels = s.split('.').count();
    if labels < 2 {
        return Err(format!("invalid FQDN {s:?} (need at least one dot)"));
    }
    if let Err(label) = valid_labels(s) {
        return Err(format!("invalid FQDN {s:?} (bad label {label:?})"));
    }
    if s.len() > MAX_HOSTNAME_LEN {
        return Err(format!("invalid FQDN {s:?} (too long)"));
    }
    Ok(())
}

/// Accepts `/N` or a dotted IPv4 mask such as `255.255.255.0`.
pub fn subnet_mask(value: Option<&str>) -> RuleResult {
    let Some(s) = trimmed(value) else {
        return Ok(());
    };
    if SUBNET_PREFIX.is_match(s) {
        return Ok(());
    }
    match s.parse::<IpAddr>() {
        Ok(IpAddr::V4(mask)) if is_contiguous_mask(mask) => Ok(()),
        Ok(IpAddr::V4(_)) => Err(format!("invalid dotted netmask {s:?} (must be contiguous)")),
        Ok(IpAddr::V6(_)) => Err(format!("invalid IPv4 mask {s:?}")),
        Err(_) => Err(format!("invalid subnet {s:?} (use /N or dotted mask)")),
    }
}

/// True when the mask is a run of ones followed by a run of zeros.
pub fn is_contiguous_mask(mask: Ipv4Addr) -> bool {
    let bits = u32::from(mask);
    bits.leading_ones() + bits.trailing_zeros() == 32
}

pub fn host_or_ip(value: Option<&str>) -> RuleResult {
    let Some(s) = trimmed(value) else {
        return Ok(());
    };
    if s.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    if valid_labels(s).is_err() {
        return Err(format!("invalid host or IP {s:?}"));
    }
    if s.len() > MAX_HOSTNAME_LEN {
        return Err(format!("invalid host {s:?} (too long)"));
    }
    Ok(())
}
