use crate::duration::{DurationError, parse_duration};
use pkg_constants::annotations as keys;
use std::collections::BTreeMap;
use std::time::Duration;

/// Parse a boolean the way operators usually write them in annotations
/// and environment variables. Returns `None` for anything unrecognized.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// State of the lease annotation on a workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseSpec {
    /// Key missing or empty: the workload is not managed.
    Absent,
    /// Key present but the value is not a valid duration.
    Invalid { raw: String, reason: DurationError },
    Declared(Duration),
}

/// Typed lease policy, parsed once from a workload's annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeasePolicy {
    /// Whether the workload carried any annotations at all.
    pub annotated: bool,
    pub lease: LeaseSpec,
    pub disabled: bool,
    /// Raw disabled value that was neither truthy nor falsy.
    pub unrecognized_disabled: Option<String>,
}

impl LeasePolicy {
    pub fn from_annotations(annotations: &BTreeMap<String, String>) -> Self {
        let lease = match annotations.get(keys::LEASE).map(String::as_str) {
            None | Some("") => LeaseSpec::Absent,
            Some(raw) => match parse_duration(raw) {
                Ok(d) => LeaseSpec::Declared(d),
                Err(reason) => LeaseSpec::Invalid {
                    raw: raw.to_string(),
                    reason,
                },
            },
        };

        let (disabled, unrecognized_disabled) = match annotations.get(keys::DISABLED) {
            None => (false, None),
            Some(raw) => match parse_bool(raw) {
                Some(flag) => (flag, None),
                None => (false, Some(raw.clone())),
            },
        };

        Self {
            annotated: !annotations.is_empty(),
            lease,
            disabled,
            unrecognized_disabled,
        }
    }
}
