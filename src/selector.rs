//! Label selector evaluation.
//!
//! The injection engine never evaluates selectors itself. Presets are
//! filtered by a [`SelectorMatcher`] before they reach the mergers;
//! [`LabelSelectorMatcher`] implements the standard Kubernetes semantics.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::api::{LabelSelector, LabelSelectorRequirement};

/// SelectorError reports a stored selector that cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("{key}: unknown selector operator {operator:?}")]
    UnknownOperator { key: String, operator: String },

    #[error("{key}: operator {operator} requires at least one value")]
    MissingValues { key: String, operator: String },

    #[error("{key}: operator {operator} does not accept values")]
    UnexpectedValues { key: String, operator: String },

    #[error("invalid label key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("{key}: invalid label value {value:?}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: &'static str,
    },
}

/// SelectorMatcher decides whether a preset's selector matches a pod's labels.
pub trait SelectorMatcher {
    fn matches(
        &self,
        selector: &LabelSelector,
        labels: &BTreeMap<String, String>,
    ) -> Result<bool, SelectorError>;
}

/// The set-based operators of a selector requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl Operator {
    fn parse(requirement: &LabelSelectorRequirement) -> Result<Operator, SelectorError> {
        let operator = match requirement.operator.as_str() {
            "In" => Operator::In,
            "NotIn" => Operator::NotIn,
            "Exists" => Operator::Exists,
            "DoesNotExist" => Operator::DoesNotExist,
            other => {
                return Err(SelectorError::UnknownOperator {
                    key: requirement.key.clone(),
                    operator: other.to_string(),
                })
            }
        };

        let has_values = requirement.values.as_ref().is_some_and(|v| !v.is_empty());
        match operator {
            Operator::In | Operator::NotIn if !has_values => Err(SelectorError::MissingValues {
                key: requirement.key.clone(),
                operator: requirement.operator.clone(),
            }),
            Operator::Exists | Operator::DoesNotExist if has_values => {
                Err(SelectorError::UnexpectedValues {
                    key: requirement.key.clone(),
                    operator: requirement.operator.clone(),
                })
            }
            _ => Ok(operator),
        }
    }
}

/// A validated requirement, ready to be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub key: String,
    pub operator: Operator,
    pub values: Vec<String>,
}

impl Requirement {
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            Operator::In => value.is_some_and(|v| self.values.contains(v)),
            Operator::NotIn => value.map_or(true, |v| !self.values.contains(v)),
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
        }
    }
}

/// Converts a selector into its list of requirements, validating every
/// key and value. `matchLabels` entries become `In` requirements.
pub fn requirements(selector: &LabelSelector) -> Result<Vec<Requirement>, SelectorError> {
    let labels = selector.match_labels.iter().flatten();
    let expressions = selector.match_expressions.iter().flatten();
    let mut requirements = Vec::new();

    for (key, value) in labels {
        validate_key(key)?;
        validate_value(key, value)?;
        requirements.push(Requirement {
            key: key.clone(),
            operator: Operator::In,
            values: vec![value.clone()],
        });
    }

    for expression in expressions {
        validate_key(&expression.key)?;
        let operator = Operator::parse(expression)?;
        let values = expression.values.clone().unwrap_or_default();
        for value in &values {
            validate_value(&expression.key, value)?;
        }
        requirements.push(Requirement {
            key: expression.key.clone(),
            operator,
            values,
        });
    }

    Ok(requirements)
}

const MAX_NAME_LENGTH: usize = 63;
const MAX_PREFIX_LENGTH: usize = 253;

/// Checks that `key` is a qualified name: an optional DNS subdomain prefix
/// and a slash, followed by a name of at most 63 characters.
fn validate_key(key: &str) -> Result<(), SelectorError> {
    let invalid = |reason| SelectorError::InvalidKey {
        key: key.to_string(),
        reason,
    };

    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            if prefix.is_empty() {
                return Err(invalid("prefix part must be non-empty"));
            }
            if prefix.len() > MAX_PREFIX_LENGTH {
                return Err(invalid("prefix part must be no more than 253 characters"));
            }
            if !is_dns_subdomain(prefix) {
                return Err(invalid("prefix part must be a lowercase DNS subdomain"));
            }
            name
        }
        None => key,
    };

    if name.is_empty() {
        return Err(invalid("name part must be non-empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(invalid("name part must be no more than 63 characters"));
    }
    if !is_qualified_name_part(name) {
        return Err(invalid(
            "name part must consist of alphanumerics, '-', '_' or '.', and start and end with an alphanumeric",
        ));
    }
    Ok(())
}

/// Checks that `value` is a valid label value. The empty value is valid.
fn validate_value(key: &str, value: &str) -> Result<(), SelectorError> {
    let invalid = |reason| SelectorError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    };

    if value.len() > MAX_NAME_LENGTH {
        return Err(invalid("must be no more than 63 characters"));
    }
    if !value.is_empty() && !is_qualified_name_part(value) {
        return Err(invalid(
            "must consist of alphanumerics, '-', '_' or '.', and start and end with an alphanumeric",
        ));
    }
    Ok(())
}

// [A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?
fn is_qualified_name_part(s: &str) -> bool {
    let bytes = s.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes
                    .iter()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        }
        _ => false,
    }
}

// Dot-separated labels of [a-z0-9]([-a-z0-9]*[a-z0-9])?
fn is_dns_subdomain(s: &str) -> bool {
    s.split('.').all(|label| {
        let bytes = label.as_bytes();
        let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
        match (bytes.first(), bytes.last()) {
            (Some(first), Some(last)) => {
                alnum(first) && alnum(last) && bytes.iter().all(|b| alnum(b) || *b == b'-')
            }
            _ => false,
        }
    })
}

/// LabelSelectorMatcher evaluates selectors with Kubernetes semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelSelectorMatcher;

impl SelectorMatcher for LabelSelectorMatcher {
    fn matches(
        &self,
        selector: &LabelSelector,
        labels: &BTreeMap<String, String>,
    ) -> Result<bool, SelectorError> {
        Ok(requirements(selector)?.iter().all(|r| r.matches(labels)))
    }
}
