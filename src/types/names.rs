// ABOUTME: DNS-compatible tenant, application and component names.
// ABOUTME: A component name is always derived as "<app>-<tenant>", never stored.

use std::fmt;
use thiserror::Error;

/// Kubernetes object names are RFC 1123 labels.
const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("{0} name cannot be empty")]
    Empty(&'static str),

    #[error("{0} name exceeds maximum length of 63 characters")]
    TooLong(&'static str),

    #[error("{0} name cannot start with a hyphen")]
    StartsWithHyphen(&'static str),

    #[error("{0} name cannot end with a hyphen")]
    EndsWithHyphen(&'static str),

    #[error("{0} name must be lowercase")]
    NotLowercase(&'static str),

    #[error("invalid character in {0} name: '{1}'")]
    InvalidChar(&'static str, char),
}

fn validate(kind: &'static str, value: &str) -> Result<(), NameError> {
    if value.is_empty() {
        return Err(NameError::Empty(kind));
    }

    if value.len() > MAX_LABEL_LEN {
        return Err(NameError::TooLong(kind));
    }

    if value.starts_with('-') {
        return Err(NameError::StartsWithHyphen(kind));
    }

    if value.ends_with('-') {
        return Err(NameError::EndsWithHyphen(kind));
    }

    for c in value.chars() {
        if c.is_ascii_uppercase() {
            return Err(NameError::NotLowercase(kind));
        }
        if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
            return Err(NameError::InvalidChar(kind, c));
        }
    }

    Ok(())
}

/// Name of the tenant that owns a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantName(String);

impl TenantName {
    pub fn new(value: &str) -> Result<Self, NameError> {
        validate("tenant", value)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a tenant's web application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppName(String);

impl AppName {
    pub fn new(value: &str) -> Result<Self, NameError> {
        validate("app", value)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the workload and service resources of one application.
///
/// Always recomputed from the tenant and app names; the derived value is
/// validated again because the concatenation can exceed the label length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentName(String);

impl ComponentName {
    pub fn derive(tenant: &TenantName, app: &AppName) -> Result<Self, NameError> {
        let value = format!("{}-{}", app, tenant);
        validate("component", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
