// ABOUTME: Local checks run before an update makes any remote call.
// ABOUTME: Rejects reserved or empty environment variables and unsupported lifecycles.

use crate::types::LifecycleType;
use std::collections::BTreeMap;

const RESERVED_NAMES: &[&str] = &["PORT"];
const RESERVED_PREFIX: &str = "VCAP_";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("environment variable name cannot be empty")]
    EmptyName,

    #[error("environment variable {0} is reserved by the platform")]
    ReservedName(String),

    #[error("environment variable {0} uses the reserved {RESERVED_PREFIX} prefix")]
    ReservedPrefix(String),

    #[error("environment variable {0} has an empty value")]
    EmptyValue(String),

    #[error("lifecycle type {0} is not supported")]
    UnsupportedLifecycle(LifecycleType),
}

pub fn validate_environment(env: &BTreeMap<String, String>) -> Result<(), ValidationError> {
    for (name, value) in env {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(ValidationError::ReservedName(name.clone()));
        }
        if name.starts_with(RESERVED_PREFIX) {
            return Err(ValidationError::ReservedPrefix(name.clone()));
        }
        if value.is_empty() {
            return Err(ValidationError::EmptyValue(name.clone()));
        }
    }
    Ok(())
}
