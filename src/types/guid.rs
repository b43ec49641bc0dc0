// ABOUTME: Phantom-typed platform GUIDs for compile-time resource safety.
// ABOUTME: Keeps app, package, build, droplet, deployment, and process GUIDs apart.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use thiserror::Error;

pub enum AppMarker {}
pub enum PackageMarker {}
pub enum BuildMarker {}
pub enum DropletMarker {}
pub enum DeploymentMarker {}
pub enum ProcessMarker {}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuidError {
    #[error("GUID cannot be empty")]
    Empty,

    #[error("GUID contains invalid character {0:?}")]
    InvalidChar(char),
}

/// A platform-issued GUID tagged with the kind of resource it names.
///
/// A `DropletGuid` cannot be handed to an operation expecting an `AppGuid`.
/// GUIDs arriving from the platform are trusted as-is; GUIDs typed by a
/// user go through [`Guid::parse`].
#[must_use = "GUIDs reference platform resources and should not be ignored"]
pub struct Guid<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Guid<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    /// Validate user input: non-empty, hex digits and dashes only.
    pub fn parse(input: &str) -> Result<Self, GuidError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(GuidError::Empty);
        }
        if let Some(c) = input.chars().find(|c| !c.is_ascii_hexdigit() && *c != '-') {
            return Err(GuidError::InvalidChar(c));
        }
        Ok(Self::new(input.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

// T is only a marker, so none of these may require bounds on it.

impl<T> std::fmt::Debug for Guid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Guid").field(&self.value).finish()
    }
}

impl<T> Clone for Guid<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Guid<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Guid<T> {}

impl<T> Hash for Guid<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Guid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> Serialize for Guid<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T> Deserialize<'de> for Guid<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

pub type AppGuid = Guid<AppMarker>;
pub type PackageGuid = Guid<PackageMarker>;
pub type BuildGuid = Guid<BuildMarker>;
pub type DropletGuid = Guid<DropletMarker>;
pub type DeploymentGuid = Guid<DeploymentMarker>;
pub type ProcessGuid = Guid<ProcessMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_and_normalizes_guid() {
        let guid = AppGuid::parse(" 3A5D3D89-3F89-4F05-8188-8A2B298C79D5 ").unwrap();
        assert_eq!(guid.as_str(), "3a5d3d89-3f89-4f05-8188-8a2b298c79d5");
    }

    #[test]
    fn parse_rejects_empty_and_garbage() {
        assert_eq!(DropletGuid::parse("  "), Err(GuidError::Empty));
        assert_eq!(DropletGuid::parse("abc/def"), Err(GuidError::InvalidChar('/')));
    }

    #[test]
    fn serializes_as_plain_string() {
        let guid = BuildGuid::new("b-1");
        assert_eq!(serde_json::to_string(&guid).unwrap(), "\"b-1\"");
        let back: BuildGuid = serde_json::from_str("\"b-1\"").unwrap();
        assert_eq!(back, guid);
    }
}
