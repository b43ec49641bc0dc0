// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles app names, GUIDs, docker images, and the application list.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::HashSet;

use super::AppConfig;
use crate::types::{AppGuid, DockerImage};

pub fn deserialize_app_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    if name.trim().is_empty() {
        return Err(serde::de::Error::custom("application name must not be empty"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(serde::de::Error::custom(format!(
            "invalid application name {name:?}: path separators are not allowed"
        )));
    }
    Ok(name)
}

pub fn deserialize_app_guid<'de, D>(deserializer: D) -> Result<AppGuid, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    AppGuid::parse(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_docker_image_option<'de, D>(
    deserializer: D,
) -> Result<Option<DockerImage>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.map(|s| DockerImage::parse(&s).map_err(serde::de::Error::custom))
        .transpose()
}

pub fn deserialize_apps<'de, D>(deserializer: D) -> Result<NonEmpty<AppConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let apps: Vec<AppConfig> = Vec::deserialize(deserializer)?;

    let mut seen = HashSet::new();
    if let Some(dup) = apps.iter().find(|a| !seen.insert(a.name.as_str())) {
        return Err(serde::de::Error::custom(format!(
            "duplicate application name: {}",
            dup.name
        )));
    }

    NonEmpty::from_vec(apps)
        .ok_or_else(|| serde::de::Error::custom("at least one application is required"))
}
