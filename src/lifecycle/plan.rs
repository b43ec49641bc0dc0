// ABOUTME: Pure decisions about what an update must do remotely.
// ABOUTME: Compares desired configuration with the inputs applied last time.

use super::desired::{AppliedInputs, DesiredApp, LifecycleSpec};
use super::validate::ValidationError;
use crate::foundry::EnvironmentPatch;
use crate::stage::SourceSpec;

/// Whether the application needs a new droplet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingPlan {
    /// The current droplet still matches the configuration.
    Keep,
    Stage(SourceSpec),
}

impl StagingPlan {
    pub fn is_stage(&self) -> bool {
        matches!(self, StagingPlan::Stage(_))
    }
}

/// Decide whether `desired` has to be staged again.
///
/// Without a previous record every input counts as changed. A changed
/// configuration without anything to stage from keeps the current droplet.
pub fn plan_staging(
    previous: Option<&AppliedInputs>,
    desired: &DesiredApp,
) -> Result<StagingPlan, ValidationError> {
    let next = desired.inputs();
    let unchanged = |same: fn(&AppliedInputs, &AppliedInputs) -> bool| {
        previous.is_some_and(|prev| {
            prev.lifecycle == next.lifecycle
                && prev.environment == next.environment
                && same(prev, &next)
        })
    };

    match &desired.lifecycle {
        LifecycleSpec::Buildpack { source_path, .. } => {
            let same = unchanged(|a, b| {
                a.buildpacks == b.buildpacks
                    && a.stack == b.stack
                    && a.source_path == b.source_path
                    && a.source_hash == b.source_hash
            });
            Ok(match source_path {
                Some(path) if !same => StagingPlan::Stage(SourceSpec::archive(path)),
                _ => StagingPlan::Keep,
            })
        }
        LifecycleSpec::Docker { image, credentials } => {
            let same = unchanged(|a, b| {
                a.docker_image == b.docker_image && a.docker_credentials == b.docker_credentials
            });
            Ok(match image {
                Some(image) if !same => StagingPlan::Stage(SourceSpec::Image {
                    image: image.clone(),
                    credentials: credentials.clone(),
                }),
                _ => StagingPlan::Keep,
            })
        }
        LifecycleSpec::Kpack => Err(ValidationError::UnsupportedLifecycle(
            desired.lifecycle.kind(),
        )),
    }
}

/// The environment update to send, if the variables changed.
///
/// Variables present last time but no longer desired are unset.
pub fn plan_environment(
    previous: Option<&AppliedInputs>,
    desired: &DesiredApp,
) -> Option<EnvironmentPatch> {
    let next = desired.inputs();
    if previous.is_some_and(|prev| prev.environment == next.environment) {
        return None;
    }

    let mut patch: EnvironmentPatch = desired
        .environment
        .iter()
        .map(|(k, v)| (k.clone(), Some(v.clone())))
        .collect();
    if let Some(prev) = previous {
        for removed in prev.environment.keys() {
            patch.entry(removed.clone()).or_insert(None);
        }
    }
    if patch.is_empty() { None } else { Some(patch) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundry::AppState;
    use crate::types::{AppGuid, DockerImage};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn buildpack_app(source: Option<&str>) -> DesiredApp {
        DesiredApp {
            guid: AppGuid::new("a1"),
            name: "web".into(),
            lifecycle: LifecycleSpec::Buildpack {
                buildpacks: vec!["ruby_buildpack".into()],
                stack: Some("cflinuxfs4".into()),
                source_path: source.map(PathBuf::from),
                source_hash: Some("abc".into()),
            },
            environment: BTreeMap::from([("MODE".to_string(), "prod".to_string())]),
            state: AppState::Started,
        }
    }

    #[test]
    fn first_update_stages_configured_source() {
        let app = buildpack_app(Some("app.zip"));
        assert_eq!(
            plan_staging(None, &app).unwrap(),
            StagingPlan::Stage(SourceSpec::archive("app.zip"))
        );
    }

    #[test]
    fn unchanged_inputs_keep_droplet() {
        let app = buildpack_app(Some("app.zip"));
        let prev = app.inputs();
        assert_eq!(plan_staging(Some(&prev), &app).unwrap(), StagingPlan::Keep);
    }

    #[test]
    fn changed_hash_restages() {
        let app = buildpack_app(Some("app.zip"));
        let mut prev = app.inputs();
        prev.source_hash = Some("old".into());
        assert!(plan_staging(Some(&prev), &app).unwrap().is_stage());
    }

    #[test]
    fn changed_environment_restages() {
        let mut app = buildpack_app(Some("app.zip"));
        let prev = app.inputs();
        app.environment.insert("MODE".into(), "staging".into());
        assert!(plan_staging(Some(&prev), &app).unwrap().is_stage());
    }

    #[test]
    fn change_without_source_keeps_droplet() {
        let app = buildpack_app(None);
        assert_eq!(plan_staging(None, &app).unwrap(), StagingPlan::Keep);
    }

    #[test]
    fn docker_image_change_restages() {
        let mut app = buildpack_app(None);
        app.lifecycle = LifecycleSpec::Docker {
            image: Some(DockerImage::parse("org/web:1").unwrap()),
            credentials: None,
        };
        let prev = app.inputs();
        assert_eq!(plan_staging(Some(&prev), &app).unwrap(), StagingPlan::Keep);

        app.lifecycle = LifecycleSpec::Docker {
            image: Some(DockerImage::parse("org/web:2").unwrap()),
            credentials: None,
        };
        assert!(plan_staging(Some(&prev), &app).unwrap().is_stage());
    }

    #[test]
    fn kpack_is_rejected() {
        let mut app = buildpack_app(None);
        app.lifecycle = LifecycleSpec::Kpack;
        assert!(matches!(
            plan_staging(None, &app),
            Err(ValidationError::UnsupportedLifecycle(_))
        ));
    }

    #[test]
    fn removed_variables_are_unset() {
        let mut app = buildpack_app(None);
        let prev = app.inputs();
        app.environment = BTreeMap::from([("OTHER".to_string(), "1".to_string())]);

        let patch = plan_environment(Some(&prev), &app).unwrap();
        assert_eq!(patch.get("OTHER"), Some(&Some("1".to_string())));
        assert_eq!(patch.get("MODE"), Some(&None));
    }

    #[test]
    fn unchanged_environment_sends_nothing() {
        let app = buildpack_app(None);
        assert_eq!(plan_environment(Some(&app.inputs()), &app), None);
    }
}
