// ABOUTME: Package → upload → build → droplet staging for archives and images.
// ABOUTME: Aborts on the first failure; created packages and builds are left in place.

use super::error::{ApiSnafu, MissingDropletSnafu, StageError, WaitSnafu};
use super::source::{SourceSpec, read_archive};
use crate::diagnostics::Diagnostics;
use crate::foundry::{
    Build, BuildOps, BuildState, Droplet, DropletOps, FoundryError, PackageOps, PackageSource,
    PackageState, RegistryCredentials,
};
use crate::poll::{Cancellation, Poll, WaitConfig, wait_for};
use crate::step::Step;
use crate::types::{AppGuid, BuildGuid, DockerImage, PackageGuid};
use bytes::Bytes;
use parking_lot::Mutex;
use snafu::{OptionExt, ResultExt};
use std::path::Path;

/// The step names used by one staging flavour.
struct BuildSteps {
    create: Step,
    wait: Step,
    get: Step,
    droplet: Step,
}

const ARCHIVE_STEPS: BuildSteps = BuildSteps {
    create: Step::CreateBuild,
    wait: Step::WaitBuildStaged,
    get: Step::GetBuild,
    droplet: Step::GetBuiltDroplet,
};

const IMAGE_STEPS: BuildSteps = BuildSteps {
    create: Step::CreateDockerBuild,
    wait: Step::WaitDockerBuildStaged,
    get: Step::GetDockerBuild,
    droplet: Step::GetBuiltDockerDroplet,
};

/// Turns application source into a staged droplet.
pub struct Stager<'a, F: ?Sized> {
    foundry: &'a F,
    wait: WaitConfig,
    cancel: Cancellation,
}

impl<'a, F> Stager<'a, F>
where
    F: PackageOps + BuildOps + DropletOps + ?Sized,
{
    pub fn new(foundry: &'a F, wait: WaitConfig, cancel: Cancellation) -> Self {
        Self {
            foundry,
            wait,
            cancel,
        }
    }

    pub async fn stage(
        &self,
        app: &AppGuid,
        source: &SourceSpec,
        diag: &mut Diagnostics,
    ) -> Result<Droplet, StageError> {
        match source {
            SourceSpec::Archive { path } => self.stage_from_archive(app, path, diag).await,
            SourceSpec::Image { image, credentials } => {
                self.stage_from_image(app, image, credentials.as_ref(), diag)
                    .await
            }
        }
    }

    pub async fn stage_from_archive(
        &self,
        app: &AppGuid,
        archive: &Path,
        diag: &mut Diagnostics,
    ) -> Result<Droplet, StageError> {
        let bits = read_archive(archive).await?;
        tracing::info!(%app, archive = %archive.display(), "staging from archive");
        self.stage_bits(app, bits, diag).await
    }

    /// Stage an archive that has already been read from disk.
    pub async fn stage_bits(
        &self,
        app: &AppGuid,
        bits: Bytes,
        diag: &mut Diagnostics,
    ) -> Result<Droplet, StageError> {
        let step = Step::CreateBitsPackage;
        let package = self
            .foundry
            .create_package(app, &PackageSource::Bits)
            .await
            .context(ApiSnafu { step: step.clone() })?
            .record(diag, &step);

        let step = Step::UploadBits;
        self.foundry
            .upload_package_bits(&package.guid, bits)
            .await
            .context(ApiSnafu { step: step.clone() })?
            .record(diag, &step);

        self.await_package_ready(&package.guid, diag).await?;

        let step = ARCHIVE_STEPS.create.clone();
        let build = self
            .foundry
            .create_build(&package.guid)
            .await
            .context(ApiSnafu { step: step.clone() })?
            .record(diag, &step);

        self.finish_build(&build.guid, &ARCHIVE_STEPS, diag).await
    }

    pub async fn stage_from_image(
        &self,
        app: &AppGuid,
        image: &DockerImage,
        credentials: Option<&RegistryCredentials>,
        diag: &mut Diagnostics,
    ) -> Result<Droplet, StageError> {
        tracing::info!(%app, %image, "staging from docker image");

        let step = Step::CreateDockerPackage;
        let source = PackageSource::Docker {
            image: image.clone(),
            credentials: credentials.cloned(),
        };
        let package = self
            .foundry
            .create_package(app, &source)
            .await
            .context(ApiSnafu { step: step.clone() })?
            .record(diag, &step);

        let step = IMAGE_STEPS.create.clone();
        let build = self
            .foundry
            .create_build(&package.guid)
            .await
            .context(ApiSnafu { step: step.clone() })?
            .record(diag, &step);

        self.finish_build(&build.guid, &IMAGE_STEPS, diag).await
    }

    async fn await_package_ready(
        &self,
        package: &PackageGuid,
        diag: &mut Diagnostics,
    ) -> Result<(), StageError> {
        let foundry = self.foundry;
        let warnings = Mutex::new(Vec::new());
        let collected = &warnings;
        let what = format!("package {package}");

        let result = wait_for(&what, &self.wait, &self.cancel, move || async move {
            let reply = foundry.get_package(package).await?;
            collected.lock().extend(reply.warnings);
            Ok::<_, FoundryError>(match reply.value.state {
                PackageState::Ready => Poll::Ready(()),
                state if state.is_pending() => Poll::Pending,
                state => Poll::Failed(format!("package entered state {state:?}")),
            })
        })
        .await;

        let step = Step::WaitPackageReady;
        diag.platform_warnings(&step, warnings.into_inner());
        result.context(WaitSnafu { step })
    }

    /// Wait for a build to stage, re-read it, and fetch its droplet.
    async fn finish_build(
        &self,
        build: &BuildGuid,
        steps: &BuildSteps,
        diag: &mut Diagnostics,
    ) -> Result<Droplet, StageError> {
        let foundry = self.foundry;
        let warnings = Mutex::new(Vec::new());
        let collected = &warnings;
        let what = format!("build {build}");

        let result = wait_for(&what, &self.wait, &self.cancel, move || async move {
            let reply = foundry.get_build(build).await?;
            collected.lock().extend(reply.warnings);
            Ok::<_, FoundryError>(classify_build(reply.value))
        })
        .await;

        diag.platform_warnings(&steps.wait, warnings.into_inner());
        result.context(WaitSnafu {
            step: steps.wait.clone(),
        })?;

        let staged = self
            .foundry
            .get_build(build)
            .await
            .context(ApiSnafu {
                step: steps.get.clone(),
            })?
            .record(diag, &steps.get);

        let droplet_guid = staged.droplet.context(MissingDropletSnafu {
            step: steps.get.clone(),
            build: build.clone(),
        })?;

        let droplet = self
            .foundry
            .get_droplet(&droplet_guid)
            .await
            .context(ApiSnafu {
                step: steps.droplet.clone(),
            })?
            .record(diag, &steps.droplet);

        tracing::info!(%build, droplet = %droplet.guid, "droplet staged");
        Ok(droplet)
    }
}

fn classify_build(build: Build) -> Poll<()> {
    match build.state {
        BuildState::Staged => Poll::Ready(()),
        BuildState::Staging => Poll::Pending,
        BuildState::Failed => Poll::Failed(
            build
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "staging failed".to_string()),
        ),
        BuildState::Unknown => Poll::Failed("build entered an unknown state".to_string()),
    }
}
