// ABOUTME: Integration tests for the package/build staging pipeline.
// ABOUTME: Runs archive and docker staging against the scripted platform fake.

mod support;

use cfrollout::diagnostics::Diagnostics;
use cfrollout::foundry::{Build, BuildState, PackageState, RegistryCredentials};
use cfrollout::poll::{Cancellation, WaitConfig, cancellation};
use cfrollout::stage::{SourceSpec, StageError, StageErrorKind, Stager};
use cfrollout::types::{BuildGuid, DockerImage};
use std::path::PathBuf;
use std::time::Duration;
use support::{FakeFoundry, Script, app_guid, staged_build};

fn wait() -> WaitConfig {
    WaitConfig::new(Duration::from_secs(15 * 60))
}

fn archive(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("app.zip");
    std::fs::write(&path, b"PK\x03\x04 not really a zip").unwrap();
    path
}

fn staging(droplet: Option<&str>) -> Build {
    Build {
        guid: BuildGuid::new("unset"),
        state: BuildState::Staging,
        droplet: droplet.map(cfrollout::types::DropletGuid::new),
        error: None,
    }
}

#[tokio::test(start_paused = true)]
async fn archive_is_uploaded_built_and_fetched() {
    support::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = archive(&dir);
    let foundry = FakeFoundry::new();
    foundry.script(|s| {
        s.package_polls = Script::of([PackageState::ProcessingUpload, PackageState::Ready]);
        s.build_polls = Script::of([staging(None), staging(None), staged_build("droplet-9")]);
    });

    let stager = Stager::new(&foundry, wait(), Cancellation::never());
    let mut diag = Diagnostics::default();
    let droplet = stager
        .stage(&app_guid(), &SourceSpec::archive(&path), &mut diag)
        .await
        .unwrap();

    assert_eq!(droplet.guid.as_str(), "droplet-9");
    assert_eq!(foundry.inspect(|s| s.uploads.clone()), vec![21]);
    assert_eq!(foundry.calls_to("get_package"), 2);
    // three polls plus the re-read after staging
    assert_eq!(foundry.calls_to("get_build"), 4);
    assert_eq!(
        foundry.calls(),
        vec![
            "create_package",
            "upload_package_bits",
            "get_package",
            "get_package",
            "create_build",
            "get_build",
            "get_build",
            "get_build",
            "get_build",
            "get_droplet",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn invalid_archive_fails_before_any_remote_call() {
    let dir = tempfile::tempdir().unwrap();
    let foundry = FakeFoundry::new();
    let stager = Stager::new(&foundry, wait(), Cancellation::never());

    for path in [PathBuf::new(), dir.path().join("missing.zip"), dir.path().to_path_buf()] {
        let err = stager
            .stage_from_archive(&app_guid(), &path, &mut Diagnostics::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StageErrorKind::Validation, "{path:?}");
    }
    assert!(foundry.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_package_aborts_staging() {
    let dir = tempfile::tempdir().unwrap();
    let path = archive(&dir);
    let foundry = FakeFoundry::new();
    foundry.script(|s| s.package_polls = Script::of([PackageState::Failed]));

    let err = Stager::new(&foundry, wait(), Cancellation::never())
        .stage_from_archive(&app_guid(), &path, &mut Diagnostics::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), StageErrorKind::JobFailed);
    assert_eq!(err.step().map(|s| s.name()), Some("wait-package-ready"));
    assert_eq!(foundry.calls_to("create_build"), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_build_surfaces_platform_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = archive(&dir);
    let foundry = FakeFoundry::new();
    foundry.script(|s| {
        s.build_polls = Script::of([Build {
            guid: BuildGuid::new("unset"),
            state: BuildState::Failed,
            droplet: None,
            error: Some("NoAppDetectedError".into()),
        }])
    });

    let err = Stager::new(&foundry, wait(), Cancellation::never())
        .stage_from_archive(&app_guid(), &path, &mut Diagnostics::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), StageErrorKind::JobFailed);
    assert!(err.to_string().contains("NoAppDetectedError"), "{err}");
    assert_eq!(foundry.calls_to("get_droplet"), 0);
}

#[tokio::test(start_paused = true)]
async fn staged_build_without_droplet_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = archive(&dir);
    let foundry = FakeFoundry::new();
    foundry.script(|s| {
        s.build_polls = Script::of([Build {
            guid: BuildGuid::new("unset"),
            state: BuildState::Staged,
            droplet: None,
            error: None,
        }])
    });

    let err = Stager::new(&foundry, wait(), Cancellation::never())
        .stage_from_archive(&app_guid(), &path, &mut Diagnostics::default())
        .await
        .unwrap_err();

    assert!(matches!(err, StageError::MissingDroplet { .. }));
}

#[tokio::test(start_paused = true)]
async fn image_is_built_without_upload() {
    let foundry = FakeFoundry::new();
    foundry.script(|s| {
        s.warnings.insert("create_package", vec!["image pulled anonymously".into()]);
    });
    let source = SourceSpec::Image {
        image: DockerImage::parse("registry.example.com/team/web:2").unwrap(),
        credentials: Some(RegistryCredentials {
            username: "bot".into(),
            password: "secret".into(),
        }),
    };

    let mut diag = Diagnostics::default();
    let droplet = Stager::new(&foundry, wait(), Cancellation::never())
        .stage(&app_guid(), &source, &mut diag)
        .await
        .unwrap();

    assert_eq!(droplet.guid.as_str(), "droplet-new");
    assert_eq!(foundry.calls_to("upload_package_bits"), 0);
    assert_eq!(foundry.calls_to("get_package"), 0);
    let warnings: Vec<_> = diag.for_step("create-docker-package").collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "image pulled anonymously");
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_build_wait() {
    let (handle, cancel) = cancellation();
    let foundry = FakeFoundry::new();
    foundry.script(|s| s.build_polls = Script::of([staging(None)]));
    let stager = Stager::new(&foundry, wait(), cancel);
    let source = SourceSpec::image(DockerImage::parse("org/web:1").unwrap());

    let mut diag = Diagnostics::default();
    let app = app_guid();
    let pending = stager.stage(&app, &source, &mut diag);
    let interrupt = async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        handle.cancel();
    };
    let (result, _) = tokio::join!(pending, interrupt);

    assert_eq!(result.unwrap_err().kind(), StageErrorKind::Cancelled);
}
