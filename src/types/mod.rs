// ABOUTME: Type-safe platform identifiers and validated domain types.
// ABOUTME: Phantom-typed GUIDs keep resource kinds apart at compile time.

mod docker_image;
mod guid;
mod lifecycle;

pub use docker_image::{DockerImage, DockerImageError};
pub use guid::{
    AppGuid, AppMarker, BuildGuid, BuildMarker, DeploymentGuid, DeploymentMarker, DropletGuid,
    DropletMarker, Guid, GuidError, PackageGuid, PackageMarker, ProcessGuid, ProcessMarker,
};
pub use lifecycle::LifecycleType;
