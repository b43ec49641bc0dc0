// ABOUTME: Staging pipeline that turns source into a droplet.
// ABOUTME: Exports the stager, source specification, and staging errors.

mod error;
mod pipeline;
mod source;

pub use error::{StageError, StageErrorKind};
pub use pipeline::Stager;
pub use source::{SourceSpec, read_archive};
