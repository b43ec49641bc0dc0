// ABOUTME: Diagnostics accumulator for non-fatal warnings during staging and rollout.
// ABOUTME: Platform warnings and retried attempts are kept for the caller to report.

use crate::step::Step;

/// Collects non-fatal warnings across every step of an operation.
///
/// Warnings survive a failing operation: callers hold the collection and
/// read it after the error has been returned.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(step = %warning.step, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Record every warning text the platform attached to a response.
    pub fn platform_warnings<I, S>(&mut self, step: &Step, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for message in messages {
            self.warn(Warning::platform(step.to_string(), message));
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings recorded under the given step name.
    pub fn for_step<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Warning> + 'a {
        self.warnings
            .iter()
            .filter(move |w| w.step == name || w.step.starts_with(&format!("{name} ")))
    }
}

/// A non-fatal warning, tagged with the step that produced it.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub step: String,
    pub message: String,
}

impl Warning {
    /// A warning the platform returned alongside a successful response.
    pub fn platform(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Platform,
            step: step.into(),
            message: message.into(),
        }
    }

    /// A deployment attempt failed and will be retried.
    pub fn retried_attempt(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RetriedAttempt,
            step: step.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Sent by the platform in the `X-Cf-Warnings` header.
    Platform,
    /// A rollout attempt failed before the retry budget ran out.
    RetriedAttempt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn platform_warnings_are_tagged_with_step() {
        let mut diag = Diagnostics::default();
        diag.platform_warnings(&Step::UploadBits, ["bits are large", "quota near limit"]);

        assert_eq!(diag.warnings().len(), 2);
        assert!(diag.warnings().iter().all(|w| w.step == "upload-bits"));
        assert!(diag.warnings().iter().all(|w| w.kind == WarningKind::Platform));
    }

    #[test]
    fn for_step_matches_steps_with_arguments() {
        let mut diag = Diagnostics::default();
        let step = Step::CreateDeployment(crate::types::DropletGuid::new("d1"));
        diag.platform_warnings(&step, ["slow"]);
        diag.warn(Warning::retried_attempt("wait-deployment", "timed out"));

        assert_eq!(diag.for_step("create-deployment").count(), 1);
        assert_eq!(diag.for_step("wait-deployment").count(), 1);
        assert_eq!(diag.for_step("upload-bits").count(), 0);
    }
}
