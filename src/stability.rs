// ABOUTME: Classifies a process's instances as stable, crashed, or still pending.
// ABOUTME: Drives a poll loop until a process settles after a start or deployment.

use crate::diagnostics::Diagnostics;
use crate::foundry::{FoundryError, InstanceState, ProcessInstance, ProcessOps};
use crate::poll::{Cancellation, Poll, WaitConfig, WaitError, wait_for};
use crate::step::Step;
use crate::types::ProcessGuid;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Instance counts for one process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceTally {
    pub running: u32,
    pub crashed: u32,
    pub total: u32,
}

impl InstanceTally {
    pub fn of(instances: &[ProcessInstance]) -> Self {
        instances
            .iter()
            .fold(InstanceTally::default(), |mut tally, instance| {
                tally.total += 1;
                match instance.state {
                    InstanceState::Running => tally.running += 1,
                    InstanceState::Crashed => tally.crashed += 1,
                    _ => {}
                }
                tally
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pending,
    Stable,
    /// Every reported instance has crashed.
    Crashed { total: u32 },
}

/// How to read a process that wants instances but reports none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroInstancePolicy {
    /// Treat as stable, as the platform's own tooling does.
    #[default]
    Stable,
    /// Keep waiting until instances appear.
    Pending,
}

pub fn crashed_message(total: u32) -> String {
    format!("all {total} process instances are in a crashed state")
}

/// Judge one observation of a process that wants `desired` instances.
pub fn classify(desired: u32, tally: InstanceTally, policy: ZeroInstancePolicy) -> Verdict {
    if tally.total == 0 {
        if desired == 0 {
            return Verdict::Stable;
        }
        return match policy {
            ZeroInstancePolicy::Stable => {
                tracing::debug!(desired, "no instances reported; treating process as stable");
                Verdict::Stable
            }
            ZeroInstancePolicy::Pending => Verdict::Pending,
        };
    }
    if tally.running == desired {
        Verdict::Stable
    } else if tally.crashed == tally.total {
        Verdict::Crashed { total: tally.total }
    } else {
        Verdict::Pending
    }
}

/// Poll `process` until it is stable.
///
/// Both the desired count and the instance list are re-read on every poll.
/// A fully crashed process fails the wait at once.
pub async fn wait_for_process<F>(
    foundry: &F,
    process: &ProcessGuid,
    config: &WaitConfig,
    policy: ZeroInstancePolicy,
    cancel: &Cancellation,
    diag: &mut Diagnostics,
) -> Result<(), WaitError>
where
    F: ProcessOps + ?Sized,
{
    let warnings = Mutex::new(Vec::new());
    let collected = &warnings;
    let what = format!("process {process}");

    let result = wait_for(&what, config, cancel, move || async move {
        let desired = foundry.get_process(process).await?;
        let instances = foundry.get_process_instances(process).await?;
        {
            let mut collected = collected.lock();
            collected.extend(desired.warnings);
            collected.extend(instances.warnings);
        }

        let tally = InstanceTally::of(&instances.value);
        tracing::debug!(
            %process,
            desired = desired.value.instances,
            running = tally.running,
            crashed = tally.crashed,
            total = tally.total,
            "process instances"
        );
        Ok::<_, FoundryError>(match classify(desired.value.instances, tally, policy) {
            Verdict::Stable => Poll::Ready(()),
            Verdict::Pending => Poll::Pending,
            Verdict::Crashed { total } => Poll::Failed(crashed_message(total)),
        })
    })
    .await;

    diag.platform_warnings(&Step::WaitProcessStable, warnings.into_inner());
    result
}
