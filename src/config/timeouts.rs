// ABOUTME: Wait and retry settings from the timeouts and retry sections.
// ABOUTME: Durations use humantime strings such as "5s" or "15m".

use crate::deploy::{RetryPolicy, RolloutSettings};
use crate::lifecycle::UpdateSettings;
use crate::poll::WaitConfig;
use crate::stability::ZeroInstancePolicy;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_job_timeout", with = "humantime_serde")]
    pub stage: Duration,

    #[serde(default = "default_job_timeout", with = "humantime_serde")]
    pub deploy: Duration,

    #[serde(default = "default_job_timeout", with = "humantime_serde")]
    pub start: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub delay: Duration,

    #[serde(default = "default_stabilize_interval", with = "humantime_serde")]
    pub stabilize_interval: Duration,

    #[serde(default = "default_not_found_checks")]
    pub not_found_checks: u32,
}

fn default_job_timeout() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_stabilize_interval() -> Duration {
    RolloutSettings::STABILIZE_INTERVAL
}

fn default_not_found_checks() -> u32 {
    2
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            stage: default_job_timeout(),
            deploy: default_job_timeout(),
            start: default_job_timeout(),
            poll_interval: default_poll_interval(),
            delay: default_poll_interval(),
            stabilize_interval: default_stabilize_interval(),
            not_found_checks: default_not_found_checks(),
        }
    }
}

impl TimeoutsConfig {
    fn wait(&self, timeout: Duration) -> WaitConfig {
        WaitConfig::new(timeout)
            .poll_interval(self.poll_interval)
            .delay(self.delay)
            .not_found_checks(self.not_found_checks)
    }

    pub fn stage_wait(&self) -> WaitConfig {
        self.wait(self.stage)
    }

    pub fn rollout(&self, zero_instances: ZeroInstancePolicy) -> RolloutSettings {
        RolloutSettings {
            deploy_wait: self.wait(self.deploy),
            stabilize_wait: self
                .wait(self.deploy)
                .poll_interval(self.stabilize_interval)
                .delay(self.stabilize_interval),
            start_wait: self.wait(self.start),
            zero_instances,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryConfig {
    /// Rollout attempts when an update deploys a new droplet.
    #[serde(default = "default_update_attempts")]
    pub update_attempts: u32,

    /// Rollout attempts when deploying an existing droplet directly.
    #[serde(default = "default_deployment_attempts")]
    pub deployment_attempts: u32,
}

fn default_update_attempts() -> u32 {
    RetryPolicy::INTERACTIVE_ATTEMPTS
}

fn default_deployment_attempts() -> u32 {
    RetryPolicy::STANDALONE_ATTEMPTS
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            update_attempts: default_update_attempts(),
            deployment_attempts: default_deployment_attempts(),
        }
    }
}

impl RetryConfig {
    pub fn update_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.update_attempts)
    }

    pub fn deployment_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.deployment_attempts)
    }
}

/// Everything an application update needs from the two sections.
pub fn update_settings(
    timeouts: &TimeoutsConfig,
    retry: &RetryConfig,
    zero_instances: ZeroInstancePolicy,
) -> UpdateSettings {
    UpdateSettings {
        stage_wait: timeouts.stage_wait(),
        rollout: timeouts.rollout(zero_instances),
        retry: retry.update_policy(),
    }
}
