// ABOUTME: Bounded, immediate retry of whole rollout attempts.
// ABOUTME: Presets match the update path (5 attempts) and the bare deployment path (3).

use std::num::NonZeroU32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: NonZeroU32,
}

impl RetryPolicy {
    pub const INTERACTIVE_ATTEMPTS: u32 = 5;
    pub const STANDALONE_ATTEMPTS: u32 = 3;

    /// A policy allowing `max_attempts` attempts; zero is raised to one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: NonZeroU32::new(max_attempts).unwrap_or(NonZeroU32::MIN),
        }
    }

    /// Used when an application update redeploys a new droplet.
    pub fn interactive() -> Self {
        Self::new(Self::INTERACTIVE_ATTEMPTS)
    }

    /// Used when deploying an existing droplet directly.
    pub fn standalone() -> Self {
        Self::new(Self::STANDALONE_ATTEMPTS)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::interactive()
    }
}
