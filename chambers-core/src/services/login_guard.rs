//! Failed-login throttling for password authentication.
//!
//! The [`LoginGuard`] keeps an in-memory record per username of consecutive failed
//! logins. Once a username reaches the failure limit it is locked out until its window
//! expires; every further failure pushes the window out again.
//!
//! Lockout state is never driven by timers. Each query compares the stored expiry with
//! the current time from the guard's [`Clock`], and expired records are discarded the
//! first time they are looked at. [`LoginGuard::start_cleanup_task`] only bounds memory
//! for usernames that fail once and never return.
//!
//! State is process-local and lost on restart, so a multi-instance deployment needs a
//! shared store with per-key expiry instead.
//!
//! # Example
//!
//! ```rust
//! use chambers_core::LoginGuard;
//!
//! let guard = LoginGuard::new();
//! assert!(guard.is_allowed("alice"));
//!
//! for _ in 0..5 {
//!     guard.record_failure("alice");
//! }
//! assert!(!guard.is_allowed("alice"));
//! assert!(guard.remaining_lockout_seconds("alice") > 0);
//!
//! guard.record_success("alice");
//! assert!(guard.is_allowed("alice"));
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};

/// Failures tolerated before a username is locked out.
pub const FAILURE_LIMIT: u32 = 5;

/// How long a lockout lasts, measured from the most recent failure.
pub const LOCKOUT_DURATION: Duration = Duration::minutes(15);

const CLEANUP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5 * 60);

/// Configuration for the login guard.
#[derive(Debug, Clone)]
pub struct LoginGuardConfig {
    /// Number of consecutive failures that triggers a lockout.
    pub failure_limit: u32,
    /// Window length; reset on every failure.
    pub lockout_duration: Duration,
}

impl Default for LoginGuardConfig {
    fn default() -> Self {
        Self {
            failure_limit: FAILURE_LIMIT,
            lockout_duration: LOCKOUT_DURATION,
        }
    }
}

/// Failure bookkeeping for one username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttemptRecord {
    pub failure_count: u32,
    pub lockout_expires_at: DateTime<Utc>,
}

impl LoginAttemptRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.lockout_expires_at
    }
}

/// Snapshot of a username's lockout state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockoutStatus {
    pub username: String,
    pub failed_attempts: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    fn unlocked(username: &str) -> Self {
        Self {
            username: username.to_string(),
            failed_attempts: 0,
            is_locked: false,
            locked_until: None,
        }
    }
}

/// In-memory guard that locks a username out after repeated failed logins.
///
/// Usernames are case-sensitive keys; callers trim them before asking. All operations
/// are synchronous, O(1) and never perform I/O, so the guard can be consulted before
/// the (slower) credential check on every request.
///
/// # Thread Safety
///
/// The guard is `Send + Sync` and meant to be shared behind an `Arc`. Updates to a single
/// username go through the map's entry lock, so racing failures never lose an increment.
pub struct LoginGuard {
    attempts: DashMap<String, LoginAttemptRecord>,
    config: LoginGuardConfig,
    clock: Arc<dyn Clock>,
}

impl LoginGuard {
    /// Create a guard with the default limit and lockout duration, using the system clock.
    pub fn new() -> Self {
        Self::with_config(LoginGuardConfig::default())
    }

    pub fn with_config(config: LoginGuardConfig) -> Self {
        Self {
            attempts: DashMap::new(),
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source, typically with a [`ManualClock`](crate::ManualClock) in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &LoginGuardConfig {
        &self.config
    }

    /// Whether a login attempt for `username` may proceed to the credential check.
    ///
    /// Discards the username's record if its window has already expired.
    pub fn is_allowed(&self, username: &str) -> bool {
        let now = self.clock.now();

        if self
            .attempts
            .remove_if(username, |_, record| record.is_expired(now))
            .is_some()
        {
            tracing::debug!(username = %username, "Login lockout window expired");
            return true;
        }

        match self.attempts.get(username) {
            Some(record) => record.failure_count < self.config.failure_limit,
            None => true,
        }
    }

    /// Record a failed login for `username` and slide its window forward.
    pub fn record_failure(&self, username: &str) {
        let now = self.clock.now();
        let expires_at = now + self.config.lockout_duration;

        let failure_count = {
            let mut record = self
                .attempts
                .entry(username.to_string())
                .or_insert_with(|| LoginAttemptRecord {
                    failure_count: 0,
                    lockout_expires_at: expires_at,
                });

            // An expired record that nobody has looked at yet is already reset.
            if record.is_expired(now) {
                record.failure_count = 0;
            }

            record.failure_count = record.failure_count.saturating_add(1);
            record.lockout_expires_at = expires_at;
            record.failure_count
        };

        if failure_count == self.config.failure_limit {
            tracing::warn!(
                username = %username,
                failed_attempts = failure_count,
                locked_until = %expires_at,
                "Login locked out after repeated failures"
            );
        } else {
            tracing::debug!(
                username = %username,
                failed_attempts = failure_count,
                "Recorded failed login"
            );
        }
    }

    /// Forget all failures for `username`. Idempotent.
    pub fn record_success(&self, username: &str) {
        if self.attempts.remove(username).is_some() {
            tracing::debug!(username = %username, "Cleared failed logins");
        }
    }

    /// Whole seconds (rounded up) until the username's window expires, or 0.
    pub fn remaining_lockout_seconds(&self, username: &str) -> u64 {
        let now = self.clock.now();

        self.attempts
            .get(username)
            .map(|record| {
                let remaining = (record.lockout_expires_at - now).num_milliseconds();
                if remaining <= 0 {
                    0
                } else {
                    (remaining as u64).div_ceil(1000)
                }
            })
            .unwrap_or(0)
    }

    /// Current lockout state for `username`, with the same expiry rules as [`is_allowed`](Self::is_allowed).
    pub fn lockout_status(&self, username: &str) -> LockoutStatus {
        let now = self.clock.now();
        self.attempts.remove_if(username, |_, record| record.is_expired(now));

        match self.attempts.get(username) {
            Some(record) => {
                let is_locked = record.failure_count >= self.config.failure_limit;
                LockoutStatus {
                    username: username.to_string(),
                    failed_attempts: record.failure_count,
                    is_locked,
                    locked_until: is_locked.then_some(record.lockout_expires_at),
                }
            }
            None => LockoutStatus::unlocked(username),
        }
    }

    /// Drop every record whose window has expired. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.attempts.len();
        self.attempts.retain(|_, record| !record.is_expired(now));
        before.saturating_sub(self.attempts.len())
    }

    /// Number of usernames currently carrying at least one failure.
    pub fn tracked_usernames(&self) -> usize {
        self.attempts.len()
    }

    /// Forget every record.
    pub fn clear(&self) {
        self.attempts.clear();
    }

    /// Start the background sweep of expired records.
    ///
    /// The task wakes periodically and calls [`purge_expired`](Self::purge_expired) until
    /// the `shutdown` channel changes.
    pub fn start_cleanup_task(
        self: &Arc<Self>,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let guard = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(CLEANUP_INTERVAL);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let count = guard.purge_expired();
                        if count > 0 {
                            tracing::info!(count = count, "Purged expired login lockout records");
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down login guard cleanup task");
                        break;
                    }
                }
            }
        })
    }
}

impl Default for LoginGuard {
    fn default() -> Self {
        Self::new()
    }
}
