//! Per-address failed-attempt tracking with temporary lockout.

use chrono::{DateTime, Utc};
use std::{collections::HashMap, net::IpAddr, time::Duration};
use tokio::sync::RwLock;

/// Lockout policy for the authentication service.
#[derive(Clone, Copy, Debug)]
pub struct LockoutPolicy {
    /// Failed attempts that trip the lockout.
    pub max_attempts: u32,
    /// How long a tripped address stays refused.
    pub lockout: Duration,
}

impl LockoutPolicy {
    pub const fn new(max_attempts: u32, lockout: Duration) -> Self {
        Self {
            max_attempts,
            lockout,
        }
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(300))
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct AttemptState {
    failures: u32,
    locked_until: Option<DateTime<Utc>>,
}

/// Failed-attempt state keyed by source address.
///
/// Attempt state is created lazily on the first failure, cleared on a
/// successful login, and garbage-collected by the expiry check whenever
/// a locked address is read again.
pub struct LockoutTracker {
    policy: LockoutPolicy,
    attempts: RwLock<HashMap<IpAddr, AttemptState>>,
}

impl LockoutTracker {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            policy,
            attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Whether the address is currently locked out. Observing an expired
    /// lockout clears it together with the failure counter.
    pub async fn is_locked_out(&self, addr: IpAddr) -> bool {
        let mut attempts = self.attempts.write().await;
        match attempts.get(&addr).and_then(|state| state.locked_until) {
            Some(until) if Utc::now() < until => true,
            Some(_) => {
                attempts.remove(&addr);
                false
            }
            None => false,
        }
    }

    /// Record a failed attempt; returns `true` when this failure is the
    /// one that trips the lockout. Increment and threshold comparison
    /// happen under a single write lock so concurrent workers cannot
    /// push the count past the threshold without a lockout being
    /// recorded.
    pub async fn record_failure(&self, addr: IpAddr) -> bool {
        let mut attempts = self.attempts.write().await;
        let state = attempts.entry(addr).or_default();
        state.failures += 1;
        if state.failures >= self.policy.max_attempts && state.locked_until.is_none() {
            let lockout = chrono::Duration::from_std(self.policy.lockout)
                .unwrap_or(chrono::Duration::MAX);
            state.locked_until = Some(Utc::now() + lockout);
            return true;
        }
        false
    }

    /// Forget all attempt state for an address (successful login).
    pub async fn clear(&self, addr: IpAddr) {
        self.attempts.write().await.remove(&addr);
    }
}
