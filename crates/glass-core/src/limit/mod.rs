//! Per-session sliding-window admission control.
//!
//! Each session keeps the instants of its accepted commands. On every check the list is
//! pruned to the trailing window and the command is accepted while fewer than
//! `max_commands` remain. Session state is created on first contact and never evicted.
use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use glass_model::RateLimitConfig;
use tokio::time::Instant;
use tracing::debug;

pub struct RateLimiter {
    enabled: bool,
    max_commands: usize,
    window: Duration,
    sessions: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(cfg: &RateLimitConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            max_commands: cfg.max_commands,
            window: cfg.window(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// A limiter that accepts everything.
    pub fn disabled() -> Self {
        Self::new(&RateLimitConfig {
            enabled: false,
            ..Default::default()
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit one command for `session`, recording it when accepted.
    pub fn check(&self, session: &str) -> bool {
        if !self.enabled {
            return true;
        }
        let now = Instant::now();
        let mut sessions = self.lock();
        let stamps = sessions.entry(session.to_string()).or_default();
        prune(stamps, now, self.window);

        if stamps.len() >= self.max_commands {
            debug!(target: "glass.core", session, in_window = stamps.len(), "rate limit exceeded");
            return false;
        }
        stamps.push_back(now);
        true
    }

    /// Time until the oldest accepted command leaves the window.
    pub fn remaining(&self, session: &str) -> Duration {
        if !self.enabled {
            return Duration::ZERO;
        }
        let now = Instant::now();
        let mut sessions = self.lock();
        let Some(stamps) = sessions.get_mut(session) else {
            return Duration::ZERO;
        };
        prune(stamps, now, self.window);

        match stamps.front() {
            Some(oldest) => self.window.saturating_sub(now.duration_since(*oldest)),
            None => Duration::ZERO,
        }
    }
}

fn prune(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(front) = stamps.front() {
        if now.duration_since(*front) < window {
            break;
        }
        stamps.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn limiter(max: usize, window_secs: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            enabled: true,
            max_commands: max,
            time_window: window_secs,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fourth_call_in_window_is_rejected() {
        let rl = limiter(3, 60);

        assert!(rl.check("s1"));
        advance(Duration::from_secs(3)).await;
        assert!(rl.check("s1"));
        advance(Duration::from_secs(3)).await;
        assert!(rl.check("s1"));
        advance(Duration::from_secs(3)).await;
        assert!(!rl.check("s1"));

        advance(Duration::from_secs(61)).await;
        assert!(rl.check("s1"));
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_are_independent() {
        let rl = limiter(1, 60);
        assert!(rl.check("a"));
        assert!(!rl.check("a"));
        assert!(rl.check("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_one_entry_at_a_time() {
        let rl = limiter(2, 10);
        assert!(rl.check("s"));
        advance(Duration::from_secs(6)).await;
        assert!(rl.check("s"));
        assert!(!rl.check("s"));

        // first stamp is now exactly 10s old and falls out of the window
        advance(Duration::from_secs(4)).await;
        assert!(rl.check("s"));
        assert!(!rl.check("s"));
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_counts_from_oldest_stamp() {
        let rl = limiter(2, 60);
        assert!(rl.check("s"));
        advance(Duration::from_secs(20)).await;
        assert!(rl.check("s"));
        assert!(!rl.check("s"));

        assert_eq!(rl.remaining("s"), Duration::from_secs(40));
        advance(Duration::from_secs(45)).await;
        // oldest expired, the second one has 15s left
        assert_eq!(rl.remaining("s"), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_is_zero_for_unknown_or_expired() {
        let rl = limiter(1, 5);
        assert_eq!(rl.remaining("ghost"), Duration::ZERO);

        assert!(rl.check("s"));
        advance(Duration::from_secs(6)).await;
        assert_eq!(rl.remaining("s"), Duration::ZERO);
    }

    #[test]
    fn disabled_accepts_everything() {
        let rl = RateLimiter::disabled();
        assert!(!rl.is_enabled());
        for _ in 0..100 {
            assert!(rl.check("s"));
        }
        assert_eq!(rl.remaining("s"), Duration::ZERO);
    }
}
