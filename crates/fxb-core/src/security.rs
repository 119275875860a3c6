use std::{
    collections::{HashMap, VecDeque},
    time::{Duration, Instant},
};

use crate::domain::{ChatId, UserId};

// ============== Access List ==============

/// Chat/user allow-lists. Empty lists on both sides mean "everyone".
#[derive(Clone, Debug, Default)]
pub struct AccessList {
    pub allowed_chats: Vec<i64>,
    pub allowed_users: Vec<i64>,
}

impl AccessList {
    /// An allowed chat admits every member; otherwise the user must be listed.
    pub fn is_allowed(&self, chat_id: ChatId, user_id: Option<UserId>) -> bool {
        if self.allowed_chats.is_empty() && self.allowed_users.is_empty() {
            return true;
        }
        if self.allowed_chats.contains(&chat_id.0) {
            return true;
        }
        user_id.is_some_and(|u| self.allowed_users.contains(&u.0))
    }
}

// ============== Rate Limiter (Sliding Window) ==============

#[derive(Clone, Debug)]
pub struct RateLimiter {
    enabled: bool,
    limit: usize,
    window: Duration,
    requests: HashMap<UserId, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(enabled: bool, limit: u32, window: Duration) -> Self {
        Self {
            enabled,
            limit: limit as usize,
            window,
            requests: HashMap::new(),
        }
    }

    pub fn allow(&mut self, user_id: UserId) -> bool {
        self.allow_at(user_id, Instant::now())
    }

    /// Admit and record a request at `now` if the user is below the limit.
    pub fn allow_at(&mut self, user_id: UserId, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }

        let window = self.window;
        let times = self.requests.entry(user_id).or_default();
        prune(times, now, window);

        if times.len() >= self.limit {
            return false;
        }
        times.push_back(now);
        true
    }

    pub fn remaining_cooldown_secs(&mut self, user_id: UserId) -> u64 {
        self.remaining_cooldown_secs_at(user_id, Instant::now())
    }

    /// Whole seconds until the oldest request leaves the window, 0 when under the limit.
    pub fn remaining_cooldown_secs_at(&mut self, user_id: UserId, now: Instant) -> u64 {
        if !self.enabled {
            return 0;
        }
        let window = self.window;
        let Some(times) = self.requests.get_mut(&user_id) else {
            return 0;
        };
        prune(times, now, window);

        if times.len() < self.limit {
            return 0;
        }
        let Some(oldest) = times.front() else {
            return 0;
        };
        let elapsed = now.saturating_duration_since(*oldest);
        let remaining = window.saturating_sub(elapsed);
        // Round up: never report 0 s while still blocked.
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }

    /// Number of identities with recorded state.
    pub fn tracked_identities(&self) -> usize {
        self.requests.len()
    }
}

fn prune(times: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(front) = times.front() {
        if now.saturating_duration_since(*front) < window {
            break;
        }
        times.pop_front();
    }
}
