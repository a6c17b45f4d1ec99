//! CooldownTracker - Duplicate Suppression
//!
//! ## Responsibilities
//!
//! - Remember when each plate last triggered the barrier
//! - Suppress re-evaluation of that plate inside the cooldown window
//!
//! Per-plate and non-blocking: while one plate cools down, other plates in
//! the same or later frames keep being processed. State is memory-only; a
//! restart forgets cooldowns, which at worst re-toggles one pass.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// CooldownTracker instance
pub struct CooldownTracker {
    window: Duration,
    last_trigger: HashMap<String, Instant>,
}

impl CooldownTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_trigger: HashMap::new(),
        }
    }

    /// True while `plate` is inside its cooldown window
    pub fn should_suppress(&self, plate: &str, now: Instant) -> bool {
        self.last_trigger
            .get(plate)
            .is_some_and(|&t| now.duration_since(t) < self.window)
    }

    /// Start (or restart) the window for `plate`, pruning expired entries
    pub fn record_trigger(&mut self, plate: &str, now: Instant) {
        let window = self.window;
        self.last_trigger
            .retain(|_, &mut t| now.duration_since(t) < window);
        self.last_trigger.insert(plate.to_string(), now);
    }
}
