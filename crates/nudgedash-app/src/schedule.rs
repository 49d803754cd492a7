// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Decides when refresh cycles start and which finished cycles may still be
/// applied. Owned by whoever hosts the refresh loop; time is passed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshScheduler {
    interval: Duration,
    started: bool,
    // None after start means the interval runs past what `Instant` can hold.
    next_due: Option<Instant>,
    issued: u64,
    last_applied: Option<u64>,
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: false,
            next_due: None,
            issued: 0,
            last_applied: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns a new cycle number when a refresh is due. The first call is
    /// always due.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        if !self.started {
            self.started = true;
            self.next_due = now.checked_add(self.interval);
            return Some(self.issue());
        }
        let due = self.next_due?;
        if now < due {
            return None;
        }
        self.next_due = due
            .checked_add(self.interval)
            .filter(|next| *next > now)
            .or_else(|| now.checked_add(self.interval));
        Some(self.issue())
    }

    /// Starts a cycle immediately and restarts the interval from `now`.
    pub fn trigger(&mut self, now: Instant) -> u64 {
        self.started = true;
        self.next_due = now.checked_add(self.interval);
        self.issue()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// True when a newer cycle has already been applied.
    pub fn is_stale(&self, cycle: u64) -> bool {
        self.last_applied.is_some_and(|last| cycle <= last)
    }

    pub fn mark_applied(&mut self, cycle: u64) {
        if !self.is_stale(cycle) {
            self.last_applied = Some(cycle);
        }
    }

    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }

    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}
