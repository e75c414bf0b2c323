use std::{collections::HashMap, collections::VecDeque, time::Duration};

use serde::{Deserialize, Serialize};

use crate::config::{FeedbackConfig, ThrottleScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Good,
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Audible cue played when an event of this severity is shown.
    pub fn cue(self) -> Option<Cue> {
        match self {
            Severity::Good => Some(Cue::Success),
            Severity::Warning | Severity::Error => Some(Cue::Alert),
            Severity::Info => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Success,
    Alert,
}

/// Feedback produced by analysis before it has passed the throttle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub severity: Severity,
    pub message: String,
}

impl FeedbackRequest {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Feedback accepted for display. `timestamp` is session time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub severity: Severity,
    pub message: String,
    pub timestamp: Duration,
}

impl FeedbackEvent {
    pub fn cue(&self) -> Option<Cue> {
        self.severity.cue()
    }
}

/// Drops feedback that arrives sooner than the minimum interval after the
/// last accepted event.
#[derive(Debug, Clone)]
pub struct FeedbackThrottle {
    min_interval: Duration,
    scope: ThrottleScope,
    last_accepted: Option<Duration>,
    last_by_severity: HashMap<Severity, Duration>,
}

impl FeedbackThrottle {
    pub fn new(config: &FeedbackConfig) -> Self {
        Self {
            min_interval: config.min_interval(),
            scope: config.scope,
            last_accepted: None,
            last_by_severity: HashMap::new(),
        }
    }

    /// Timestamp of the most recently accepted event of any severity.
    pub fn last_accepted_at(&self) -> Option<Duration> {
        self.last_accepted
    }

    pub fn offer(&mut self, request: FeedbackRequest, now: Duration) -> Option<FeedbackEvent> {
        let last = match self.scope {
            ThrottleScope::Shared => self.last_accepted,
            ThrottleScope::PerSeverity => self.last_by_severity.get(&request.severity).copied(),
        };

        if let Some(last) = last {
            if now.saturating_sub(last) <= self.min_interval {
                tracing::trace!(text = %request.message, "feedback throttled");
                return None;
            }
        }

        self.last_accepted = Some(now);
        self.last_by_severity.insert(request.severity, now);
        Some(FeedbackEvent {
            severity: request.severity,
            message: request.message,
            timestamp: now,
        })
    }
}

/// Most-recent-first list of displayed feedback with a fixed capacity.
#[derive(Debug, Clone)]
pub struct FeedbackLog {
    capacity: usize,
    events: VecDeque<FeedbackEvent>,
}

impl FeedbackLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, event: FeedbackEvent) {
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }

    /// Events newest first.
    pub fn iter(&self) -> impl Iterator<Item = &FeedbackEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
