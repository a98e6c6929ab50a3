//! Hidden admin access gesture.
//!
//! Five taps in the bottom-left corner, each within the inactivity window of
//! the previous one, reveal the admin control for a few seconds. Taps elsewhere
//! never count. Any tap that does not itself reveal the control hides it.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateConfig {
    /// Side of the square hot corner, in CSS pixels
    pub corner_size: f64,
    /// Maximum gap between consecutive counted taps
    pub window: Duration,
    /// How long the admin control stays visible
    pub reveal_for: Duration,
    pub required_taps: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            corner_size: 100.0,
            window: Duration::from_secs(3),
            reveal_for: Duration::from_secs(5),
            required_taps: 5,
        }
    }
}

/// Pointer position in viewport coordinates (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapPoint {
    pub x: f64,
    pub y: f64,
    pub viewport_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Outside the hot corner
    Ignored,
    /// Counted; carries the running count
    Counted(u32),
    /// Threshold reached; the control is visible until the deadline
    Revealed { until: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Idle,
    Counting { taps: u32, deadline: Instant },
}

#[derive(Debug, Clone)]
pub struct TapGate {
    config: GateConfig,
    state: GateState,
    revealed_until: Option<Instant>,
}

impl TapGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            state: GateState::Idle,
            revealed_until: None,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn in_corner(&self, point: &TapPoint) -> bool {
        point.x < self.config.corner_size
            && point.y > point.viewport_height - self.config.corner_size
    }

    pub fn tap(&mut self, point: TapPoint, now: Instant) -> TapOutcome {
        self.revealed_until = None;

        if !self.in_corner(&point) {
            return TapOutcome::Ignored;
        }

        let taps = match self.state {
            GateState::Counting { taps, deadline } if now <= deadline => taps + 1,
            _ => 1,
        };

        if taps >= self.config.required_taps {
            let until = now + self.config.reveal_for;
            self.state = GateState::Idle;
            self.revealed_until = Some(until);
            return TapOutcome::Revealed { until };
        }

        self.state = GateState::Counting {
            taps,
            deadline: now + self.config.window,
        };
        TapOutcome::Counted(taps)
    }

    pub fn is_revealed(&self, now: Instant) -> bool {
        self.revealed_until.is_some_and(|until| now < until)
    }

    /// When the visible control must be hidden, if it is visible.
    pub fn hide_deadline(&self) -> Option<Instant> {
        self.revealed_until
    }

    /// Drop an expired reveal. Returns `true` if the control was hidden.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.revealed_until {
            Some(until) if now >= until => {
                self.revealed_until = None;
                true
            }
            _ => false,
        }
    }
}
