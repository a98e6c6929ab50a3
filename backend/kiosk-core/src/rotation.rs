//! Post rotation state machine.
//!
//! [`RotationEngine`] decides which post the kiosk shows. It owns no timers:
//! every operation returns the [`TimerCommand`]s the caller must execute, and
//! timer expirations come back in as [`RotationEvent`]s. This keeps the engine
//! testable without a clock.
//!
//! # Timers
//!
//! - **countdown**: fires every second, cosmetic only
//! - **rotation**: fires every interval, hides the current post
//! - **fade**: one-shot, fires after the fade-out and advances the index
//!
//! Rotation happens in two phases so displays can fade without popping the
//! next post in early: `RotateDue` hides, `FadeElapsed` advances and shows.
//!
//! # Invariants
//!
//! - `index < post_count` whenever `post_count > 0`, otherwise `index == 0`
//! - timers run only while unpaused with more than one post
//! - `remaining_seconds` stays in `1..=interval_seconds`

use serde::Serialize;
use std::time::Duration;

/// Fade-out delay between hiding a post and showing the next one
pub const FADE_DURATION: Duration = Duration::from_millis(1000);

/// Period of the countdown ticker
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Shortest rotation interval the engine accepts
const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationEvent {
    /// Countdown ticker fired
    Tick,
    /// Rotation ticker fired
    RotateDue,
    /// Fade-out delay finished
    FadeElapsed,
    Pause,
    Resume,
    Reconfigure(Duration),
    /// The displayed post list now has this many entries
    PostsChanged(usize),
}

/// Instruction for whoever owns the actual timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Start the countdown ticker at [`COUNTDOWN_TICK`]
    StartCountdown,
    StopCountdown,
    /// Start the rotation ticker: first fire after `first`, then every `period`
    StartRotation { first: Duration, period: Duration },
    StopRotation,
    /// Arm the one-shot fade timer
    StartFade(Duration),
    CancelFade,
}

/// Externally visible engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RotationState {
    pub index: usize,
    pub visible: bool,
    pub remaining_seconds: u64,
    pub paused: bool,
    pub interval_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RotationEngine {
    index: usize,
    visible: bool,
    remaining_seconds: u64,
    paused: bool,
    interval: Duration,
    fade: Duration,
    post_count: usize,
    /// Countdown and rotation tickers are armed
    rotating: bool,
    /// Fade timer is armed
    fading: bool,
}

impl RotationEngine {
    pub fn new(interval: Duration) -> Self {
        let interval = normalize(interval);
        Self {
            index: 0,
            visible: true,
            remaining_seconds: interval.as_secs(),
            paused: false,
            interval,
            fade: FADE_DURATION,
            post_count: 0,
            rotating: false,
            fading: false,
        }
    }

    pub fn with_fade(mut self, fade: Duration) -> Self {
        self.fade = fade;
        self
    }

    /// Begin rotating `post_count` posts every `interval`.
    ///
    /// Does not arm any timer while paused or with fewer than two posts.
    pub fn start(&mut self, post_count: usize, interval: Duration) -> Vec<TimerCommand> {
        let mut commands = self.halt();
        self.post_count = post_count;
        self.interval = normalize(interval);
        self.remaining_seconds = self.interval_seconds();
        self.clamp_index();
        commands.extend(self.launch(self.interval));
        commands
    }

    pub fn handle(&mut self, event: RotationEvent) -> Vec<TimerCommand> {
        match event {
            RotationEvent::Tick => {
                self.tick();
                vec![]
            }
            RotationEvent::RotateDue => self.rotate(),
            RotationEvent::FadeElapsed => {
                self.finish_fade();
                vec![]
            }
            RotationEvent::Pause => self.set_paused(true),
            RotationEvent::Resume => self.set_paused(false),
            RotationEvent::Reconfigure(interval) => self.reconfigure(interval),
            RotationEvent::PostsChanged(count) => self.posts_changed(count),
        }
    }

    /// Countdown step. Wraps back to the full interval instead of reaching zero.
    pub fn tick(&mut self) {
        if !self.rotating {
            return;
        }
        if self.remaining_seconds <= 1 {
            self.remaining_seconds = self.interval_seconds();
        } else {
            self.remaining_seconds -= 1;
        }
    }

    /// First phase of a rotation: hide the current post and arm the fade.
    pub fn rotate(&mut self) -> Vec<TimerCommand> {
        if !self.rotating || self.fading {
            return vec![];
        }
        self.visible = false;
        self.fading = true;
        vec![TimerCommand::StartFade(self.fade)]
    }

    /// Second phase of a rotation: advance and show.
    pub fn finish_fade(&mut self) {
        if !self.fading {
            return;
        }
        self.fading = false;
        if self.post_count > 0 {
            self.index = (self.index + 1) % self.post_count;
        }
        self.visible = true;
        self.remaining_seconds = self.interval_seconds();
    }

    /// Pausing stops both tickers. A fade already in flight still completes
    /// so the display never stays blank.
    pub fn set_paused(&mut self, paused: bool) -> Vec<TimerCommand> {
        self.paused = paused;
        if paused {
            self.halt()
        } else {
            let first = Duration::from_secs(self.remaining_seconds.max(1));
            self.launch(first)
        }
    }

    /// Change the rotation period. The countdown restarts from the new
    /// interval and the rotation ticker is re-armed once.
    pub fn reconfigure(&mut self, interval: Duration) -> Vec<TimerCommand> {
        let interval = normalize(interval);
        if interval == self.interval {
            return vec![];
        }
        self.interval = interval;
        self.remaining_seconds = self.interval_seconds();

        if !self.rotating {
            return vec![];
        }
        vec![
            TimerCommand::StopRotation,
            TimerCommand::StartRotation {
                first: interval,
                period: interval,
            },
        ]
    }

    /// React to the post list growing or shrinking.
    pub fn posts_changed(&mut self, post_count: usize) -> Vec<TimerCommand> {
        self.post_count = post_count;

        if post_count <= 1 {
            self.index = 0;
            let mut commands = self.halt();
            if self.fading {
                self.fading = false;
                commands.push(TimerCommand::CancelFade);
            }
            self.visible = true;
            self.remaining_seconds = self.interval_seconds();
            return commands;
        }

        self.clamp_index();
        self.launch(self.interval)
    }

    /// Index into the current post list, `None` when the list is empty.
    pub fn current_index(&self) -> Option<usize> {
        (self.post_count > 0).then_some(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn post_count(&self) -> usize {
        self.post_count
    }

    pub fn state(&self) -> RotationState {
        RotationState {
            index: self.index,
            visible: self.visible,
            remaining_seconds: self.remaining_seconds,
            paused: self.paused,
            interval_ms: self.interval.as_millis() as u64,
        }
    }

    fn interval_seconds(&self) -> u64 {
        self.interval.as_secs()
    }

    fn clamp_index(&mut self) {
        if self.index >= self.post_count {
            self.index = 0;
        }
    }

    fn launch(&mut self, first: Duration) -> Vec<TimerCommand> {
        if self.rotating || self.paused || self.post_count <= 1 {
            return vec![];
        }
        self.rotating = true;
        vec![
            TimerCommand::StartCountdown,
            TimerCommand::StartRotation {
                first,
                period: self.interval,
            },
        ]
    }

    fn halt(&mut self) -> Vec<TimerCommand> {
        if !self.rotating {
            return vec![];
        }
        self.rotating = false;
        vec![TimerCommand::StopCountdown, TimerCommand::StopRotation]
    }
}

fn normalize(interval: Duration) -> Duration {
    // Whole seconds keep the countdown and the rotation ticker aligned
    Duration::from_secs(interval.max(MIN_INTERVAL).as_secs())
}
