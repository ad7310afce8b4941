use std::time::{Duration, Instant};

pub const DEFAULT_PRESET_SECS: u32 = 60;
pub const ADJUST_STEP_SECS: i64 = 15;

const TICK: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
}

/// What one timer widget shows: the `MM:SS` text and the caption of its
/// start/pause button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerDisplay {
    pub text: String,
    pub button: &'static str,
}

/// Rest timer shared by the timer panel and the mini bar. Every state change
/// rewrites both displays in the same call, so they never disagree.
#[derive(Debug)]
pub struct TimerController {
    remaining: u32,
    last_preset: u32,
    phase: TimerPhase,
    next_tick: Option<Instant>,
    primary: TimerDisplay,
    mini: TimerDisplay,
}

impl Default for TimerController {
    fn default() -> Self {
        Self::new(DEFAULT_PRESET_SECS)
    }
}

impl TimerController {
    pub fn new(preset: u32) -> Self {
        let display = TimerDisplay {
            text: format_time(preset),
            button: "Start",
        };
        Self {
            remaining: preset,
            last_preset: preset,
            phase: TimerPhase::Idle,
            next_tick: None,
            primary: display.clone(),
            mini: display,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn last_preset(&self) -> u32 {
        self.last_preset
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn primary(&self) -> &TimerDisplay {
        &self.primary
    }

    pub fn mini(&self) -> &TimerDisplay {
        &self.mini
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&mut self, now: Instant) {
        if self.is_running() {
            return;
        }
        self.phase = TimerPhase::Running;
        self.next_tick = Some(now + TICK);
        self.refresh_displays();
    }

    pub fn pause(&mut self) {
        self.phase = TimerPhase::Idle;
        self.next_tick = None;
        self.refresh_displays();
    }

    /// The single start/pause control both displays share.
    pub fn toggle(&mut self) {
        self.toggle_at(Instant::now());
    }

    pub fn toggle_at(&mut self, now: Instant) {
        if self.is_running() {
            self.pause();
        } else {
            self.start_at(now);
        }
    }

    pub fn reset(&mut self) {
        self.phase = TimerPhase::Idle;
        self.next_tick = None;
        self.remaining = self.last_preset;
        self.refresh_displays();
    }

    pub fn adjust(&mut self, delta_secs: i64) {
        let adjusted = (i64::from(self.remaining) + delta_secs).clamp(0, i64::from(u32::MAX));
        self.remaining = adjusted as u32;
        self.refresh_displays();
    }

    /// Replaces the remaining time and makes it the value future resets go
    /// back to. Leaves the running state alone.
    pub fn set_preset(&mut self, secs: u32) {
        self.remaining = secs;
        self.last_preset = secs;
        self.refresh_displays();
    }

    /// One second elapsed.
    pub fn tick(&mut self) {
        if !self.is_running() {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.phase = TimerPhase::Idle;
            self.next_tick = None;
            self.remaining = self.last_preset;
            log::info!("Rest timer finished");
        }
        self.refresh_displays();
    }

    /// Applies every whole second that has elapsed up to `now`, one tick at a
    /// time. Returns the number of ticks applied.
    pub fn poll(&mut self, now: Instant) -> u32 {
        let mut ticks = 0;
        while let Some(due) = self.next_tick {
            if due > now {
                break;
            }
            self.next_tick = Some(due + TICK);
            self.tick();
            ticks += 1;
        }
        ticks
    }

    pub fn time_until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.next_tick.map(|due| due.saturating_duration_since(now))
    }

    fn refresh_displays(&mut self) {
        let display = TimerDisplay {
            text: format_time(self.remaining),
            button: if self.is_running() { "Pause" } else { "Start" },
        };
        self.mini = display.clone();
        self.primary = display;
    }
}

pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
