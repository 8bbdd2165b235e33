use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Pomodoro, Preset::ShortBreak, Preset::LongBreak];

    pub fn duration_secs(self) -> u32 {
        match self {
            Preset::Pomodoro => 25 * 60,
            Preset::ShortBreak => 5 * 60,
            Preset::LongBreak => 15 * 60,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Preset::Pomodoro => "Pomodoro",
            Preset::ShortBreak => "Short Break",
            Preset::LongBreak => "Long Break",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            Preset::Pomodoro => "Pomodoro Timer:",
            Preset::ShortBreak => "Short Break:",
            Preset::LongBreak => "Long Break:",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Not running, nothing happened.
    Idle,
    /// One second consumed, still running.
    Counted,
    /// One second consumed and the countdown hit zero.
    Completed,
    /// Was already at zero. Stopped without consuming anything.
    Stalled,
}

impl TimerTick {
    pub fn consumed_second(self) -> bool {
        matches!(self, TimerTick::Counted | TimerTick::Completed)
    }
}

/// Countdown with three presets and a run/pause flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTimer {
    preset: Preset,
    remaining: u32,
    running: bool,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::new(Preset::Pomodoro)
    }
}

impl FocusTimer {
    pub fn new(preset: Preset) -> Self {
        Self {
            preset,
            remaining: preset.duration_secs(),
            running: false,
        }
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Running with time left. A start at zero only lasts until the next tick.
    pub fn is_counting(&self) -> bool {
        self.running && self.remaining > 0
    }

    pub fn select_preset(&mut self, preset: Preset) {
        self.preset = preset;
        self.running = false;
        self.remaining = preset.duration_secs();
    }

    /// Returns the new running state.
    pub fn toggle(&mut self) -> bool {
        self.running = !self.running;
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn can_reset(&self) -> bool {
        self.running || self.remaining != self.preset.duration_secs()
    }

    pub fn reset(&mut self) -> bool {
        if !self.can_reset() {
            return false;
        }
        self.running = false;
        self.remaining = self.preset.duration_secs();
        true
    }

    pub fn tick(&mut self) -> TimerTick {
        if !self.running {
            return TimerTick::Idle;
        }

        if self.remaining == 0 {
            self.running = false;
            return TimerTick::Stalled;
        }

        self.remaining -= 1;
        if self.remaining == 0 {
            self.running = false;
            TimerTick::Completed
        } else {
            TimerTick::Counted
        }
    }
}
