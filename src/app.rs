use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::domain::{Task, TaskList};
use crate::focus::{FocusEvent, FocusSession};
use crate::timer::Preset;
use crate::wheel::{WheelAnimator, WheelEvent};

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub idle_revolution: Duration,
    pub default_preset: Preset,
    pub seed: Option<u64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            idle_revolution: crate::wheel::DEFAULT_IDLE_REVOLUTION,
            default_preset: Preset::Pomodoro,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    SpinLanded { task_id: String, index: usize },
    SpinAborted,
    TimerCompleted { preset: Preset },
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub spins_completed: u32,
    pub total_tracked: u64,
    pub tasks: Vec<Task>,
}

/// Host state: owns the tasks and wires the wheel and the focus modal to them.
pub struct SpinApp {
    tasks: TaskList,
    wheel: WheelAnimator,
    focus: Option<FocusSession>,
    rng: StdRng,
    default_preset: Preset,
    spins_completed: u32,
    started_at: DateTime<Utc>,
    pub status: String,
}

impl SpinApp {
    pub fn new(settings: AppSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut app = Self {
            tasks: TaskList::new(),
            wheel: WheelAnimator::new(settings.idle_revolution),
            focus: None,
            rng,
            default_preset: settings.default_preset,
            spins_completed: 0,
            started_at: Utc::now(),
            status: "Add a task with 'a', then press 's' to spin".to_string(),
        };
        app.sync_wheel();
        app
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn wheel(&self) -> &WheelAnimator {
        &self.wheel
    }

    pub fn focus(&self) -> Option<&FocusSession> {
        self.focus.as_ref().filter(|focus| focus.is_open())
    }

    pub fn add_task(&mut self, text: &str) -> Result<String, String> {
        let id = self.tasks.add(text)?;
        info!("event=task_add task_id={id}");
        self.sync_wheel();
        Ok(id)
    }

    pub fn remove_task(&mut self, id: &str) -> bool {
        if !self.tasks.remove(id) {
            return false;
        }
        info!("event=task_remove task_id={id}");
        self.close_focus_for(id);
        self.sync_wheel();
        true
    }

    pub fn toggle_completed(&mut self, id: &str) -> Option<bool> {
        let completed = self.tasks.toggle_completed(id)?;
        info!("event=task_complete task_id={id} completed={completed}");
        if completed {
            self.close_focus_for(id);
        }
        self.sync_wheel();
        Some(completed)
    }

    pub fn spin(&mut self) -> bool {
        let active = self.tasks.active();
        let started = self.wheel.spin(&active, &mut self.rng);
        if started {
            self.status = "Spinning...".to_string();
        } else if active.is_empty() {
            self.status = "Nothing to spin: add a task first".to_string();
        }
        started
    }

    pub fn toggle_timer(&mut self) -> bool {
        self.focus.as_mut().is_some_and(FocusSession::toggle)
    }

    pub fn select_preset(&mut self, preset: Preset) {
        if let Some(focus) = self.focus.as_mut() {
            focus.select_preset(preset);
        }
    }

    pub fn reset_timer(&mut self) -> bool {
        self.focus.as_mut().is_some_and(FocusSession::reset)
    }

    pub fn close_focus(&mut self) {
        if let Some(mut focus) = self.focus.take() {
            focus.close();
            self.status = format!("Closed focus on: {}", focus.task().text);
        }
    }

    /// Stops the timer, closes the modal and spins again.
    pub fn respin(&mut self) -> bool {
        info!("event=respin");
        self.close_focus();
        self.spin()
    }

    /// Advances the wheel by one frame and the focus timer by `delta`.
    pub fn advance(&mut self, delta: Duration) -> Vec<AppEvent> {
        let mut events = Vec::new();

        let frame = {
            let active = self.tasks.active();
            self.wheel.tick(delta, &active)
        };
        match frame.event {
            Some(WheelEvent::Landed(outcome)) => {
                debug!(
                    "event=focus_target task_id={} angle={:.4}",
                    outcome.task.id, frame.angle
                );
                self.spins_completed += 1;
                self.close_focus();
                self.status = format!("Focus on: {}", outcome.task.text);
                self.focus = Some(FocusSession::open(&outcome.task, self.default_preset));
                events.push(AppEvent::SpinLanded {
                    task_id: outcome.task.id,
                    index: outcome.index,
                });
            }
            Some(WheelEvent::Aborted) => {
                self.status = "Spin cancelled: the task list changed".to_string();
                events.push(AppEvent::SpinAborted);
            }
            None => {}
        }

        if let Some(focus) = self.focus.as_mut() {
            for event in focus.advance(delta) {
                match event {
                    FocusEvent::TimeTracked { task_id, seconds } => {
                        if !self.tasks.add_time(&task_id, seconds) {
                            warn!("event=time_tracked status=dropped task_id={task_id}");
                        }
                    }
                    FocusEvent::Completed { preset } => {
                        self.status = format!("{} finished", preset.label());
                        events.push(AppEvent::TimerCompleted { preset });
                    }
                }
            }
        }

        events
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            started_at: self.started_at,
            spins_completed: self.spins_completed,
            total_tracked: self.tasks.total_tracked(),
            tasks: self.tasks.all().to_vec(),
        }
    }

    fn close_focus_for(&mut self, id: &str) {
        if self.focus.as_ref().is_some_and(|focus| focus.task().id == id) {
            self.close_focus();
        }
    }

    fn sync_wheel(&mut self) {
        let count = self.tasks.active().len();
        self.wheel.sync(count);
    }
}
