//! Wheel animation and task selection.
//!
//! Angles are in radians, measured clockwise from the 3 o'clock position (screen
//! coordinates, y pointing down). Segment `i` of `n` spans
//! `[rotation + i * w, rotation + (i + 1) * w]` with `w = 2π / n`, and the pointer
//! is fixed at the top of the wheel.
//!
//! The landed index is picked before the animation starts and the animation is
//! built to end on that segment's midpoint. The result is never read back from
//! the rendered angle.

use std::f64::consts::{PI, TAU};
use std::mem;
use std::time::Duration;

use log::{debug, info, warn};
use rand::Rng;

use crate::domain::Task;
use crate::schedule::{LoopSlot, LoopTicket};

/// Angle of the fixed pointer (top of the wheel).
pub const POINTER_ANGLE: f64 = 1.5 * PI;
pub const DEFAULT_IDLE_REVOLUTION: Duration = Duration::from_secs(30);

const MIN_SPIN_MS: u64 = 3000;
const MAX_SPIN_MS: u64 = 5000;
const MIN_REVOLUTIONS: u32 = 2;
const MAX_REVOLUTIONS: u32 = 5;
/// Forward offsets this close to a full turn are rounding noise from the last landing.
const ANGLE_EPSILON: f64 = 1e-9;

pub fn ease_out_cubic(progress: f64) -> f64 {
    let progress = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - progress).powi(3)
}

pub fn segment_width(count: usize) -> f64 {
    TAU / count as f64
}

/// Index of the segment under the pointer for a given wheel rotation.
pub fn segment_at_pointer(rotation: f64, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let relative = (POINTER_ANGLE - rotation).rem_euclid(TAU);
    let index = (relative / segment_width(count)).floor() as usize;
    Some(index.min(count - 1))
}

/// Normalized rotation that puts the pointer on the midpoint of `index`.
pub fn landing_angle(index: usize, count: usize) -> f64 {
    let width = segment_width(count);
    (POINTER_ANGLE - (index as f64 + 0.5) * width).rem_euclid(TAU)
}

#[derive(Debug, Clone)]
pub struct SpinPlan {
    pub target_index: usize,
    pub target_task_id: String,
    pub task_count: usize,
    pub revolutions: u32,
    pub duration: Duration,
    pub start_angle: f64,
    pub final_angle: f64,
    elapsed: Duration,
}

impl SpinPlan {
    pub fn new(
        start_angle: f64,
        target_index: usize,
        target: &Task,
        task_count: usize,
        duration: Duration,
        revolutions: u32,
    ) -> Self {
        let landing = landing_angle(target_index, task_count);
        let mut forward = (landing - start_angle).rem_euclid(TAU);
        if TAU - forward < ANGLE_EPSILON {
            forward = 0.0;
        }
        let final_angle = start_angle + f64::from(revolutions) * TAU + forward;

        Self {
            target_index,
            target_task_id: target.id.clone(),
            task_count,
            revolutions,
            duration,
            start_angle,
            final_angle,
            elapsed: Duration::ZERO,
        }
    }

    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Unnormalized angle at `progress`. Never passes `final_angle`.
    pub fn angle_at(&self, progress: f64) -> f64 {
        self.start_angle + (self.final_angle - self.start_angle) * ease_out_cubic(progress)
    }
}

#[derive(Debug, Clone)]
pub enum WheelPhase {
    Idle,
    Spinning(SpinPlan),
}

#[derive(Debug, Clone)]
pub struct SpinOutcome {
    pub index: usize,
    pub task: Task,
}

#[derive(Debug, Clone)]
pub enum WheelEvent {
    Landed(SpinOutcome),
    /// The task list changed under the spin, nothing was selected.
    Aborted,
}

#[derive(Debug, Clone)]
pub struct WheelFrame {
    pub angle: f64,
    pub event: Option<WheelEvent>,
}

#[derive(Debug, Clone)]
pub struct WheelAnimator {
    rotation: f64,
    phase: WheelPhase,
    last_selected_index: Option<usize>,
    frames: LoopSlot,
    idle_velocity: f64,
}

impl Default for WheelAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_REVOLUTION)
    }
}

impl WheelAnimator {
    pub fn new(idle_revolution: Duration) -> Self {
        let seconds = idle_revolution.as_secs_f64();
        Self {
            rotation: 0.0,
            phase: WheelPhase::Idle,
            last_selected_index: None,
            frames: LoopSlot::default(),
            idle_velocity: if seconds > 0.0 { TAU / seconds } else { 0.0 },
        }
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.phase, WheelPhase::Spinning(_))
    }

    pub fn spin_plan(&self) -> Option<&SpinPlan> {
        match &self.phase {
            WheelPhase::Spinning(plan) => Some(plan),
            WheelPhase::Idle => None,
        }
    }

    pub fn last_selected_index(&self) -> Option<usize> {
        self.last_selected_index
    }

    pub fn is_idle_loop_running(&self) -> bool {
        !self.is_spinning() && self.frames.is_active()
    }

    /// Starts or stops the decorative idle loop to match the task count.
    pub fn sync(&mut self, task_count: usize) {
        if self.is_spinning() {
            return;
        }

        if task_count == 0 {
            if !self.frames.is_active() {
                self.frames.start();
                debug!("event=idle_loop status=started");
            }
        } else if self.frames.is_active() {
            self.frames.cancel();
            debug!("event=idle_loop status=stopped task_count={task_count}");
        }
    }

    /// Returns false when ignored (already spinning or nothing to pick from).
    pub fn spin<R: Rng + ?Sized>(&mut self, tasks: &[&Task], rng: &mut R) -> bool {
        if self.is_spinning() {
            debug!("event=spin status=ignored reason=already_spinning");
            return false;
        }
        if tasks.is_empty() {
            debug!("event=spin status=ignored reason=no_tasks");
            return false;
        }

        let task_count = tasks.len();
        let target_index = rng.gen_range(0..task_count);
        let duration = Duration::from_millis(rng.gen_range(MIN_SPIN_MS..MAX_SPIN_MS));
        let revolutions = rng.gen_range(MIN_REVOLUTIONS..MAX_REVOLUTIONS);
        let plan = SpinPlan::new(
            self.rotation,
            target_index,
            tasks[target_index],
            task_count,
            duration,
            revolutions,
        );

        info!(
            "event=spin status=started task_count={} target_index={} duration_ms={} revolutions={}",
            task_count,
            target_index,
            duration.as_millis(),
            revolutions
        );

        // Replaces the idle loop, if any.
        self.frames.start();
        self.phase = WheelPhase::Spinning(plan);
        true
    }

    pub fn request_frame(&self) -> Option<LoopTicket> {
        self.frames.ticket()
    }

    /// Requests and delivers a frame in one step.
    pub fn tick(&mut self, delta: Duration, tasks: &[&Task]) -> WheelFrame {
        match self.request_frame() {
            Some(ticket) => self.on_frame(ticket, delta, tasks),
            None => self.frame(None),
        }
    }

    pub fn on_frame(&mut self, ticket: LoopTicket, delta: Duration, tasks: &[&Task]) -> WheelFrame {
        if !self.frames.accepts(ticket) {
            debug!("event=frame status=stale");
            return self.frame(None);
        }

        let done = match &mut self.phase {
            WheelPhase::Idle => {
                if tasks.is_empty() {
                    self.rotation =
                        (self.rotation + self.idle_velocity * delta.as_secs_f64()).rem_euclid(TAU);
                } else {
                    self.frames.cancel();
                }
                false
            }
            WheelPhase::Spinning(plan) => {
                plan.elapsed = plan.elapsed.saturating_add(delta);
                let progress = plan.progress();
                self.rotation = plan.angle_at(progress).rem_euclid(TAU);
                progress >= 1.0
            }
        };

        if !done {
            return self.frame(None);
        }

        match mem::replace(&mut self.phase, WheelPhase::Idle) {
            WheelPhase::Spinning(plan) => {
                let event = self.land(plan, tasks);
                self.frame(Some(event))
            }
            WheelPhase::Idle => self.frame(None),
        }
    }

    fn land(&mut self, plan: SpinPlan, tasks: &[&Task]) -> WheelEvent {
        self.frames.cancel();
        self.rotation = landing_angle(plan.target_index, plan.task_count);

        let landed = tasks
            .get(plan.target_index)
            .filter(|task| tasks.len() == plan.task_count && task.id == plan.target_task_id);

        let event = match landed {
            Some(task) => {
                self.last_selected_index = Some(plan.target_index);
                info!(
                    "event=spin status=landed index={} task_id={}",
                    plan.target_index, task.id
                );
                WheelEvent::Landed(SpinOutcome {
                    index: plan.target_index,
                    task: (*task).clone(),
                })
            }
            None => {
                warn!(
                    "event=spin status=aborted reason=tasks_changed expected_count={} actual_count={}",
                    plan.task_count,
                    tasks.len()
                );
                WheelEvent::Aborted
            }
        };

        self.sync(tasks.len());
        event
    }

    fn frame(&self, event: Option<WheelEvent>) -> WheelFrame {
        WheelFrame {
            angle: self.rotation,
            event,
        }
    }
}
