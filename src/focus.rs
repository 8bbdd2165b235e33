use std::time::Duration;

use log::{debug, info};

use crate::domain::Task;
use crate::schedule::Interval;
use crate::timer::{FocusTimer, Preset, TimerTick};

const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusEvent {
    TimeTracked { task_id: String, seconds: u64 },
    Completed { preset: Preset },
}

/// The focus modal: a countdown plus time accrual for one task.
///
/// Countdown and accrual are separate intervals with their own handles. Both
/// run only while the timer is running; accrual additionally needs the modal
/// to be open. Accrual seconds are attributed only for countdown ticks that
/// actually consumed a second.
#[derive(Debug, Clone)]
pub struct FocusSession {
    task: Task,
    timer: FocusTimer,
    countdown: Interval,
    accrual: Interval,
    open: bool,
}

impl FocusSession {
    pub fn open(task: &Task, preset: Preset) -> Self {
        info!(
            "event=focus_open task_id={} preset={}",
            task.id,
            preset.label()
        );
        Self {
            task: task.clone(),
            timer: FocusTimer::new(preset),
            countdown: Interval::new(TICK_PERIOD),
            accrual: Interval::new(TICK_PERIOD),
            open: true,
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn timer(&self) -> &FocusTimer {
        &self.timer
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_tracking(&self) -> bool {
        self.accrual.is_active() && self.timer.is_counting()
    }

    pub fn toggle(&mut self) -> bool {
        if !self.open {
            return false;
        }
        let running = self.timer.toggle();
        debug!(
            "event=focus_toggle task_id={} running={} remaining={}",
            self.task.id,
            running,
            self.timer.remaining_secs()
        );
        self.sync_intervals();
        running
    }

    pub fn select_preset(&mut self, preset: Preset) {
        self.timer.select_preset(preset);
        info!(
            "event=preset_change task_id={} preset={}",
            self.task.id,
            preset.label()
        );
        self.sync_intervals();
    }

    pub fn reset(&mut self) -> bool {
        if !self.timer.reset() {
            return false;
        }
        self.sync_intervals();
        true
    }

    pub fn close(&mut self) {
        if self.open {
            info!(
                "event=focus_close task_id={} remaining={}",
                self.task.id,
                self.timer.remaining_secs()
            );
        }
        self.open = false;
        self.timer.stop();
        self.sync_intervals();
    }

    pub fn advance(&mut self, delta: Duration) -> Vec<FocusEvent> {
        let mut events = Vec::new();
        let countdown_ticket = self.countdown.ticket();
        let accrual_ticket = self.accrual.ticket();
        let countdown_fires = self.countdown.advance(delta);
        let accrual_fires = self.accrual.advance(delta);

        for step in 0..countdown_fires.max(accrual_fires) {
            let tick = match countdown_ticket {
                Some(ticket) if step < countdown_fires && self.countdown.accepts(ticket) => {
                    self.timer.tick()
                }
                _ => TimerTick::Idle,
            };

            if let Some(ticket) = accrual_ticket {
                if step < accrual_fires && tick.consumed_second() && self.accrual.accepts(ticket) {
                    events.push(FocusEvent::TimeTracked {
                        task_id: self.task.id.clone(),
                        seconds: 1,
                    });
                }
            }

            if tick == TimerTick::Completed {
                info!(
                    "event=timer_complete task_id={} preset={}",
                    self.task.id,
                    self.timer.preset().label()
                );
                events.push(FocusEvent::Completed {
                    preset: self.timer.preset(),
                });
            }

            if !self.timer.is_running() {
                self.sync_intervals();
            }
        }

        events
    }

    fn sync_intervals(&mut self) {
        if !self.timer.is_running() || !self.open {
            self.countdown.cancel();
            self.accrual.cancel();
            return;
        }

        if !self.countdown.is_active() {
            self.countdown.start();
        }
        if !self.accrual.is_active() {
            self.accrual.start();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::domain::TaskList;
    use crate::timer::Preset;

    use super::{FocusEvent, FocusSession};

    fn session() -> FocusSession {
        let mut tasks = TaskList::new();
        let id = tasks.add("Write report").expect("task should be created");
        FocusSession::open(tasks.get(&id).expect("task exists"), Preset::Pomodoro)
    }

    fn tracked_seconds(events: &[FocusEvent]) -> u64 {
        events
            .iter()
            .map(|event| match event {
                FocusEvent::TimeTracked { seconds, .. } => *seconds,
                FocusEvent::Completed { .. } => 0,
            })
            .sum()
    }

    fn run_seconds(session: &mut FocusSession, seconds: u64) -> Vec<FocusEvent> {
        let mut events = Vec::new();
        for _ in 0..seconds {
            events.extend(session.advance(Duration::from_secs(1)));
        }
        events
    }

    #[test]
    fn ten_ticks_count_down_and_track_ten_seconds() {
        let mut session = session();
        assert!(session.toggle());
        let events = run_seconds(&mut session, 10);
        assert_eq!(session.timer().remaining_secs(), 1490);
        assert_eq!(tracked_seconds(&events), 10);
        assert!(events.iter().all(|event| matches!(
            event,
            FocusEvent::TimeTracked { task_id, .. } if task_id == &session.task().id
        )));
    }

    #[test]
    fn pause_resume_only_counts_running_seconds() {
        let mut session = session();
        let mut events = Vec::new();

        session.toggle();
        events.extend(run_seconds(&mut session, 2));
        assert!(!session.toggle());
        events.extend(run_seconds(&mut session, 3));
        assert!(session.toggle());
        events.extend(run_seconds(&mut session, 2));

        assert_eq!(tracked_seconds(&events), 4);
        assert_eq!(session.timer().remaining_secs(), 1496);
    }

    #[test]
    fn large_deltas_are_split_into_whole_seconds() {
        let mut session = session();
        session.toggle();
        let events = session.advance(Duration::from_millis(10_500));
        assert_eq!(tracked_seconds(&events), 10);
        let events = session.advance(Duration::from_millis(500));
        assert_eq!(tracked_seconds(&events), 1);
        assert_eq!(session.timer().remaining_secs(), 1489);
    }

    #[test]
    fn partial_second_is_dropped_on_pause() {
        let mut session = session();
        session.toggle();
        assert!(session.advance(Duration::from_millis(900)).is_empty());
        session.toggle();
        session.toggle();
        assert!(session.advance(Duration::from_millis(900)).is_empty());
        assert_eq!(session.timer().remaining_secs(), 1500);
    }

    #[test]
    fn closing_stops_countdown_and_accrual() {
        let mut session = session();
        session.toggle();
        assert_eq!(tracked_seconds(&run_seconds(&mut session, 2)), 2);

        session.close();
        assert!(!session.is_open());
        assert!(!session.is_tracking());
        assert!(!session.timer().is_running());
        assert!(run_seconds(&mut session, 5).is_empty());
        assert_eq!(session.timer().remaining_secs(), 1498);

        assert!(!session.toggle());
        assert!(run_seconds(&mut session, 2).is_empty());
    }

    #[test]
    fn preset_change_while_running_stops_and_resets() {
        let mut session = session();
        session.toggle();
        run_seconds(&mut session, 100);
        assert_eq!(session.timer().remaining_secs(), 1400);

        session.select_preset(Preset::ShortBreak);
        assert!(!session.timer().is_running());
        assert_eq!(session.timer().remaining_secs(), 300);
        assert!(run_seconds(&mut session, 3).is_empty());
    }

    #[test]
    fn countdown_completion_stops_tracking() {
        let mut session = session();
        session.select_preset(Preset::ShortBreak);
        session.toggle();
        let events = run_seconds(&mut session, 305);

        assert_eq!(tracked_seconds(&events), 300);
        assert_eq!(
            events.last(),
            Some(&FocusEvent::Completed {
                preset: Preset::ShortBreak
            })
        );
        assert_eq!(session.timer().remaining_secs(), 0);
        assert!(!session.timer().is_running());
        assert!(session.is_open());
    }

    #[test]
    fn toggling_at_zero_does_not_track_time() {
        let mut session = session();
        session.select_preset(Preset::ShortBreak);
        session.toggle();
        assert!(session.is_tracking());
        session.advance(Duration::from_secs(300));
        assert_eq!(session.timer().remaining_secs(), 0);
        assert!(!session.is_tracking());

        assert!(session.toggle());
        assert!(!session.is_tracking());
        assert!(!session.timer().is_counting());
        let events = run_seconds(&mut session, 3);
        assert!(events.is_empty());
        assert!(!session.timer().is_running());
    }

    #[test]
    fn reset_stops_running_timer() {
        let mut session = session();
        assert!(!session.reset());
        session.toggle();
        run_seconds(&mut session, 5);
        assert!(session.reset());
        assert!(!session.timer().is_running());
        assert_eq!(session.timer().remaining_secs(), 1500);
        assert!(run_seconds(&mut session, 2).is_empty());
    }
}
