use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time source. Readings are offsets from an arbitrary epoch.
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Clock that only moves when told to. Used for tests and headless spins.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Turns successive clock readings into per-frame deltas.
#[derive(Debug)]
pub struct FrameClock<C: Clock> {
    clock: C,
    last: Option<Duration>,
}

impl<C: Clock> FrameClock<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, last: None }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The first call only records the timestamp and reports no elapsed time.
    pub fn delta(&mut self) -> Duration {
        let now = self.clock.now();
        let delta = match self.last {
            Some(last) => now.saturating_sub(last),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        delta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTicket {
    generation: u64,
}

/// One cancellable periodic activity. Every start or cancel moves to a new
/// generation, so tickets handed out earlier stop being accepted.
#[derive(Debug, Clone, Default)]
pub struct LoopSlot {
    generation: u64,
    active: bool,
}

impl LoopSlot {
    pub fn start(&mut self) -> LoopTicket {
        self.generation += 1;
        self.active = true;
        LoopTicket {
            generation: self.generation,
        }
    }

    pub fn cancel(&mut self) {
        self.generation += 1;
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn ticket(&self) -> Option<LoopTicket> {
        self.active.then_some(LoopTicket {
            generation: self.generation,
        })
    }

    pub fn accepts(&self, ticket: LoopTicket) -> bool {
        self.active && ticket.generation == self.generation
    }
}

/// Fixed-period repeating tick on top of a [`LoopSlot`].
#[derive(Debug, Clone)]
pub struct Interval {
    slot: LoopSlot,
    period: Duration,
    carried: Duration,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self {
            slot: LoopSlot::default(),
            period,
            carried: Duration::ZERO,
        }
    }

    pub fn start(&mut self) -> LoopTicket {
        self.carried = Duration::ZERO;
        self.slot.start()
    }

    /// Drops any partially elapsed period.
    pub fn cancel(&mut self) {
        self.carried = Duration::ZERO;
        self.slot.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_active()
    }

    pub fn ticket(&self) -> Option<LoopTicket> {
        self.slot.ticket()
    }

    pub fn accepts(&self, ticket: LoopTicket) -> bool {
        self.slot.accepts(ticket)
    }

    /// Number of whole periods that elapsed in `delta`.
    pub fn advance(&mut self, delta: Duration) -> u32 {
        if !self.slot.is_active() || self.period.is_zero() {
            return 0;
        }

        let mut total = self.carried + delta;
        let mut fires = 0;
        while total >= self.period {
            total -= self.period;
            fires += 1;
        }
        self.carried = total;
        fires
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{FrameClock, Interval, LoopSlot, ManualClock};

    #[test]
    fn stale_tickets_are_rejected_after_restart() {
        let mut slot = LoopSlot::default();
        let first = slot.start();
        assert!(slot.accepts(first));

        let second = slot.start();
        assert!(!slot.accepts(first));
        assert!(slot.accepts(second));

        slot.cancel();
        slot.cancel();
        assert!(!slot.accepts(second));
        assert!(slot.ticket().is_none());
    }

    #[test]
    fn interval_counts_whole_periods_and_carries_remainder() {
        let mut interval = Interval::new(Duration::from_secs(1));
        assert_eq!(interval.advance(Duration::from_secs(5)), 0);

        interval.start();
        assert_eq!(interval.advance(Duration::from_millis(600)), 0);
        assert_eq!(interval.advance(Duration::from_millis(600)), 1);
        assert_eq!(interval.advance(Duration::from_millis(2800)), 3);
    }

    #[test]
    fn cancelling_discards_partial_period() {
        let mut interval = Interval::new(Duration::from_secs(1));
        interval.start();
        assert_eq!(interval.advance(Duration::from_millis(900)), 0);
        interval.cancel();
        interval.start();
        assert_eq!(interval.advance(Duration::from_millis(900)), 0);
        assert_eq!(interval.advance(Duration::from_millis(100)), 1);
    }

    #[test]
    fn frame_clock_reports_deltas_between_readings() {
        let mut frames = FrameClock::new(ManualClock::new());
        assert_eq!(frames.delta(), Duration::ZERO);
        frames.clock().advance(Duration::from_millis(16));
        assert_eq!(frames.delta(), Duration::from_millis(16));
        assert_eq!(frames.delta(), Duration::ZERO);
    }
}
