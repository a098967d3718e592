use std::time::{Duration, Instant};

/// Emitted ticks before the ticker rebases its start time to bound
/// floating-point drift in the elapsed/expected arithmetic.
const REBASE_TICKS: u64 = 60;

pub const DEFAULT_TICKS_PER_SECOND: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    /// Wall-clock time since the ticker (last re)started.
    pub elapsed: Duration,
    /// The fixed interval between ticks.
    pub tick_delay: Duration,
    /// Monotonic tick number since `start`.
    pub tick_count: u64,
}

/// Fixed-step tick source with catch-up semantics: each `advance` derives
/// how many ticks should have fired since the last check and emits exactly
/// that many, so a stalled frame is followed by a burst rather than lost
/// time — but the ticker never runs ahead of wall time.
#[derive(Debug, Clone)]
pub struct Ticker {
    delay: Duration,
    running: bool,
    start: Instant,
    ticks_emitted: u64,
    total_ticks: u64,
}

impl Ticker {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: if delay.is_zero() {
                Duration::from_nanos(1_000_000_000 / DEFAULT_TICKS_PER_SECOND as u64)
            } else {
                delay
            },
            running: false,
            start: Instant::now(),
            ticks_emitted: 0,
            total_ticks: 0,
        }
    }

    pub fn with_rate(ticks_per_second: u32) -> Self {
        Self::new(Duration::from_nanos(
            1_000_000_000 / ticks_per_second.max(1) as u64,
        ))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self, now: Instant) {
        if !self.running {
            self.running = true;
            self.start = now;
            self.ticks_emitted = 0;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Emit every tick owed since the last call, in order.
    pub fn advance(&mut self, now: Instant) -> Vec<TickEvent> {
        if !self.running {
            return Vec::new();
        }
        let elapsed = now.saturating_duration_since(self.start);
        let expected = if self.delay.is_zero() {
            self.ticks_emitted
        } else {
            (elapsed.as_nanos() / self.delay.as_nanos()) as u64
        };
        let missed = expected.saturating_sub(self.ticks_emitted);

        let mut events = Vec::with_capacity(missed as usize);
        for _ in 0..missed {
            self.total_ticks += 1;
            events.push(TickEvent {
                elapsed,
                tick_delay: self.delay,
                tick_count: self.total_ticks,
            });
        }
        self.ticks_emitted = expected;

        // Rebase periodically so elapsed never grows without bound.
        if self.ticks_emitted >= REBASE_TICKS {
            self.start = now;
            self.ticks_emitted %= REBASE_TICKS;
        }

        events
    }
}

type TickListener<S> = Box<dyn FnMut(&TickEvent, &mut S)>;

struct RosterEntry<S> {
    slot: String,
    listener: TickListener<S>,
}

/// Ordered tick listeners. Every registered slot fires once per emitted
/// tick, in registration order — the per-tick pipeline (input-output,
/// gameboard, animator, player-pulse) is fixed at setup and stays stable
/// for the whole session.
pub struct TickRoster<S> {
    entries: Vec<RosterEntry<S>>,
}

impl<S> Default for TickRoster<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S> TickRoster<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, slot: &str, listener: impl FnMut(&TickEvent, &mut S) + 'static) {
        self.entries.push(RosterEntry {
            slot: slot.to_string(),
            listener: Box::new(listener),
        });
    }

    pub fn emit(&mut self, event: &TickEvent, target: &mut S) {
        for entry in &mut self.entries {
            (entry.listener)(event, target);
        }
    }

    pub fn slots(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.slot.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker_at(now: Instant) -> Ticker {
        let mut ticker = Ticker::with_rate(60);
        ticker.start(now);
        ticker
    }

    #[test]
    fn no_time_elapsed_emits_nothing() {
        let base = Instant::now();
        let mut ticker = ticker_at(base);
        assert!(ticker.advance(base).is_empty());
    }

    #[test]
    fn catch_up_emits_exactly_the_owed_ticks() {
        let base = Instant::now();
        let mut ticker = ticker_at(base);
        let events = ticker.advance(base + Duration::from_millis(50));
        // 50ms / 16.67ms = 3 whole ticks owed.
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].tick_count, 1);
        assert_eq!(events[2].tick_count, 3);
    }

    #[test]
    fn ticks_are_not_emitted_twice() {
        let base = Instant::now();
        let mut ticker = ticker_at(base);
        let t = base + Duration::from_millis(50);
        assert_eq!(ticker.advance(t).len(), 3);
        assert!(ticker.advance(t).is_empty());
        assert_eq!(ticker.advance(t + Duration::from_millis(17)).len(), 1);
    }

    #[test]
    fn tick_count_stays_monotonic_across_rebase() {
        let base = Instant::now();
        let mut ticker = ticker_at(base);
        let first = ticker.advance(base + Duration::from_secs(1));
        assert_eq!(first.len(), 60);
        // One second later the counter keeps climbing from 61.
        let second = ticker.advance(base + Duration::from_secs(2));
        assert!(!second.is_empty());
        assert_eq!(second[0].tick_count, 61);
    }

    #[test]
    fn rebase_resets_the_elapsed_window() {
        let base = Instant::now();
        let mut ticker = ticker_at(base);
        ticker.advance(base + Duration::from_secs(1));
        let events = ticker.advance(base + Duration::from_secs(1) + Duration::from_millis(17));
        assert_eq!(events.len(), 1);
        assert!(events[0].elapsed < Duration::from_millis(34));
    }

    #[test]
    fn stopped_ticker_emits_nothing() {
        let base = Instant::now();
        let mut ticker = ticker_at(base);
        ticker.stop();
        assert!(ticker.advance(base + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn roster_fires_slots_in_registration_order() {
        let mut roster: TickRoster<Vec<&'static str>> = TickRoster::new();
        roster.register("input-output", |_, log| log.push("input-output"));
        roster.register("gameboard", |_, log| log.push("gameboard"));
        roster.register("animator", |_, log| log.push("animator"));
        roster.register("player-pulse", |_, log| log.push("player-pulse"));

        let event = TickEvent {
            elapsed: Duration::ZERO,
            tick_delay: Duration::from_millis(16),
            tick_count: 1,
        };
        let mut log = Vec::new();
        roster.emit(&event, &mut log);
        assert_eq!(
            log,
            vec!["input-output", "gameboard", "animator", "player-pulse"]
        );
        assert_eq!(roster.slots().len(), 4);
    }
}
