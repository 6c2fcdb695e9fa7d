use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use log::{error, warn};

/// Monotonic counter a [`FrameClock`] reads from
pub trait TickSource {
    /// Ticks per second; zero when the counter is unusable
    fn frequency(&self) -> u64;

    /// Current counter value
    fn now(&self) -> u64;
}

/// Nanosecond counter backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct HighResCounter {
    origin: Instant,
}

impl HighResCounter {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for HighResCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for HighResCounter {
    fn frequency(&self) -> u64 {
        1_000_000_000
    }

    fn now(&self) -> u64 {
        // Offset by one so the first reading is never zero
        self.origin.elapsed().as_nanos() as u64 + 1
    }
}

/// Counter advanced by hand
///
/// Clones share the same reading, so a test can keep one handle and give the
/// other to the clock.
#[derive(Debug, Clone, Default)]
pub struct ManualCounter {
    frequency: u64,
    ticks: Rc<Cell<u64>>,
}

impl ManualCounter {
    pub fn new(frequency: u64) -> Self {
        Self {
            frequency,
            ticks: Rc::new(Cell::new(0)),
        }
    }

    pub fn advance(&self, ticks: u64) {
        self.ticks.set(self.ticks.get() + ticks);
    }

    pub fn set(&self, ticks: u64) {
        self.ticks.set(ticks);
    }
}

impl TickSource for ManualCounter {
    fn frequency(&self) -> u64 {
        self.frequency
    }

    fn now(&self) -> u64 {
        self.ticks.get()
    }
}

/// Frames-per-second counter
///
/// Call [`tick`](Self::tick) once per presented frame. Once a full second of
/// counter ticks has passed, the frames seen in that window become the current rate.
#[derive(Debug)]
pub struct FrameClock<S: TickSource = HighResCounter> {
    source: S,
    frequency: u64,
    frames: u32,
    rate: u32,
    reference: u64,
}

impl FrameClock<HighResCounter> {
    pub fn new() -> Self {
        Self::with_source(HighResCounter::new())
    }
}

impl Default for FrameClock<HighResCounter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TickSource> FrameClock<S> {
    pub fn with_source(source: S) -> Self {
        let frequency = source.frequency();
        if frequency == 0 {
            error!("High resolution counter not supported, frame rate will not update");
        }
        let reference = source.now();
        Self {
            source,
            frequency,
            frames: 0,
            rate: 0,
            reference,
        }
    }

    /// False when the tick source has no frequency
    pub fn is_supported(&self) -> bool {
        self.frequency != 0
    }

    /// Count one frame and roll the rate over once a second has passed
    pub fn tick(&mut self) {
        let now = self.source.now();
        if now == 0 {
            warn!("Counter returned zero");
        }

        self.frames += 1;
        if self.frequency == 0 {
            return;
        }

        if now.saturating_sub(self.reference) >= self.frequency {
            self.rate = self.frames;
            self.frames = 0;
            self.reference = now;
        }
    }

    /// Frames counted in the last full period
    pub fn current_rate(&self) -> u32 {
        self.rate
    }

    /// Frames counted so far in the current period
    pub fn frame_count(&self) -> u32 {
        self.frames
    }

    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Seconds between game updates, read from a [`TickSource`]
#[derive(Debug)]
pub struct DeltaClock<S: TickSource = HighResCounter> {
    source: S,
    last: u64,
}

impl DeltaClock {
    pub fn new() -> Self {
        Self::with_source(HighResCounter::new())
    }
}

impl Default for DeltaClock {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TickSource> DeltaClock<S> {
    pub fn with_source(source: S) -> Self {
        let last = source.now();
        Self { source, last }
    }

    /// Seconds since the previous tick or restart
    ///
    /// Zero when the counter is unusable or ran backwards.
    pub fn tick(&mut self) -> f32 {
        let now = self.source.now();
        let ticks = now.saturating_sub(self.last);
        self.last = now;
        match self.source.frequency() {
            0 => 0.0,
            frequency => (ticks as f64 / frequency as f64) as f32,
        }
    }

    /// Forget the time elapsed so far
    pub fn restart(&mut self) {
        self.last = self.source.now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn rate_updates_after_one_second() {
        let counter = ManualCounter::new(1000);
        counter.set(1);
        let mut clock = FrameClock::with_source(counter.clone());

        for _ in 0..59 {
            counter.advance(10);
            clock.tick();
        }
        assert_eq!(clock.current_rate(), 0);
        assert_eq!(clock.frame_count(), 59);

        counter.advance(410);
        clock.tick();
        assert_eq!(clock.current_rate(), 60);
        assert_eq!(clock.frame_count(), 0);
    }

    #[test]
    fn rate_holds_between_periods() {
        let counter = ManualCounter::new(100);
        counter.set(5);
        let mut clock = FrameClock::with_source(counter.clone());

        counter.advance(100);
        clock.tick();
        assert_eq!(clock.current_rate(), 1);

        counter.advance(50);
        clock.tick();
        clock.tick();
        assert_eq!(clock.current_rate(), 1);
        assert_eq!(clock.frame_count(), 2);
    }

    #[test]
    fn zero_frequency_never_updates() {
        let counter = ManualCounter::new(0);
        let mut clock = FrameClock::with_source(counter.clone());
        assert!(!clock.is_supported());
        for _ in 0..10 {
            counter.advance(1_000_000);
            clock.tick();
        }
        assert_eq!(clock.current_rate(), 0);
    }

    #[test]
    fn high_res_counter_is_nanoseconds() {
        let counter = HighResCounter::new();
        assert_eq!(counter.frequency(), 1_000_000_000);
        let a = counter.now();
        thread::sleep(Duration::from_millis(2));
        assert!(counter.now() > a);
    }

    #[test]
    fn delta_in_seconds() {
        let counter = ManualCounter::new(1000);
        let mut clock = DeltaClock::with_source(counter.clone());

        counter.advance(250);
        assert_eq!(clock.tick(), 0.25);
        counter.advance(10);
        assert!((clock.tick() - 0.01).abs() < 1e-6);
        assert_eq!(clock.tick(), 0.0);
    }

    #[test]
    fn restart_drops_elapsed_time() {
        let counter = ManualCounter::new(1000);
        let mut clock = DeltaClock::with_source(counter.clone());

        counter.advance(5000);
        clock.restart();
        counter.advance(20);
        assert!((clock.tick() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn backwards_or_unusable_counter_gives_zero() {
        let counter = ManualCounter::new(1000);
        counter.set(100);
        let mut clock = DeltaClock::with_source(counter.clone());
        counter.set(40);
        assert_eq!(clock.tick(), 0.0);

        let stopped = ManualCounter::new(0);
        let mut clock = DeltaClock::with_source(stopped.clone());
        stopped.advance(1_000);
        assert_eq!(clock.tick(), 0.0);
    }
}
