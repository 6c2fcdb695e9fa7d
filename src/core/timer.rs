/// Self-contained timers - manage internal state, no frame dependency
/// Each timer accumulates delta time and decides when to fire

/// Fixed-step accumulator - yields fixed timesteps for deterministic simulation
#[derive(Debug, Clone)]
pub struct Accumulator {
    timestep: f32,
    accumulator: f32,
    max_steps: u8,
}

impl Accumulator {
    /// Create accumulator with fixed timestep
    pub fn new(hz: f32, max_steps: u8) -> Self {
        Self {
            timestep: 1.0 / hz,
            accumulator: 0.0,
            max_steps,
        }
    }

    /// Update with delta, returns the number of fixed steps to run
    ///
    /// Time beyond `max_steps` is dropped so a long stall does not cause a burst.
    pub fn tick(&mut self, delta: f32) -> usize {
        self.accumulator += delta;

        let due = (self.accumulator / self.timestep) as usize;
        let steps = due.min(self.max_steps as usize);

        if due > steps {
            self.accumulator = 0.0;
        } else {
            self.accumulator -= steps as f32 * self.timestep;
        }
        steps
    }

    pub fn timestep(&self) -> f32 {
        self.timestep
    }
}

/// Countdown timer - fires once after duration
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    duration: f32,
    elapsed: f32,
    active: bool,
}

impl Countdown {
    /// Create inactive countdown
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
            active: false,
        }
    }

    /// Start (or restart) countdown
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.active = true;
    }

    /// Tick with delta, returns true if completed
    pub fn tick(&mut self, delta: f32) -> bool {
        if !self.active {
            return false;
        }

        self.elapsed += delta;

        if self.elapsed >= self.duration {
            self.active = false;
            true
        } else {
            false
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_yields_fixed_steps() {
        let mut acc = Accumulator::new(100.0, 4);

        // Small delta - no steps
        assert_eq!(acc.tick(0.004), 0);

        // Enough for 1 step
        assert_eq!(acc.tick(0.007), 1);

        // Large delta - capped, backlog dropped
        assert_eq!(acc.tick(0.5), 4);
        assert_eq!(acc.tick(0.0), 0);
    }

    #[test]
    fn countdown_fires_once() {
        let mut timer = Countdown::new(0.25);

        assert!(!timer.tick(0.5)); // Inactive

        timer.start();
        assert!(timer.is_active());
        assert!(!timer.tick(0.1));
        assert!(timer.tick(0.2));
        assert!(!timer.is_active());
        assert!(!timer.tick(0.1));
    }
}
